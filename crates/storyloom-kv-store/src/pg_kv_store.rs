//! `PostgreSQL` implementation of the `KeyValueStore` trait.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use storyloom_core::error::DomainError;
use storyloom_core::kv::KeyValueStore;

/// PostgreSQL-backed key-value store over the `kv_entries` table.
///
/// Expired rows read as absent until [`PgKvStore::purge_expired`] removes
/// them.
#[derive(Debug, Clone)]
pub struct PgKvStore {
    pool: PgPool,
}

impl PgKvStore {
    /// Creates a new `PgKvStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes every expired row, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        debug!(purged = result.rows_affected(), "expired kv entries purged");
        Ok(result.rows_affected())
    }
}

fn infrastructure(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

#[async_trait]
impl KeyValueStore for PgKvStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, DomainError> {
        sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM kv_entries WHERE key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO kv_entries (key, value, expires_at, updated_at)
            VALUES ($1, $2, NOW() + $3::DOUBLE PRECISION * INTERVAL '1 second', NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }
}
