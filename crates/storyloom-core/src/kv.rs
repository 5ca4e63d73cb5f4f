//! Durable key-value store abstraction.
//!
//! Values are JSON documents. Every write renews the key's expiry; there are no
//! partial-field patches and no cross-key transactions.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DomainError;

/// Default renewable expiry applied to every key (60 days).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 24 * 60 * 60);

/// Store trait for loading and replacing whole JSON documents.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Load the value under `key`. Expired keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, DomainError>;

    /// Replace the value under `key` and renew its expiry to `ttl` from now.
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration)
    -> Result<(), DomainError>;
}

impl std::fmt::Debug for dyn KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn KeyValueStore")
    }
}

/// Loads and deserializes a typed document.
///
/// # Errors
///
/// Returns `DomainError::Corrupted` if the stored JSON does not match `T`, or
/// the store's own error if loading fails.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, DomainError> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| DomainError::Corrupted {
            key: key.to_owned(),
            reason: e.to_string(),
        })
}

/// Serializes and writes a typed document, renewing its expiry.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if serialization fails, or the
/// store's own error if writing fails.
pub async fn set_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), DomainError> {
    let value = serde_json::to_value(value)
        .map_err(|e| DomainError::Infrastructure(format!("serialization failed for {key}: {e}")))?;
    store.set(key, value, ttl).await
}
