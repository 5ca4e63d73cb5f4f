//! PostgreSQL-backed key-value store for the Storyloom chapter-unlock engine.

pub mod pg_kv_store;

/// Embedded schema migrations, applied at worker startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
