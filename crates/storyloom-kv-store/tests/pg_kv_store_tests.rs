//! Integration tests for `PgKvStore`.
//!
//! These need a PostgreSQL server reachable through `DATABASE_URL`; run them
//! with `cargo test -- --ignored`.

use std::time::Duration;

use serde_json::json;
use sqlx::PgPool;
use storyloom_core::kv::{DEFAULT_TTL, KeyValueStore};
use storyloom_kv_store::pg_kv_store::PgKvStore;

// --- get / set ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_get_returns_none_for_missing_key(pool: PgPool) {
    let store = PgKvStore::new(pool);

    let value = store.get("story:absent").await.unwrap();

    assert!(value.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_set_then_get_round_trips_document(pool: PgPool) {
    let store = PgKvStore::new(pool);
    let doc = json!({ "storyTitle": "Tidewright", "chapters": { "1": { "content": "x" } } });

    store.set("story:abc", doc.clone(), DEFAULT_TTL).await.unwrap();

    assert_eq!(store.get("story:abc").await.unwrap(), Some(doc));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_set_replaces_whole_value(pool: PgPool) {
    let store = PgKvStore::new(pool);
    store
        .set("story_ids", json!(["a", "b"]), DEFAULT_TTL)
        .await
        .unwrap();

    store.set("story_ids", json!(["c"]), DEFAULT_TTL).await.unwrap();

    assert_eq!(store.get("story_ids").await.unwrap(), Some(json!(["c"])));
}

// --- expiry ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_expired_key_reads_as_absent_and_is_purged(pool: PgPool) {
    let store = PgKvStore::new(pool);
    store
        .set("active_stories", json!({}), Duration::ZERO)
        .await
        .unwrap();

    assert!(store.get("active_stories").await.unwrap().is_none());
    assert_eq!(store.purge_expired().await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_write_renews_expiry(pool: PgPool) {
    let store = PgKvStore::new(pool);
    store.set("story:abc", json!(1), Duration::ZERO).await.unwrap();

    store.set("story:abc", json!(2), DEFAULT_TTL).await.unwrap();

    assert_eq!(store.get("story:abc").await.unwrap(), Some(json!(2)));
    assert_eq!(store.purge_expired().await.unwrap(), 0);
}
