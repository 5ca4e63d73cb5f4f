//! Test stores — mock `KeyValueStore` implementations for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use storyloom_core::error::DomainError;
use storyloom_core::kv::KeyValueStore;

/// An in-memory store that records the TTL of every write. Individual keys
/// can be made to reject writes.
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    entries: Mutex<HashMap<String, (serde_json::Value, Duration)>>,
    failing_writes: Mutex<HashSet<String>>,
    writes: Mutex<Vec<String>>,
}

impl InMemoryKvStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `key` with raw JSON, bypassing any typing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert_raw(&self, key: &str, value: serde_json::Value) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), (value, Duration::ZERO));
    }

    /// Raw JSON stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone())
    }

    /// Whether `key` holds a value.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    /// TTL passed with the last write of `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    /// Makes every later write of `key` fail with an infrastructure error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_writes.lock().unwrap().insert(key.to_owned());
    }

    /// Keys of every successful write, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, DomainError> {
        Ok(self.get_raw(key))
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        if self.failing_writes.lock().unwrap().contains(key) {
            return Err(DomainError::Infrastructure(format!("write to {key} refused")));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), (value, ttl));
        self.writes.lock().unwrap().push(key.to_owned());
        Ok(())
    }
}

/// A store that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingKvStore;

#[async_trait]
impl KeyValueStore for FailingKvStore {
    async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn set(
        &self,
        _key: &str,
        _value: serde_json::Value,
        _ttl: Duration,
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
