//! Story Store — whole-document persistence of stories.

use std::sync::Arc;
use std::time::Duration;

use storyloom_core::error::DomainError;
use storyloom_core::kv::{self, KeyValueStore};
use storyloom_core::story_id::StoryId;

use crate::domain::story::Story;

/// Loads and replaces story documents keyed by normalized id.
#[derive(Debug, Clone)]
pub struct StoryStore {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl StoryStore {
    /// Creates a store whose writes renew expiry to `ttl`.
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Loads the story document for `id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Corrupted` if the document cannot be parsed or
    /// breaks the chapter invariant, or the store's error if loading fails.
    pub async fn get(&self, id: &StoryId) -> Result<Option<Story>, DomainError> {
        kv::get_json(self.kv.as_ref(), &id.document_key()).await
    }

    /// Loads the story for `id`, treating absence as an error.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no document exists, plus every error
    /// of [`StoryStore::get`].
    pub async fn require(&self, id: &StoryId) -> Result<Story, DomainError> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.document_key()))
    }

    /// Replaces the whole document for `id` and renews its expiry.
    ///
    /// # Errors
    ///
    /// Returns the store's error if writing fails.
    pub async fn set(&self, id: &StoryId, story: &Story) -> Result<(), DomainError> {
        kv::set_json(self.kv.as_ref(), &id.document_key(), story, self.ttl).await
    }
}
