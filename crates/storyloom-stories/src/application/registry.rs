//! Story Registry — the self-healing summary map of advancing stories.
//!
//! The persisted map is always an output of [`StoryRegistry::rebuild`]. Between
//! rebuilds it is only touched through [`StoryRegistry::upsert`], and any drift
//! that leaves behind is corrected by the next cycle's rebuild.

use std::sync::Arc;
use std::time::Duration;

use storyloom_core::error::DomainError;
use storyloom_core::kv::{self, KeyValueStore};
use storyloom_core::story_id::StoryId;
use tracing::{debug, info, warn};

use super::story_store::StoryStore;
use crate::domain::registry::{ActiveStories, ActiveStoryEntry};

/// Key of the durable list of every story id ever initialized.
pub const STORY_IDS_KEY: &str = "story_ids";

/// Key of the persisted registry map.
pub const ACTIVE_STORIES_KEY: &str = "active_stories";

/// Maintains the story-id list and the derived registry map.
#[derive(Debug, Clone)]
pub struct StoryRegistry {
    kv: Arc<dyn KeyValueStore>,
    stories: StoryStore,
    ttl: Duration,
}

impl StoryRegistry {
    /// Creates a registry reading documents through `stories`.
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, stories: StoryStore, ttl: Duration) -> Self {
        Self { kv, stories, ttl }
    }

    /// The durable story-id list, in registration order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Corrupted` if the list is unreadable, or the
    /// store's error if loading fails.
    pub async fn story_ids(&self) -> Result<Vec<StoryId>, DomainError> {
        Ok(kv::get_json(self.kv.as_ref(), STORY_IDS_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Adds `id` to the story-id list. Returns `false` if it was already there.
    ///
    /// # Errors
    ///
    /// Returns the store's error if reading or writing the list fails.
    pub async fn register(&self, id: &StoryId) -> Result<bool, DomainError> {
        let mut ids = self.story_ids().await?;
        if ids.contains(id) {
            return Ok(false);
        }
        ids.push(id.clone());
        kv::set_json(self.kv.as_ref(), STORY_IDS_KEY, &ids, self.ttl).await?;
        Ok(true)
    }

    /// Rebuilds the registry from the given ids and their story documents.
    ///
    /// Ids whose document is missing, unreadable or cannot be loaded are left
    /// out. The result is persisted; a failed write is logged and the rebuilt
    /// map is still returned.
    pub async fn rebuild(&self, story_ids: &[StoryId]) -> ActiveStories {
        let mut rebuilt = ActiveStories::new();
        for id in story_ids {
            match self.stories.get(id).await {
                Ok(Some(story)) => rebuilt.insert(id.clone(), story.summary()),
                Ok(None) => {
                    warn!(story_id = %id, "story document missing, dropping from registry");
                }
                Err(e) if e.is_state_corruption() => {
                    warn!(
                        story_id = %id,
                        error = %e,
                        "story document unreadable, dropping from registry"
                    );
                }
                Err(e) => {
                    warn!(
                        story_id = %id,
                        error = %e,
                        "story document could not be loaded, dropping from registry"
                    );
                }
            }
        }

        if let Err(e) =
            kv::set_json(self.kv.as_ref(), ACTIVE_STORIES_KEY, &rebuilt, self.ttl).await
        {
            warn!(error = %e, "failed to persist rebuilt registry");
        }

        info!(
            known = story_ids.len(),
            registered = rebuilt.len(),
            advancing = rebuilt.advancing_count(),
            "registry rebuilt"
        );
        rebuilt
    }

    /// Replaces one summary in the persisted registry.
    ///
    /// # Errors
    ///
    /// Returns the store's error if reading or writing the registry fails.
    pub async fn upsert(&self, id: &StoryId, entry: ActiveStoryEntry) -> Result<(), DomainError> {
        let mut current = self.list().await?;
        current.insert(id.clone(), entry);
        kv::set_json(self.kv.as_ref(), ACTIVE_STORIES_KEY, &current, self.ttl).await?;
        debug!(story_id = %id, "registry entry upserted");
        Ok(())
    }

    /// The persisted registry. Absent reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Corrupted` if the map is unreadable, or the
    /// store's error if loading fails.
    pub async fn list(&self) -> Result<ActiveStories, DomainError> {
        Ok(kv::get_json(self.kv.as_ref(), ACTIVE_STORIES_KEY)
            .await?
            .unwrap_or_default())
    }
}
