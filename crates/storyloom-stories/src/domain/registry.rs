//! Registry summaries of advancing stories.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyloom_core::story_id::StoryId;

/// Denormalized summary of one story. Always reconstructible from the story
/// document and never treated as authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStoryEntry {
    /// Story title.
    pub title: String,
    /// Latest unlocked chapter.
    pub current_chapter: u32,
    /// Chapters the story will have once complete.
    pub total_chapters: u32,
    /// When the story last changed.
    pub last_updated: DateTime<Utc>,
}

impl ActiveStoryEntry {
    /// Whether the summarized story has unlocked every chapter.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_chapter >= self.total_chapters
    }
}

/// The registry map. Iterates in ascending story-id order, which is the order
/// stories are batched and processed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveStories(BTreeMap<StoryId, ActiveStoryEntry>);

impl ActiveStories {
    /// Creates an empty registry map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the summary for `id`.
    pub fn insert(&mut self, id: StoryId, entry: ActiveStoryEntry) {
        self.0.insert(id, entry);
    }

    /// Looks up the summary for `id`.
    #[must_use]
    pub fn get(&self, id: &StoryId) -> Option<&ActiveStoryEntry> {
        self.0.get(id)
    }

    /// Number of stories in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Story ids in registry iteration order.
    #[must_use]
    pub fn ids(&self) -> Vec<StoryId> {
        self.0.keys().cloned().collect()
    }

    /// Iterates `(id, summary)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&StoryId, &ActiveStoryEntry)> {
        self.0.iter()
    }

    /// Number of stories that still have chapters to unlock.
    #[must_use]
    pub fn advancing_count(&self) -> usize {
        self.0.values().filter(|entry| !entry.is_complete()).count()
    }
}

impl FromIterator<(StoryId, ActiveStoryEntry)> for ActiveStories {
    fn from_iter<I: IntoIterator<Item = (StoryId, ActiveStoryEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
