//! Query handlers for the Stories context.
//!
//! Read-only views for operators and the reader-facing presentation layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use storyloom_core::error::DomainError;
use storyloom_core::story_id::StoryId;

use super::registry::StoryRegistry;
use super::story_store::StoryStore;
use crate::domain::registry::ActiveStories;

/// Read-only view of one unlocked chapter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterView {
    /// Chapter number.
    pub number: u32,
    /// Chapter text.
    pub content: String,
    /// Illustration `data:` URI, empty when absent.
    pub image: String,
    /// Audience comment that steered the chapter.
    pub top_comment: String,
    /// Unlock time.
    pub unlocked_at: DateTime<Utc>,
}

/// Read-only view of a story document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    /// Normalized story id.
    pub story_id: StoryId,
    /// Story title.
    pub title: String,
    /// Latest unlocked chapter.
    pub current_chapter: u32,
    /// Chapters the story will have once complete.
    pub total_chapters: u32,
    /// Whether every chapter is unlocked.
    pub complete: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Unlocked chapters in order.
    pub chapters: Vec<ChapterView>,
}

/// Retrieves a story by id.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no document exists for the id, and
/// `DomainError::Corrupted` if it cannot be read.
pub async fn get_story(id: &StoryId, stories: &StoryStore) -> Result<StoryView, DomainError> {
    let story = stories.require(id).await?;
    Ok(StoryView {
        story_id: id.clone(),
        title: story.title().to_owned(),
        current_chapter: story.current_chapter(),
        total_chapters: story.total_chapters(),
        complete: story.is_complete(),
        created_at: story.created_at(),
        chapters: story
            .chapters()
            .iter()
            .map(|(number, chapter)| ChapterView {
                number: *number,
                content: chapter.content.clone(),
                image: chapter.image.clone(),
                top_comment: chapter.top_comment.clone(),
                unlocked_at: chapter.unlocked_at,
            })
            .collect(),
    })
}

/// Returns the persisted registry map.
///
/// # Errors
///
/// Returns the registry's error if it cannot be loaded.
pub async fn list_active(registry: &StoryRegistry) -> Result<ActiveStories, DomainError> {
    registry.list().await
}
