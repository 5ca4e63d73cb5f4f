//! The story document and its chapters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyloom_core::error::DomainError;

use super::registry::ActiveStoryEntry;

/// One unlocked chapter. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Generated chapter text.
    pub content: String,
    /// Illustration as a `data:` URI, empty when illustration failed.
    #[serde(default)]
    pub image: String,
    /// The audience comment that steered this chapter, empty for chapter 1.
    #[serde(default)]
    pub top_comment: String,
    /// When the chapter was unlocked.
    pub unlocked_at: DateTime<Utc>,
}

/// A multi-chapter story advancing one chapter per cycle.
///
/// The chapter key set is always exactly `1..=current_chapter`. Documents read
/// from storage are checked against that on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoryDocument")]
pub struct Story {
    #[serde(rename = "storyTitle")]
    title: String,
    total_chapters: u32,
    current_chapter: u32,
    created_at: DateTime<Utc>,
    chapters: BTreeMap<u32, Chapter>,
}

/// Unchecked wire shape of a story.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryDocument {
    story_title: String,
    total_chapters: u32,
    current_chapter: u32,
    created_at: DateTime<Utc>,
    chapters: BTreeMap<u32, Chapter>,
}

impl TryFrom<StoryDocument> for Story {
    type Error = DomainError;

    fn try_from(doc: StoryDocument) -> Result<Self, Self::Error> {
        let story = Self {
            title: doc.story_title,
            total_chapters: doc.total_chapters,
            current_chapter: doc.current_chapter,
            created_at: doc.created_at,
            chapters: doc.chapters,
        };
        story.check_invariants()?;
        Ok(story)
    }
}

impl Story {
    /// Creates a story whose first chapter is already unlocked.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title is blank or
    /// `total_chapters` is zero.
    pub fn new(
        title: impl Into<String>,
        total_chapters: u32,
        first_chapter: Chapter,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::Validation("story title must not be blank".into()));
        }
        if total_chapters == 0 {
            return Err(DomainError::Validation("totalChapters must be at least 1".into()));
        }
        Ok(Self {
            title,
            total_chapters,
            current_chapter: 1,
            created_at,
            chapters: BTreeMap::from([(1, first_chapter)]),
        })
    }

    /// Story title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of chapters the story will have once complete.
    #[must_use]
    pub fn total_chapters(&self) -> u32 {
        self.total_chapters
    }

    /// Latest unlocked chapter number.
    #[must_use]
    pub fn current_chapter(&self) -> u32 {
        self.current_chapter
    }

    /// When the story was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Unlocked chapters keyed by number, in numeric order.
    #[must_use]
    pub fn chapters(&self) -> &BTreeMap<u32, Chapter> {
        &self.chapters
    }

    /// Whether every chapter has been unlocked.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_chapter >= self.total_chapters
    }

    /// The number the next unlocked chapter will carry.
    #[must_use]
    pub fn next_chapter_number(&self) -> u32 {
        self.current_chapter + 1
    }

    /// The story so far: chapters `1..=current_chapter` joined in order.
    #[must_use]
    pub fn narrative_context(&self) -> String {
        self.chapters
            .values()
            .map(|chapter| chapter.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Appends the next chapter and advances `current_chapter`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the story is already complete.
    pub fn unlock_chapter(&mut self, chapter: Chapter) -> Result<u32, DomainError> {
        if self.is_complete() {
            return Err(DomainError::Validation(format!(
                "story already has all {} chapters",
                self.total_chapters
            )));
        }
        let number = self.next_chapter_number();
        self.chapters.insert(number, chapter);
        self.current_chapter = number;
        Ok(number)
    }

    /// When the story last changed: the latest unlock, or creation.
    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.chapters
            .values()
            .map(|chapter| chapter.unlocked_at)
            .max()
            .map_or(self.created_at, |latest| latest.max(self.created_at))
    }

    /// Registry summary derived from this document.
    #[must_use]
    pub fn summary(&self) -> ActiveStoryEntry {
        ActiveStoryEntry {
            title: self.title.clone(),
            current_chapter: self.current_chapter,
            total_chapters: self.total_chapters,
            last_updated: self.last_updated(),
        }
    }

    fn check_invariants(&self) -> Result<(), DomainError> {
        if self.total_chapters == 0 {
            return Err(DomainError::Validation("totalChapters is zero".into()));
        }
        if self.current_chapter == 0 || self.current_chapter > self.total_chapters {
            return Err(DomainError::Validation(format!(
                "currentChapter {} outside 1..={}",
                self.current_chapter, self.total_chapters
            )));
        }
        let expected = 1..=self.current_chapter;
        if !self.chapters.keys().copied().eq(expected) {
            return Err(DomainError::Validation(format!(
                "chapter keys {:?} do not match 1..={}",
                self.chapters.keys().collect::<Vec<_>>(),
                self.current_chapter
            )));
        }
        Ok(())
    }
}
