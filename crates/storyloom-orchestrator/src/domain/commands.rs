//! Command types for the Orchestrator.

use uuid::Uuid;

/// Command to create a story with its first chapter and start advancing it.
#[derive(Debug, Clone)]
pub struct InitializeStory {
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Post id the story lives under; normalized before use.
    pub post_id: String,
    /// Story title.
    pub title: String,
    /// Chapters the story will have once complete.
    pub total_chapters: u32,
    /// Premise the first chapter is written from.
    pub seed_prompt: String,
}
