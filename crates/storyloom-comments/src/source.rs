//! The comment collaborator seam.

use async_trait::async_trait;
use storyloom_core::story_id::StoryId;

use crate::error::CommentError;

/// A top-level comment on a story's post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment id without the `t1_` prefix.
    pub id: String,
    /// Comment text.
    pub body: String,
    /// Author name, `[deleted]` when unknown.
    pub author: String,
    /// Net vote score.
    pub score: i64,
}

/// Lists and removes comments on a story's post.
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Up to `limit` top-level comments on the story, best first.
    async fn list_top_comments(
        &self,
        story_id: &StoryId,
        limit: usize,
    ) -> Result<Vec<Comment>, CommentError>;

    /// Removes one comment by id.
    async fn remove_comment(&self, comment_id: &str) -> Result<(), CommentError>;
}

impl std::fmt::Debug for dyn CommentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn CommentSource")
    }
}
