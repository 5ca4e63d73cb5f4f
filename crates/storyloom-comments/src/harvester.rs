//! Audience steering input and post-unlock cleanup.

use std::sync::Arc;

use serde::Serialize;
use storyloom_core::story_id::StoryId;
use tracing::{debug, info, warn};

use crate::source::{Comment, CommentSource};

/// Comments considered when choosing the audience hint.
pub const TOP_COMMENT_LIMIT: usize = 5;

/// Most comments removed in one cleanup.
pub const DELETE_LIMIT: usize = 100;

/// Outcome of a best-effort cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// Ids removed.
    pub removed: Vec<String>,
    /// Ids whose removal failed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl DeletionReport {
    /// Whether every listed comment was removed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Wraps a [`CommentSource`] with the harvesting rules.
#[derive(Debug, Clone)]
pub struct CommentHarvester {
    source: Arc<dyn CommentSource>,
}

impl CommentHarvester {
    /// Creates a harvester over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn CommentSource>) -> Self {
        Self { source }
    }

    /// Body of the highest-scoring non-blank comment, or `""`.
    ///
    /// Listing failures are logged and yield `""`.
    pub async fn top_comment(&self, story_id: &StoryId) -> String {
        match self.source.list_top_comments(story_id, TOP_COMMENT_LIMIT).await {
            Ok(comments) => best_body(comments),
            Err(e) => {
                warn!(
                    story_id = %story_id,
                    error = %e,
                    "failed to list comments, continuing without audience hint"
                );
                String::new()
            }
        }
    }

    /// Removes up to [`DELETE_LIMIT`] comments, each independently.
    pub async fn delete_all_comments(&self, story_id: &StoryId) -> DeletionReport {
        let mut report = DeletionReport::default();
        let comments = match self.source.list_top_comments(story_id, DELETE_LIMIT).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(story_id = %story_id, error = %e, "failed to list comments for cleanup");
                return report;
            }
        };

        for comment in comments {
            match self.source.remove_comment(&comment.id).await {
                Ok(()) => {
                    debug!(story_id = %story_id, comment_id = %comment.id, "comment removed");
                    report.removed.push(comment.id);
                }
                Err(e) => {
                    warn!(
                        story_id = %story_id,
                        comment_id = %comment.id,
                        error = %e,
                        "failed to remove comment"
                    );
                    report.failed.push((comment.id, e.to_string()));
                }
            }
        }

        info!(
            story_id = %story_id,
            removed = report.removed.len(),
            failed = report.failed.len(),
            "comment cleanup finished"
        );
        report
    }
}

fn best_body(mut comments: Vec<Comment>) -> String {
    comments.retain(|c| !c.body.trim().is_empty());
    // Stable sort: equal scores keep the collaborator's order.
    comments.sort_by(|a, b| b.score.cmp(&a.score));
    comments
        .into_iter()
        .next()
        .map(|c| c.body)
        .unwrap_or_default()
}
