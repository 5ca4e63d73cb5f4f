//! Test comment source — in-memory `CommentSource` for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use storyloom_comments::error::CommentError;
use storyloom_comments::source::{Comment, CommentSource};
use storyloom_core::story_id::StoryId;

/// Comments held per story. Removal deletes the comment; chosen ids fail.
#[derive(Debug, Default)]
pub struct InMemoryCommentSource {
    comments: Mutex<HashMap<StoryId, Vec<Comment>>>,
    failing_removals: Mutex<HashSet<String>>,
    failing_listings: Mutex<HashSet<StoryId>>,
    removed: Mutex<Vec<String>>,
}

impl InMemoryCommentSource {
    /// Creates a source with no comments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a comment to `story_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add(&self, story_id: &StoryId, id: &str, body: &str, score: i64) {
        self.comments
            .lock()
            .unwrap()
            .entry(story_id.clone())
            .or_default()
            .push(Comment {
                id: id.to_owned(),
                body: body.to_owned(),
                author: "reader".to_owned(),
                score,
            });
    }

    /// Makes removal of `comment_id` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_removal_of(&self, comment_id: &str) {
        self.failing_removals
            .lock()
            .unwrap()
            .insert(comment_id.to_owned());
    }

    /// Makes listing comments of `story_id` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_listing_of(&self, story_id: &StoryId) {
        self.failing_listings.lock().unwrap().insert(story_id.clone());
    }

    /// Comments still present on `story_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn remaining(&self, story_id: &StoryId) -> Vec<Comment> {
        self.comments
            .lock()
            .unwrap()
            .get(story_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Ids removed so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentSource for InMemoryCommentSource {
    async fn list_top_comments(
        &self,
        story_id: &StoryId,
        limit: usize,
    ) -> Result<Vec<Comment>, CommentError> {
        if self.failing_listings.lock().unwrap().contains(story_id) {
            return Err(CommentError::Network("connection reset".into()));
        }
        let mut comments = self.remaining(story_id);
        comments.sort_by(|a, b| b.score.cmp(&a.score));
        comments.truncate(limit);
        Ok(comments)
    }

    async fn remove_comment(&self, comment_id: &str) -> Result<(), CommentError> {
        if self.failing_removals.lock().unwrap().contains(comment_id) {
            return Err(CommentError::Api {
                status: 403,
                message: "forbidden".into(),
            });
        }
        for comments in self.comments.lock().unwrap().values_mut() {
            comments.retain(|c| c.id != comment_id);
        }
        self.removed.lock().unwrap().push(comment_id.to_owned());
        Ok(())
    }
}
