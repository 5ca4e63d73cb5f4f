//! Reddit implementation of [`CommentSource`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use storyloom_core::story_id::StoryId;
use tracing::debug;

use crate::error::CommentError;
use crate::source::{Comment, CommentSource};

const API_BASE: &str = "https://oauth.reddit.com";

/// Reddit OAuth client for a story post's comments.
#[derive(Debug, Clone)]
pub struct RedditCommentSource {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl RedditCommentSource {
    /// Creates a client authenticated with a bearer `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `CommentError::Network` if the HTTP client cannot be built.
    pub fn new(
        access_token: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Result<Self, CommentError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.into())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CommentError::Network(e.to_string()))?;
        Ok(Self {
            client,
            access_token: access_token.into(),
            base_url: API_BASE.to_owned(),
        })
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, CommentError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(CommentError::Api { status, message })
    }
}

#[async_trait]
impl CommentSource for RedditCommentSource {
    async fn list_top_comments(
        &self,
        story_id: &StoryId,
        limit: usize,
    ) -> Result<Vec<Comment>, CommentError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/comments/{}", self.base_url, story_id.as_str()))
            .bearer_auth(&self.access_token)
            .query(&[("sort", "top"), ("limit", limit.as_str()), ("depth", "1")])
            .send()
            .await
            .map_err(|e| CommentError::Network(e.to_string()))?;
        let body = Self::checked(response)
            .await?
            .text()
            .await
            .map_err(|e| CommentError::Network(e.to_string()))?;
        let comments = parse_comment_listing(&body)?;
        debug!(story_id = %story_id, count = comments.len(), "comments listed");
        Ok(comments)
    }

    async fn remove_comment(&self, comment_id: &str) -> Result<(), CommentError> {
        let fullname = format!("t1_{comment_id}");
        let response = self
            .client
            .post(format!("{}/api/remove", self.base_url))
            .bearer_auth(&self.access_token)
            .form(&[("id", fullname.as_str()), ("spam", "false")])
            .send()
            .await
            .map_err(|e| CommentError::Network(e.to_string()))?;
        Self::checked(response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    #[serde(default)]
    body: String,
    author: Option<String>,
    #[serde(default)]
    score: i64,
}

/// Extracts top-level comments from a `[post, comments]` listing pair.
///
/// `more` placeholders and other non-comment things are dropped.
fn parse_comment_listing(body: &str) -> Result<Vec<Comment>, CommentError> {
    let listings: Vec<Listing> =
        serde_json::from_str(body).map_err(|e| CommentError::Malformed(e.to_string()))?;
    let Some(comments) = listings.into_iter().nth(1) else {
        return Err(CommentError::Malformed("missing comment listing".into()));
    };
    comments
        .data
        .children
        .into_iter()
        .filter(|thing| thing.kind == "t1")
        .map(|thing| {
            let data: CommentData = serde_json::from_value(thing.data)
                .map_err(|e| CommentError::Malformed(e.to_string()))?;
            Ok(Comment {
                id: data.id,
                body: data.body,
                author: data.author.unwrap_or_else(|| "[deleted]".into()),
                score: data.score,
            })
        })
        .collect()
}
