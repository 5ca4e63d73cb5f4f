//! Comment collaborator errors.

use thiserror::Error;

/// Failure talking to the comment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The collaborator answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Response text.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}
