//! Generation error types.

use thiserror::Error;

/// Why no chapter was produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status or an error body.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status, or 200 when the error arrived in a success body.
        status: u16,
        /// Error text from the service.
        message: String,
    },

    /// The response carried no usable text.
    #[error("empty response (finish reason: {})", finish_reason.as_deref().unwrap_or("UNKNOWN"))]
    Empty {
        /// Finish reason reported by the service, if any.
        finish_reason: Option<String>,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request itself was invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
