//! Domain error types.

use thiserror::Error;

/// Top-level domain error type shared by every bounded context.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A document was not found under the given key.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored document exists but cannot be parsed or violates its invariants.
    #[error("corrupted document {key}: {reason}")]
    Corrupted {
        /// The key of the unreadable document.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A validation error in domain logic or inbound input.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure error (store, scheduler, external collaborator).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Whether this error means "the document should be treated as absent".
    #[must_use]
    pub fn is_state_corruption(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Corrupted { .. })
    }
}
