//! Inbound trigger messages.
//!
//! The host hands the engine untyped JSON. It is decoded into the closed
//! [`TriggerMessage`] union and validated before any work starts; unknown
//! `type` tags fail decoding.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::story_id::StoryId;

/// Payload of a deferred batch continuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BatchContinuation {
    /// 1-based number of the batch to process.
    pub batch_number: u32,
    /// Total number of batches in this cycle.
    pub total_batches: u32,
    /// Story ids belonging to this batch, in processing order.
    pub post_ids: Vec<StoryId>,
    /// Batches after this one, fixed when the cycle was planned.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remaining_batches: Vec<Vec<StoryId>>,
}

impl BatchContinuation {
    /// Checks the payload's numbering and contents.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the batch number is zero or above
    /// the total, if the id list is empty, or if the remaining batches overrun
    /// the total or contain an empty batch.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.batch_number == 0 {
            return Err(DomainError::Validation("batchNumber must be at least 1".into()));
        }
        if self.batch_number > self.total_batches {
            return Err(DomainError::Validation(format!(
                "batchNumber {} exceeds totalBatches {}",
                self.batch_number, self.total_batches
            )));
        }
        if self.post_ids.is_empty() {
            return Err(DomainError::Validation("postIds must not be empty".into()));
        }
        let remaining = u32::try_from(self.remaining_batches.len()).unwrap_or(u32::MAX);
        if self.batch_number.saturating_add(remaining) > self.total_batches {
            return Err(DomainError::Validation(format!(
                "{remaining} remaining batches after batch {} exceed totalBatches {}",
                self.batch_number, self.total_batches
            )));
        }
        if self.remaining_batches.iter().any(Vec::is_empty) {
            return Err(DomainError::Validation(
                "remainingBatches must not contain empty batches".into(),
            ));
        }
        Ok(())
    }
}

/// Every message the engine accepts from its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerMessage {
    /// The parameterless daily wall-clock trigger.
    DailyUnlock,
    /// A deferred continuation carrying the next batch.
    UnlockBatch(BatchContinuation),
}

impl TriggerMessage {
    /// Decodes and validates a raw host message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for unknown tags, malformed fields or
    /// an invalid continuation payload.
    pub fn from_json(value: serde_json::Value) -> Result<Self, DomainError> {
        let message: Self = serde_json::from_value(value)
            .map_err(|e| DomainError::Validation(format!("unrecognized trigger message: {e}")))?;
        message.validate()?;
        Ok(message)
    }

    /// Validates the payload of an already-decoded message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a continuation payload is invalid.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::DailyUnlock => Ok(()),
            Self::UnlockBatch(continuation) => continuation.validate(),
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DailyUnlock => "daily_unlock",
            Self::UnlockBatch(_) => "unlock_batch",
        }
    }
}
