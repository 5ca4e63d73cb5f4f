//! Per-step results returned for logs and tests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use storyloom_core::story_id::StoryId;
use uuid::Uuid;

use super::state::StateTrail;

/// Why a story was left untouched without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Every chapter is already unlocked.
    Complete,
    /// No story document exists.
    Missing,
    /// The story document cannot be read.
    Unreadable,
}

/// Which stage of advancing a story failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Loading the story document.
    Load,
    /// Generating the chapter.
    Generation,
    /// Writing the story document.
    Persist,
}

/// What happened to one story in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StoryOutcome {
    /// A chapter was unlocked and written.
    Advanced {
        /// The story.
        story_id: StoryId,
        /// Number of the unlocked chapter.
        chapter: u32,
        /// Whether an illustration was stored.
        illustrated: bool,
        /// Whether the registry entry was updated.
        registry_updated: bool,
        /// Comments removed after the unlock.
        comments_removed: usize,
        /// Comments whose removal failed.
        comments_failed: usize,
    },
    /// Nothing to do.
    Skipped {
        /// The story.
        story_id: StoryId,
        /// Why.
        reason: SkipReason,
    },
    /// The story was left unchanged this cycle.
    Failed {
        /// The story.
        story_id: StoryId,
        /// Stage that failed.
        stage: FailureStage,
        /// Error text.
        error: String,
    },
}

impl StoryOutcome {
    /// The story this outcome is for.
    #[must_use]
    pub fn story_id(&self) -> &StoryId {
        match self {
            Self::Advanced { story_id, .. }
            | Self::Skipped { story_id, .. }
            | Self::Failed { story_id, .. } => story_id,
        }
    }
}

/// The continuation a step handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledContinuation {
    /// Host job id.
    pub job_id: String,
    /// Batch the continuation will run.
    pub batch_number: u32,
    /// Ids the continuation carries.
    pub post_ids: Vec<StoryId>,
    /// When it fires.
    pub run_at: DateTime<Utc>,
}

/// Result of one daily cycle step or continuation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    /// Correlates every log line of the step.
    pub correlation_id: Uuid,
    /// `daily_unlock` or `unlock_batch`.
    pub trigger: &'static str,
    /// Batch processed, zero when none ran.
    pub batch_number: u32,
    /// Batches in the cycle.
    pub total_batches: u32,
    /// One entry per processed id, in processing order.
    pub outcomes: Vec<StoryOutcome>,
    /// The next batch, if one was scheduled.
    pub continuation: Option<ScheduledContinuation>,
    /// States the step passed through.
    pub states: StateTrail,
    /// Wall time spent advancing the batch, in milliseconds.
    pub elapsed_ms: i64,
}

impl StepReport {
    pub(crate) fn new(correlation_id: Uuid, trigger: &'static str) -> Self {
        Self {
            correlation_id,
            trigger,
            batch_number: 0,
            total_batches: 0,
            outcomes: Vec::new(),
            continuation: None,
            states: StateTrail::new(),
            elapsed_ms: 0,
        }
    }

    /// Ids processed in this step.
    #[must_use]
    pub fn processed(&self) -> Vec<&StoryId> {
        self.outcomes.iter().map(StoryOutcome::story_id).collect()
    }

    /// Ids that gained a chapter.
    #[must_use]
    pub fn advanced(&self) -> Vec<&StoryId> {
        self.filter_ids(|o| matches!(o, StoryOutcome::Advanced { .. }))
    }

    /// Ids skipped without error.
    #[must_use]
    pub fn skipped(&self) -> Vec<&StoryId> {
        self.filter_ids(|o| matches!(o, StoryOutcome::Skipped { .. }))
    }

    /// Ids that failed and stay unchanged.
    #[must_use]
    pub fn failed(&self) -> Vec<&StoryId> {
        self.filter_ids(|o| matches!(o, StoryOutcome::Failed { .. }))
    }

    fn filter_ids(&self, keep: impl Fn(&StoryOutcome) -> bool) -> Vec<&StoryId> {
        self.outcomes
            .iter()
            .filter(|o| keep(o))
            .map(StoryOutcome::story_id)
            .collect()
    }
}
