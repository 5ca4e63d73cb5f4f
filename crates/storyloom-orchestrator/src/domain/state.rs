//! The cycle's state machine.

use serde::Serialize;

/// Where a cycle or continuation step currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CycleState {
    /// Nothing running.
    Idle,
    /// A daily trigger arrived.
    CycleTriggered,
    /// The registry was rebuilt from the story-id list.
    RegistryRebuilt,
    /// The registry was split into batches.
    BatchesPlanned,
    /// Stories of one batch are being advanced.
    BatchRunning {
        /// 1-based batch number.
        batch_number: u32,
        /// Batches in the cycle.
        total_batches: u32,
    },
    /// The following batch was handed to the scheduler.
    BatchScheduled {
        /// Number of the scheduled batch.
        batch_number: u32,
    },
    /// The final batch ran, or there was nothing to run.
    CycleComplete,
    /// The chain stopped before its final batch.
    CycleHalted,
}

impl CycleState {
    /// Whether moving from `self` to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use CycleState::{
            BatchRunning, BatchScheduled, BatchesPlanned, CycleComplete, CycleHalted,
            CycleTriggered, Idle, RegistryRebuilt,
        };
        match (self, next) {
            (Idle, CycleTriggered | BatchRunning { .. })
            | (CycleTriggered, RegistryRebuilt | CycleHalted)
            | (RegistryRebuilt, BatchesPlanned)
            | (BatchesPlanned, CycleComplete)
            | (BatchRunning { .. }, CycleComplete | CycleHalted) => true,
            (BatchesPlanned, BatchRunning { batch_number, .. }) => batch_number == 1,
            (
                BatchRunning {
                    batch_number: running,
                    total_batches,
                },
                BatchScheduled { batch_number },
            ) => batch_number == running + 1 && batch_number <= total_batches,
            _ => false,
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::BatchScheduled { .. } | Self::CycleComplete | Self::CycleHalted
        )
    }
}

/// Ordered record of the states a step passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateTrail(Vec<CycleState>);

impl StateTrail {
    /// Starts a trail at [`CycleState::Idle`].
    #[must_use]
    pub fn new() -> Self {
        Self(vec![CycleState::Idle])
    }

    /// The latest state.
    #[must_use]
    pub fn current(&self) -> CycleState {
        self.0.last().copied().unwrap_or(CycleState::Idle)
    }

    /// Moves to `next`. Disallowed transitions are logged and recorded anyway.
    pub fn enter(&mut self, next: CycleState) {
        let current = self.current();
        if current.can_transition_to(next) {
            tracing::debug!(from = ?current, to = ?next, "cycle state transition");
        } else {
            tracing::warn!(from = ?current, to = ?next, "unexpected cycle state transition");
        }
        self.0.push(next);
    }

    /// Every state entered, oldest first.
    #[must_use]
    pub fn states(&self) -> &[CycleState] {
        &self.0
    }
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}
