//! Deferred-job scheduler abstraction.
//!
//! The host runs a named job at a given instant and hands its message back to
//! the engine. The engine never loops or sleeps itself: each step emits the
//! complete input of the next one through this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::message::TriggerMessage;

/// A job to run once at `run_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    /// Job name. The host keeps at most one pending job per name.
    pub name: String,
    /// When the job should fire.
    pub run_at: DateTime<Utc>,
    /// The message delivered back to the engine when the job fires.
    pub message: TriggerMessage,
}

/// Handle returned by the scheduler for a pending job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Host-assigned job identifier.
    pub job_id: String,
    /// Name the job was scheduled under.
    pub name: String,
}

/// Trait for scheduling and cancelling deferred jobs.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Schedule `job`, replacing any pending job with the same name.
    async fn schedule(&self, job: ScheduledJob) -> Result<JobHandle, DomainError>;

    /// Cancel the pending job with `name`, returning whether one existed.
    async fn cancel(&self, name: &str) -> Result<bool, DomainError>;
}

impl std::fmt::Debug for dyn Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Scheduler")
    }
}
