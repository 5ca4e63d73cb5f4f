//! Test schedulers — mock `Scheduler` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use storyloom_core::error::DomainError;
use storyloom_core::scheduler::{JobHandle, ScheduledJob, Scheduler};

/// A scheduler that records every job and keeps one pending job per name,
/// like the host does.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<ScheduledJob>>,
    pending: Mutex<Vec<ScheduledJob>>,
    cancelled: Mutex<Vec<String>>,
}

impl RecordingScheduler {
    /// Creates a scheduler with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every job ever scheduled, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn jobs(&self) -> Vec<ScheduledJob> {
        self.scheduled.lock().unwrap().clone()
    }

    /// Jobs still pending, at most one per name.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn pending(&self) -> Vec<ScheduledJob> {
        self.pending.lock().unwrap().clone()
    }

    /// Names passed to `cancel`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    async fn schedule(&self, job: ScheduledJob) -> Result<JobHandle, DomainError> {
        let mut scheduled = self.scheduled.lock().unwrap();
        let handle = JobHandle {
            job_id: format!("job-{}", scheduled.len() + 1),
            name: job.name.clone(),
        };
        scheduled.push(job.clone());
        let mut pending = self.pending.lock().unwrap();
        pending.retain(|p| p.name != job.name);
        pending.push(job);
        Ok(handle)
    }

    async fn cancel(&self, name: &str) -> Result<bool, DomainError> {
        self.cancelled.lock().unwrap().push(name.to_owned());
        let mut pending = self.pending.lock().unwrap();
        let before = pending.len();
        pending.retain(|p| p.name != name);
        Ok(pending.len() != before)
    }
}

/// A scheduler that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingScheduler;

#[async_trait]
impl Scheduler for FailingScheduler {
    async fn schedule(&self, _job: ScheduledJob) -> Result<JobHandle, DomainError> {
        Err(DomainError::Infrastructure("scheduler unavailable".into()))
    }

    async fn cancel(&self, _name: &str) -> Result<bool, DomainError> {
        Err(DomainError::Infrastructure("scheduler unavailable".into()))
    }
}
