//! In-process implementation of the core `Scheduler`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storyloom_core::clock::Clock;
use storyloom_core::error::DomainError;
use storyloom_core::scheduler::{JobHandle, ScheduledJob, Scheduler};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;

struct PendingJob {
    job_id: String,
    task: JoinHandle<()>,
}

type PendingJobs = Arc<Mutex<HashMap<String, PendingJob>>>;

/// Timer-backed scheduler. At most one job is pending per name; when a job
/// fires its message is queued on the dispatch channel.
pub struct TokioScheduler {
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    pending: PendingJobs,
    next_id: AtomicU64,
}

impl std::fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("pending", &self.pending_names())
            .finish_non_exhaustive()
    }
}

impl TokioScheduler {
    /// Creates a scheduler that fires jobs into `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            dispatcher,
            clock,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Names of jobs waiting to fire.
    #[must_use]
    pub fn pending_names(&self) -> Vec<String> {
        self.pending
            .lock()
            .map(|pending| pending.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, PendingJob>>, DomainError> {
        self.pending
            .lock()
            .map_err(|_| DomainError::Infrastructure("scheduler state poisoned".into()))
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn schedule(&self, job: ScheduledJob) -> Result<JobHandle, DomainError> {
        let job_id = format!("job-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let delay = (job.run_at - self.clock.now()).to_std().unwrap_or_default();
        let ScheduledJob { name, run_at, message } = job;

        let dispatcher = self.dispatcher.clone();
        let pending = Arc::clone(&self.pending);
        let task_name = name.clone();
        let task_id = job_id.clone();
        let mut guard = self.lock()?;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut pending) = pending.lock() {
                if pending.get(&task_name).is_some_and(|p| p.job_id == task_id) {
                    pending.remove(&task_name);
                }
            }
            debug!(job = %task_name, job_id = %task_id, "job fired");
            if let Err(e) = dispatcher.enqueue(message).await {
                warn!(job = %task_name, error = %e, "fired job could not be queued");
            }
        });

        if let Some(replaced) = guard.insert(
            name.clone(),
            PendingJob {
                job_id: job_id.clone(),
                task,
            },
        ) {
            replaced.task.abort();
            info!(job = %name, replaced = %replaced.job_id, "pending job replaced");
        }
        drop(guard);

        info!(job = %name, job_id = %job_id, %run_at, "job scheduled");
        Ok(JobHandle { job_id, name })
    }

    async fn cancel(&self, name: &str) -> Result<bool, DomainError> {
        let removed = self.lock()?.remove(name);
        match removed {
            Some(job) => {
                job.task.abort();
                info!(job = %name, job_id = %job.job_id, "pending job cancelled");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};
    use storyloom_core::clock::SystemClock;
    use storyloom_core::message::{BatchContinuation, TriggerMessage};
    use storyloom_core::story_id::StoryId;

    use super::*;

    fn continuation(batch_number: u32) -> TriggerMessage {
        TriggerMessage::UnlockBatch(BatchContinuation {
            batch_number,
            total_batches: 3,
            post_ids: vec![StoryId::parse("abc").unwrap()],
            remaining_batches: vec![],
        })
    }

    fn job(name: &str, after: TimeDelta, message: TriggerMessage) -> ScheduledJob {
        ScheduledJob {
            name: name.into(),
            run_at: Utc::now() + after,
            message,
        }
    }

    #[tokio::test]
    async fn test_due_job_is_queued_on_the_dispatch_channel() {
        // Arrange
        let (dispatcher, mut rx) = Dispatcher::channel(8);
        let scheduler = TokioScheduler::new(dispatcher, Arc::new(SystemClock));

        // Act
        scheduler
            .schedule(job("unlock_batch", TimeDelta::zero(), continuation(2)))
            .await
            .unwrap();
        let fired = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(fired.message(), &continuation(2));
        assert!(scheduler.pending_names().is_empty());
    }

    #[tokio::test]
    async fn test_rescheduling_a_name_replaces_the_pending_job() {
        let (dispatcher, _rx) = Dispatcher::channel(8);
        let scheduler = TokioScheduler::new(dispatcher, Arc::new(SystemClock));

        let first = scheduler
            .schedule(job("unlock_batch", TimeDelta::hours(1), continuation(2)))
            .await
            .unwrap();
        let second = scheduler
            .schedule(job("unlock_batch", TimeDelta::hours(1), continuation(3)))
            .await
            .unwrap();

        assert_ne!(first.job_id, second.job_id);
        assert_eq!(scheduler.pending_names(), ["unlock_batch"]);
    }

    #[tokio::test]
    async fn test_cancel_removes_pending_job() {
        let (dispatcher, _rx) = Dispatcher::channel(8);
        let scheduler = TokioScheduler::new(dispatcher, Arc::new(SystemClock));
        scheduler
            .schedule(job("unlock_batch", TimeDelta::hours(1), continuation(2)))
            .await
            .unwrap();

        assert!(scheduler.cancel("unlock_batch").await.unwrap());
        assert!(!scheduler.cancel("unlock_batch").await.unwrap());
        assert!(scheduler.pending_names().is_empty());
    }
}
