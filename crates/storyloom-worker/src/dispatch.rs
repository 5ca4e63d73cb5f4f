//! Sequential dispatch of trigger messages and the optional daily ticker.
//!
//! Every step, whether it comes from HTTP, a fired continuation or the daily
//! ticker, goes through one channel consumed by one loop. Steps never overlap
//! inside a worker process.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use storyloom_core::clock::Clock;
use storyloom_core::error::DomainError;
use storyloom_core::message::TriggerMessage;
use storyloom_orchestrator::application::orchestrator::Orchestrator;
use storyloom_orchestrator::domain::report::StepReport;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// Queued messages before senders wait.
pub const DISPATCH_CAPACITY: usize = 64;

type Reply = oneshot::Sender<Result<StepReport, DomainError>>;

/// One queued step.
#[derive(Debug)]
pub struct Dispatch {
    message: TriggerMessage,
    reply: Option<Reply>,
}

impl Dispatch {
    /// The queued message.
    #[must_use]
    pub fn message(&self) -> &TriggerMessage {
        &self.message
    }
}

/// Sending half of the dispatch channel.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Dispatch>,
}

impl Dispatcher {
    /// Creates a dispatcher and the receiver its loop consumes.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Dispatch>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queues `message` without waiting for its result.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the dispatch loop has stopped.
    pub async fn enqueue(&self, message: TriggerMessage) -> Result<(), DomainError> {
        self.tx
            .send(Dispatch {
                message,
                reply: None,
            })
            .await
            .map_err(|_| DomainError::Infrastructure("dispatch loop stopped".into()))
    }

    /// Queues `message` and waits for the step's report.
    ///
    /// # Errors
    ///
    /// Returns the step's own error, or `DomainError::Infrastructure` if the
    /// dispatch loop has stopped.
    pub async fn run(&self, message: TriggerMessage) -> Result<StepReport, DomainError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Dispatch {
                message,
                reply: Some(reply),
            })
            .await
            .map_err(|_| DomainError::Infrastructure("dispatch loop stopped".into()))?;
        response
            .await
            .map_err(|_| DomainError::Infrastructure("dispatch loop dropped the step".into()))?
    }
}

/// Runs queued steps one at a time until every sender is dropped.
pub async fn run_dispatch_loop(orchestrator: Arc<Orchestrator>, mut rx: mpsc::Receiver<Dispatch>) {
    info!("dispatch loop started");
    while let Some(Dispatch { message, reply }) = rx.recv().await {
        let kind = message.kind();
        let result = orchestrator.handle(message).await;
        match &result {
            Ok(report) => info!(
                trigger = kind,
                correlation_id = %report.correlation_id,
                batch_number = report.batch_number,
                total_batches = report.total_batches,
                advanced = report.advanced().len(),
                failed = report.failed().len(),
                "step finished"
            ),
            Err(e) => warn!(trigger = kind, error = %e, "step rejected"),
        }
        if let Some(reply) = reply {
            // The caller may have gone away; the step has already run.
            let _ = reply.send(result);
        }
    }
    info!("dispatch loop stopped");
}

/// The first instant at `at` (UTC) strictly after `now`.
#[must_use]
pub fn next_daily_run(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + TimeDelta::days(1)
    }
}

/// Enqueues `daily_unlock` every day at `at` (UTC).
pub async fn run_daily_ticker(dispatcher: Dispatcher, clock: Arc<dyn Clock>, at: NaiveTime) {
    loop {
        let now = clock.now();
        let next = next_daily_run(now, at);
        info!(next_run = %next, "daily unlock scheduled");
        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        if let Err(e) = dispatcher.enqueue(TriggerMessage::DailyUnlock).await {
            error!(error = %e, "daily ticker stopping");
            return;
        }
    }
}
