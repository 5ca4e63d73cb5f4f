//! Router-test wiring over in-memory doubles.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use storyloom_orchestrator::application::orchestrator::{Orchestrator, OrchestratorConfig};
use storyloom_test_support::{
    FixedClock, InMemoryCommentSource, InMemoryKvStore, RecordingScheduler, ScriptedGenerator,
};

use crate::dispatch::{DISPATCH_CAPACITY, Dispatcher, run_dispatch_loop};
use crate::state::AppState;

pub(crate) struct TestWorld {
    pub kv: Arc<InMemoryKvStore>,
    pub scheduler: Arc<RecordingScheduler>,
    pub state: AppState,
}

/// State with a running dispatch loop. Must be called inside a Tokio runtime.
pub(crate) fn test_world(generator: ScriptedGenerator) -> TestWorld {
    let kv = Arc::new(InMemoryKvStore::new());
    let scheduler = Arc::new(RecordingScheduler::new());
    let orchestrator = Arc::new(Orchestrator::new(
        kv.clone(),
        Arc::new(generator),
        Arc::new(InMemoryCommentSource::new()),
        scheduler.clone(),
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())),
        OrchestratorConfig::default(),
    ));
    let (dispatcher, rx) = Dispatcher::channel(DISPATCH_CAPACITY);
    tokio::spawn(run_dispatch_loop(orchestrator.clone(), rx));
    TestWorld {
        kv,
        scheduler,
        state: AppState::new(orchestrator, dispatcher),
    }
}
