//! Shared application state.

use std::sync::Arc;

use storyloom_orchestrator::application::orchestrator::Orchestrator;

use crate::dispatch::Dispatcher;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The engine; read views and initialization go through it directly.
    pub orchestrator: Arc<Orchestrator>,
    /// Queue into the single dispatch loop that runs cycle steps.
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>, dispatcher: Dispatcher) -> Self {
        Self {
            orchestrator,
            dispatcher,
        }
    }
}
