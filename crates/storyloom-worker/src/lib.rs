//! Storyloom worker.
//!
//! Hosts the orchestrator: HTTP triggers and read views, the in-process
//! continuation scheduler, the sequential dispatch loop and the optional
//! daily ticker.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

/// Builds the full router over `state`.
pub fn app(state: state::AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/triggers", routes::triggers::router())
        .nest("/api/v1/stories", routes::stories::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
