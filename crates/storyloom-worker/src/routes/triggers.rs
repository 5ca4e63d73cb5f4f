//! Trigger intake: runs cycle steps through the dispatch loop.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::Serialize;
use storyloom_core::message::TriggerMessage;
use storyloom_orchestrator::domain::report::StepReport;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for POST /cancel.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// Whether a pending continuation existed.
    pub cancelled: bool,
}

/// POST /
///
/// Unknown `type` tags and malformed fields are rejected by the JSON extractor
/// with 422; well-formed but invalid continuations come back as 400.
#[instrument(skip_all, fields(trigger = message.kind()))]
async fn run_trigger(
    State(state): State<AppState>,
    Json(message): Json<TriggerMessage>,
) -> Result<Json<StepReport>, ApiError> {
    message.validate()?;
    info!("handling trigger");
    let report = state.dispatcher.run(message).await?;
    Ok(Json(report))
}

/// POST /cancel
#[instrument(skip_all)]
async fn cancel_pending(State(state): State<AppState>) -> Result<Json<CancelResponse>, ApiError> {
    let cancelled = state.orchestrator.cancel_pending().await?;
    Ok(Json(CancelResponse { cancelled }))
}

/// Returns the router for trigger intake.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(run_trigger))
        .route("/cancel", post(cancel_pending))
}
