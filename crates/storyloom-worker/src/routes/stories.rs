//! Routes for story initialization and read views.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Deserialize;
use storyloom_core::story_id::StoryId;
use storyloom_orchestrator::application::initializer;
use storyloom_orchestrator::domain::commands::InitializeStory;
use storyloom_stories::application::query_handlers::{self, StoryView};
use storyloom_stories::domain::registry::ActiveStories;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeStoryRequest {
    /// Post the story lives under.
    pub post_id: String,
    /// Story title.
    pub title: String,
    /// Chapters the story will have once complete.
    pub total_chapters: u32,
    /// Premise the first chapter is written from.
    pub seed_prompt: String,
}

/// POST /
#[instrument(skip(state, request), fields(post_id = %request.post_id))]
async fn initialize_story(
    State(state): State<AppState>,
    Json(request): Json<InitializeStoryRequest>,
) -> Result<(StatusCode, Json<StoryView>), ApiError> {
    let command = InitializeStory {
        correlation_id: Uuid::new_v4(),
        post_id: request.post_id,
        title: request.title,
        total_chapters: request.total_chapters,
        seed_prompt: request.seed_prompt,
    };

    info!(correlation_id = %command.correlation_id, "handling initialize_story command");

    let (story_id, _) = initializer::initialize_story(&command, &state.orchestrator).await?;
    let view = query_handlers::get_story(&story_id, state.orchestrator.stories()).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /
async fn list_active(State(state): State<AppState>) -> Result<Json<ActiveStories>, ApiError> {
    let active = query_handlers::list_active(state.orchestrator.registry()).await?;
    Ok(Json(active))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoryView>, ApiError> {
    let story_id = StoryId::parse(&id)?;
    let view = query_handlers::get_story(&story_id, state.orchestrator.stories()).await?;
    Ok(Json(view))
}

/// Returns the router for stories.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active).post(initialize_story))
        .route("/{id}", get(get_story))
}
