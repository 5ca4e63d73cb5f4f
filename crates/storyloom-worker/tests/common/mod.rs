//! Shared test helpers for worker integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use storyloom_core::clock::Clock;
use storyloom_core::kv::KeyValueStore;
use storyloom_orchestrator::application::orchestrator::{Orchestrator, OrchestratorConfig};
use storyloom_test_support::{
    FixedClock, InMemoryCommentSource, InMemoryKvStore, RecordingScheduler, ScriptedGenerator,
};
use tower::ServiceExt;

use storyloom_worker::dispatch::{DISPATCH_CAPACITY, Dispatcher, run_dispatch_loop};
use storyloom_worker::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 3, 1, 9, 0, 0).unwrap(),
    ))
}

/// The full router plus handles on the doubles behind it.
pub struct TestApp {
    pub router: Router,
    pub comments: Arc<InMemoryCommentSource>,
    pub scheduler: Arc<RecordingScheduler>,
}

impl TestApp {
    /// A fresh handle on the router; every request consumes one.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full app over in-memory doubles. Must be called inside a Tokio
/// runtime, since it spawns the dispatch loop.
pub fn build_test_app() -> TestApp {
    build_test_app_with(Arc::new(InMemoryKvStore::new()), ScriptedGenerator::new())
}

/// Build the full app over a caller-supplied store and generator.
pub fn build_test_app_with(kv: Arc<dyn KeyValueStore>, generator: ScriptedGenerator) -> TestApp {
    let comments = Arc::new(InMemoryCommentSource::new());
    let scheduler = Arc::new(RecordingScheduler::new());
    let orchestrator = Arc::new(Orchestrator::new(
        kv,
        Arc::new(generator),
        comments.clone(),
        scheduler.clone(),
        fixed_clock(),
        OrchestratorConfig::default(),
    ));
    let (dispatcher, rx) = Dispatcher::channel(DISPATCH_CAPACITY);
    tokio::spawn(run_dispatch_loop(orchestrator.clone(), rx));

    TestApp {
        router: storyloom_worker::app(AppState::new(orchestrator, dispatcher)),
        comments,
        scheduler,
    }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Create a story through the API and return its normalized id.
pub async fn create_story(app: Router, post_id: &str, title: &str, total_chapters: u32) -> String {
    let (status, json) = post_json(
        app,
        "/api/v1/stories",
        &serde_json::json!({
            "postId": post_id,
            "title": title,
            "totalChapters": total_chapters,
            "seedPrompt": format!("The opening of {title}."),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create {post_id}: {json}");
    json["storyId"].as_str().unwrap().to_owned()
}
