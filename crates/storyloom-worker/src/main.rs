//! Storyloom worker entry point.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use storyloom_comments::reddit::RedditCommentSource;
use storyloom_core::clock::{Clock, SystemClock};
use storyloom_generation::gemini::GeminiGenerator;
use storyloom_kv_store::MIGRATOR;
use storyloom_kv_store::pg_kv_store::PgKvStore;
use storyloom_orchestrator::application::orchestrator::Orchestrator;
use storyloom_worker::config::WorkerConfig;
use storyloom_worker::dispatch::{self, DISPATCH_CAPACITY, Dispatcher};
use storyloom_worker::scheduler::TokioScheduler;
use storyloom_worker::state::AppState;
use storyloom_worker::{app, telemetry};

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = WorkerConfig::from_env()?;
    let provider = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!(
        batch_size = config.batch_size,
        batch_delay_secs = config.batch_delay.as_secs(),
        "Starting Storyloom worker"
    );

    // Database and schema.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    MIGRATOR.run(&pool).await?;

    // Adapters.
    let kv = Arc::new(PgKvStore::new(pool));
    let generator = GeminiGenerator::new(config.gemini_api_key.clone())?
        .with_text_model(config.gemini_text_model.clone())
        .with_image_model(config.gemini_image_model.clone());
    let comments = RedditCommentSource::new(
        config.reddit_access_token.clone(),
        config.reddit_user_agent.clone(),
    )?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Engine and dispatch loop.
    let (dispatcher, rx) = Dispatcher::channel(DISPATCH_CAPACITY);
    let scheduler = Arc::new(TokioScheduler::new(dispatcher.clone(), clock.clone()));
    let orchestrator = Arc::new(Orchestrator::new(
        kv.clone(),
        Arc::new(generator),
        Arc::new(comments),
        scheduler,
        clock.clone(),
        config.orchestrator_config(),
    ));
    let dispatch_loop = tokio::spawn(dispatch::run_dispatch_loop(orchestrator.clone(), rx));

    if let Some(at) = config.daily_unlock_at {
        tokio::spawn(dispatch::run_daily_ticker(dispatcher.clone(), clock, at));
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match kv.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "purged expired documents"),
                Err(e) => tracing::warn!(error = %e, "failed to purge expired documents"),
            }
        }
    });

    let app = app(AppState::new(orchestrator, dispatcher));

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Remaining senders live in the ticker and scheduler tasks.
    dispatch_loop.abort();
    tracing::info!("Storyloom worker stopped");
    telemetry::shutdown(provider);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
