//! Worker configuration, read once at startup from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::NaiveTime;
use storyloom_orchestrator::application::orchestrator::{CONTINUATION_JOB, OrchestratorConfig};

use crate::error::AppError;

const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
const DEFAULT_USER_AGENT: &str = "storyloom/0.1";

/// Everything the worker needs to start.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Gemini API key.
    pub gemini_api_key: String,
    /// Model used for chapters.
    pub gemini_text_model: String,
    /// Model used for illustrations.
    pub gemini_image_model: String,
    /// Reddit OAuth bearer token.
    pub reddit_access_token: String,
    /// User agent sent to Reddit.
    pub reddit_user_agent: String,
    /// Stories per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_delay: Duration,
    /// Expiry renewed on every write.
    pub story_ttl: Duration,
    /// UTC wall-clock time of the in-process daily trigger, if any.
    pub daily_unlock_at: Option<NaiveTime>,
    /// OTLP collector endpoint, if traces should be exported.
    pub otlp_endpoint: Option<String>,
}

impl WorkerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            get(key)
                .ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
        };
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_owned());

        let batch_size: usize = parse(&or_default("UNLOCK_BATCH_SIZE", "3"), "UNLOCK_BATCH_SIZE")?;
        if batch_size == 0 {
            return Err(AppError::Config("UNLOCK_BATCH_SIZE must be at least 1".into()));
        }
        let delay_secs: u64 = parse(
            &or_default("UNLOCK_BATCH_DELAY_SECS", "60"),
            "UNLOCK_BATCH_DELAY_SECS",
        )?;
        if delay_secs == 0 {
            return Err(AppError::Config(
                "UNLOCK_BATCH_DELAY_SECS must be at least 1".into(),
            ));
        }
        let ttl_days: u64 = parse(&or_default("STORY_TTL_DAYS", "60"), "STORY_TTL_DAYS")?;
        if ttl_days == 0 {
            return Err(AppError::Config("STORY_TTL_DAYS must be at least 1".into()));
        }
        let ttl_secs = ttl_days
            .checked_mul(24 * 60 * 60)
            .ok_or_else(|| AppError::Config("STORY_TTL_DAYS is too large".into()))?;
        let daily_unlock_at = get("DAILY_UNLOCK_AT")
            .map(|raw| {
                NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| {
                    AppError::Config(format!("DAILY_UNLOCK_AT must be HH:MM (UTC): {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: or_default("HOST", "0.0.0.0"),
            port: parse(&or_default("PORT", "3000"), "PORT")?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_text_model: or_default("GEMINI_TEXT_MODEL", DEFAULT_TEXT_MODEL),
            gemini_image_model: or_default("GEMINI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            reddit_access_token: required("REDDIT_ACCESS_TOKEN")?,
            reddit_user_agent: or_default("REDDIT_USER_AGENT", DEFAULT_USER_AGENT),
            batch_size,
            batch_delay: Duration::from_secs(delay_secs),
            story_ttl: Duration::from_secs(ttl_secs),
            daily_unlock_at,
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// Socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a valid address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Orchestrator tunables derived from this configuration.
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            batch_size: self.batch_size,
            batch_delay: self.batch_delay,
            story_ttl: self.story_ttl,
            continuation_job: CONTINUATION_JOB.to_owned(),
        }
    }
}

fn parse<T>(raw: &str, key: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key} is invalid: {e}")))
}
