//! Storyloom — Orchestrator.
//!
//! Runs the daily unlock cycle: rebuilds the registry, splits it into
//! batches, advances each story in the current batch by one chapter and
//! schedules the next batch as a deferred continuation.

pub mod application;
pub mod domain;
