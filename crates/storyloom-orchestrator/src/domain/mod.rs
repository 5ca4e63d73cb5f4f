//! Domain model for the Orchestrator.

pub mod batch;
pub mod commands;
pub mod report;
pub mod state;
