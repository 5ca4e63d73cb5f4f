//! Application services for the Orchestrator.

pub mod initializer;
pub mod orchestrator;
