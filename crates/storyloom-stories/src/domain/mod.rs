//! Domain model for the Stories context.

pub mod registry;
pub mod story;
