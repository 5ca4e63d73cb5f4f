//! Application services for the Stories context.

pub mod query_handlers;
pub mod registry;
pub mod story_store;
