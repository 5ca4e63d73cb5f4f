//! Storyloom Core — shared abstractions.
//!
//! This crate defines the traits and types every bounded context depends on:
//! time, the durable key-value store, the deferred-job scheduler, story
//! identifiers and the inbound trigger messages. It contains no
//! infrastructure code.

pub mod clock;
pub mod error;
pub mod kv;
pub mod message;
pub mod scheduler;
pub mod story_id;
