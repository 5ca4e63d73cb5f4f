//! Storyloom — Stories bounded context.
//!
//! Owns the story document (chapters, progress) and the derived registry of
//! stories that are currently advancing.

pub mod application;
pub mod domain;
