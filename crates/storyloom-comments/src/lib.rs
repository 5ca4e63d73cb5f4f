//! Storyloom — Comment Harvester.
//!
//! Reads the audience's top comment as steering input for the next chapter
//! and clears a story's comments once that chapter is unlocked.

pub mod error;
pub mod harvester;
pub mod reddit;
pub mod source;
