//! Shared test doubles for the Storyloom chapter-unlock engine.

mod clock;
mod comments;
mod generator;
mod kv;
mod scheduler;

pub use clock::{FixedClock, SteppingClock};
pub use comments::InMemoryCommentSource;
pub use generator::ScriptedGenerator;
pub use kv::{FailingKvStore, InMemoryKvStore};
pub use scheduler::{FailingScheduler, RecordingScheduler};
