//! Wall-clock abstraction so cycles and continuations can be replayed in tests.

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current time for unlock timestamps and continuation deadlines.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Time elapsed between `start` and now, clamped at zero when the clock
    /// reads earlier than `start`.
    fn elapsed_since(&self, start: DateTime<Utc>) -> TimeDelta {
        (self.now() - start).max(TimeDelta::zero())
    }
}

impl std::fmt::Debug for dyn Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dyn Clock({})", self.now())
    }
}

/// Production clock backed by `Utc::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
