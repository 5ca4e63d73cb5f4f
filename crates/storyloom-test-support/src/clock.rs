//! Test clocks — deterministic `Clock` implementations for tests.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use storyloom_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock that moves forward by `step` every time it is read.
///
/// The first read returns `start`.
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    step: TimeDelta,
    reads: AtomicI64,
}

impl SteppingClock {
    /// Creates a clock starting at `start` and advancing `step` per read.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            start,
            step,
            reads: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        self.start + self.step * i32::try_from(n).unwrap_or(i32::MAX)
    }
}
