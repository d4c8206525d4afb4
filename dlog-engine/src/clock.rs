//! Wall-clock access behind a narrow seam.
//!
//! Archive expiry and the follow-mode end check compare record data against
//! "now"; routing that through a trait keeps query runs reproducible under
//! test.

use dlog_common::Seconds;

/// Source of the current wall-clock time in epoch seconds.
pub trait Clock {
    fn now(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Seconds::now().get()
    }
}

/// A clock pinned to one instant, for tests and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}
