//! Monotonic time sources for the countdown timer.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic instants
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real monotonic clock
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same offset, so a driver can hold one handle while the
/// timer owns another.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward, stopping at the latest representable instant
    pub fn advance(&self, by: Duration) {
        let current = self.offset.get();
        let mut step = by;
        while !step.is_zero() && self.origin.checked_add(current.saturating_add(step)).is_none() {
            step /= 2;
        }
        if step < by {
            tracing::warn!("Manual clock clamped: cannot advance {:?} past {:?}", by, current);
        }
        self.offset.set(current.saturating_add(step));
    }

    /// Total time advanced since creation
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}
