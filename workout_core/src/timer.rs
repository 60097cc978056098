//! Wall-clock countdown timer.
//!
//! Remaining time is recomputed from a start instant on every check rather
//! than decremented per tick, so slow or irregular polling never makes the
//! countdown drift. The owner calls [`CountdownTimer::poll`] periodically
//! (every 100ms by default); that call is the "periodic check".

use crate::clock::{Clock, MonotonicClock};
use std::time::{Duration, Instant};

/// Outcome of a periodic check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Still counting; whole seconds remaining (rounded up)
    Tick(u64),
    /// Reached zero on its own. Reported once per countdown.
    Completed,
}

/// A single-owner countdown over a [`Clock`]
#[derive(Debug)]
pub struct CountdownTimer<C: Clock = MonotonicClock> {
    clock: C,
    duration: Duration,
    /// Remaining time at the moment `anchor` was taken
    segment: Duration,
    /// Set while a periodic check is active
    anchor: Option<Instant>,
    remaining: Duration,
    running: bool,
    paused: bool,
}

impl CountdownTimer<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for CountdownTimer<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> CountdownTimer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            duration: Duration::ZERO,
            segment: Duration::ZERO,
            anchor: None,
            remaining: Duration::ZERO,
            running: false,
            paused: false,
        }
    }

    /// Start a new countdown, cancelling any countdown in progress
    pub fn start(&mut self, duration: Duration) {
        self.duration = duration;
        self.segment = duration;
        self.remaining = duration;
        self.anchor = Some(self.clock.now());
        self.running = true;
        self.paused = false;
        tracing::debug!("Timer started for {:?}", duration);
    }

    /// Run one periodic check.
    ///
    /// Returns `None` when no countdown is active (idle, paused, finished).
    pub fn poll(&mut self) -> Option<TimerEvent> {
        let anchor = self.anchor?;
        self.remaining = self.remaining_since(anchor);

        if self.remaining.is_zero() {
            self.anchor = None;
            self.running = false;
            tracing::debug!("Timer completed after {:?}", self.duration);
            Some(TimerEvent::Completed)
        } else {
            Some(TimerEvent::Tick(self.remaining_secs()))
        }
    }

    /// Freeze the countdown. Only valid while running and not paused.
    pub fn pause(&mut self) {
        let Some(anchor) = self.anchor else {
            return;
        };
        if !self.running || self.paused {
            return;
        }

        let remaining = self.remaining_since(anchor);
        if remaining.is_zero() {
            // Already expired; the next poll reports completion
            return;
        }

        self.remaining = remaining;
        self.anchor = None;
        self.paused = true;
        tracing::debug!("Timer paused with {:?} remaining", remaining);
    }

    /// Continue from the frozen remaining time; paused time is not counted
    pub fn resume(&mut self) {
        if !self.running || !self.paused {
            return;
        }

        self.segment = self.remaining;
        self.anchor = Some(self.clock.now());
        self.paused = false;
        tracing::debug!("Timer resumed with {:?} remaining", self.remaining);
    }

    /// End the countdown now without reporting completion
    pub fn skip(&mut self) {
        self.anchor = None;
        self.remaining = Duration::ZERO;
        self.running = false;
        self.paused = false;
        tracing::debug!("Timer skipped");
    }

    /// Hard reset
    pub fn stop(&mut self) {
        self.anchor = None;
        self.duration = Duration::ZERO;
        self.segment = Duration::ZERO;
        self.remaining = Duration::ZERO;
        self.running = false;
        self.paused = false;
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Length of the current (or last) countdown
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Remaining time as of the last check
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining whole seconds as of the last check, rounded up
    pub fn remaining_secs(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    fn remaining_since(&self, anchor: Instant) -> Duration {
        let elapsed = self.clock.now().saturating_duration_since(anchor);
        self.segment.saturating_sub(elapsed)
    }
}
