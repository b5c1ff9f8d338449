//! One-shot deadline timers.
//!
//! The supervisor is driven by two of these: the fast check timer, which
//! the tick re-arms as its last step, and the slow sync timer, which is
//! only re-armed when a resync actually executes.  Timers never fire on
//! their own; [`Timer::poll`] is called with the current monotonic time
//! and reports whether the deadline passed.

use embassy_time::{Duration, Instant};

/// A stoppable one-shot timer.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Timer {
    /// A stopped timer with the given interval.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Arm the timer to fire one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Disarm without firing.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Stop and start again, re-baselining the interval at `now`.
    pub fn restart(&mut self, now: Instant) {
        self.stop();
        self.start(now);
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the deadline has passed, then
    /// leaves the timer stopped.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
