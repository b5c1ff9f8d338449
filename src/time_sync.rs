//! Time sync scheduler.
//!
//! Two independent jobs:
//!
//! 1. **Resync**: a pending flag raised by the slow sync timer or by the
//!    `SyncTime` action.  It is served on the first tick that sees the link
//!    Connected; the sync timer is then restarted so the next interval is
//!    measured from the actual resync, not the request.  The timer is
//!    one-shot and stays stopped while a request is pending, so a long
//!    disconnect produces one resync on reconnect rather than a burst.
//! 2. **Clock advance**: each tick, if the wall clock is valid and has
//!    moved past the last stored timestamp, the new formatted time is
//!    handed back for the vitals snapshot.

use embassy_time::{Duration, Instant};
use log::info;

use crate::app::ports::{ClockPort, ConnectivityPort};
use crate::timer::Timer;
use crate::vitals::TimeString;

pub struct TimeSyncScheduler {
    timer: Timer,
    pending: bool,
    last_now: i64,
}

impl TimeSyncScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: Timer::new(interval),
            pending: false,
            last_now: 0,
        }
    }

    /// Start the slow timer.  Call once at setup.
    pub fn start(&mut self, now: Instant) {
        self.timer.start(now);
    }

    /// Poll the slow timer; raises the pending flag when it fires.
    pub fn poll_timer(&mut self, now: Instant) -> bool {
        if self.timer.poll(now) {
            self.on_timer();
            true
        } else {
            false
        }
    }

    /// Slow timer handler.
    pub fn on_timer(&mut self) {
        self.pending = true;
    }

    /// Explicit resync request (the `SyncTime` action).
    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Serve a pending resync if the link is up.  Returns `true` when the
    /// request went out.
    pub fn evaluate<N>(&mut self, connected: bool, now: Instant, net: &mut N) -> bool
    where
        N: ConnectivityPort + ?Sized,
    {
        if !(self.pending && connected) {
            return false;
        }
        info!("TimeSync: resynchronizing time with cloud");
        net.request_time_sync();
        self.timer.restart(now);
        self.pending = false;
        true
    }

    /// Returns the formatted time when the clock has advanced since the
    /// last stored reading.
    pub fn observe_clock<C>(&mut self, clock: &C) -> Option<TimeString>
    where
        C: ClockPort + ?Sized,
    {
        if !clock.is_valid() {
            return None;
        }
        let now = clock.now();
        if now <= self.last_now {
            return None;
        }
        self.last_now = now;
        Some(clock.format(now))
    }

    /// Last stored wall-clock reading (seconds since epoch, 0 = none yet).
    pub fn last_now(&self) -> i64 {
        self.last_now
    }
}
