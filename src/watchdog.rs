//! Watchdog guard.
//!
//! Forwards one refresh per orchestrator tick to the hardware watchdog.
//! Liveness holds as long as the tick interval stays well inside the
//! watchdog timeout; [`SupervisorConfig::validate`](crate::config::SupervisorConfig::validate)
//! enforces a 10x margin.

use log::info;

use crate::app::ports::WatchdogPort;

#[derive(Debug, Default)]
pub struct WatchdogGuard {
    timeout_ms: Option<u32>,
    refreshes: u64,
}

impl WatchdogGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the hardware watchdog.  Call once at setup.
    pub fn configure<W>(&mut self, wdt: &mut W, timeout_ms: u32)
    where
        W: WatchdogPort + ?Sized,
    {
        wdt.configure(timeout_ms);
        self.timeout_ms = Some(timeout_ms);
        info!("Watchdog: armed ({} ms timeout)", timeout_ms);
    }

    pub fn refresh<W>(&mut self, wdt: &mut W)
    where
        W: WatchdogPort + ?Sized,
    {
        wdt.refresh();
        self.refreshes = self.refreshes.wrapping_add(1);
    }

    /// Configured timeout, `None` before setup.
    pub fn timeout_ms(&self) -> Option<u32> {
        self.timeout_ms
    }

    /// Refreshes forwarded since boot.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }
}
