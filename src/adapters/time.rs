//! Time adapter.
//!
//! [`SystemClock`] implements [`ClockPort`] (UTC wall clock, RFC 3339
//! formatting via `chrono`) and provides the monotonic uptime the main
//! loop feeds to the supervisor timers.
//!
//! - **`target_os = "espidf"`**: `gettimeofday()` for the wall clock,
//!   `esp_timer_get_time()` for uptime (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: `chrono::Utc::now()` and
//!   `std::time::Instant` for host-side testing and simulation.

use core::fmt::Write;

use chrono::DateTime;
use embassy_time::Instant;

use crate::app::ports::ClockPort;
use crate::vitals::TimeString;

/// Anything earlier has not been set from an authoritative source
/// (2020-01-01T00:00:00Z).
const EPOCH_2020: i64 = 1_577_836_800;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: read-only query of the high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Uptime as a timer instant.
    pub fn instant(&self) -> Instant {
        Instant::from_micros(self.uptime_us())
    }

    #[cfg(target_os = "espidf")]
    fn unix_secs(&self) -> i64 {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: tv is a valid out-parameter; the timezone pointer may be null.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return 0;
        }
        i64::from(tv.tv_sec)
    }

    #[cfg(not(target_os = "espidf"))]
    fn unix_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Render `timestamp` as `YYYY-MM-DDTHH:MM:SSZ`; empty when out of range.
pub fn format_utc(timestamp: i64) -> TimeString {
    let mut s = TimeString::new();
    if let Some(dt) = DateTime::from_timestamp(timestamp, 0) {
        let _ = write!(s, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ"));
    }
    s
}

impl ClockPort for SystemClock {
    fn now(&self) -> i64 {
        self.unix_secs()
    }

    fn is_valid(&self) -> bool {
        self.unix_secs() >= EPOCH_2020
    }

    fn format(&self, timestamp: i64) -> TimeString {
        format_utc(timestamp)
    }
}
