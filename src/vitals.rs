//! Device vitals: the health readout pushed to an external collector.
//!
//! Individual fields are written by the memory monitor, the radio sample,
//! and the clock check; the publish channel reads the whole snapshot.

use core::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Network name (SSID) capacity.
pub type NetworkName = heapless::String<32>;

/// Formatted timestamp capacity (RFC 3339 with offset fits easily).
pub type TimeString = heapless::String<32>;

/// Formatted MAC address (`aa:bb:cc:dd:ee:ff`).
pub type MacString = heapless::String<17>;

// ---------------------------------------------------------------------------
// Reset reason
// ---------------------------------------------------------------------------

/// Why the last boot happened.  Encoded as a `u8` in the reset request so
/// the next boot can recover it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResetReason {
    #[default]
    Nominal = 0,
    UserRestart = 1,
    UserReset = 2,
    WatchdogTimeout = 3,
    OutOfMemory = 4,
    Panic = 5,
}

impl ResetReason {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a stored reset code.  Unknown codes read as `Nominal`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::UserRestart,
            2 => Self::UserReset,
            3 => Self::WatchdogTimeout,
            4 => Self::OutOfMemory,
            5 => Self::Panic,
            _ => Self::Nominal,
        }
    }

    /// True for resets the supervisor never recovers from in-process.
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            Self::WatchdogTimeout | Self::OutOfMemory | Self::Panic
        )
    }
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nominal => write!(f, "nominal"),
            Self::UserRestart => write!(f, "userRestart"),
            Self::UserReset => write!(f, "userReset"),
            Self::WatchdogTimeout => write!(f, "watchdogTimeout"),
            Self::OutOfMemory => write!(f, "outOfMemory"),
            Self::Panic => write!(f, "PANIC"),
        }
    }
}

// ---------------------------------------------------------------------------
// Startup status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StartupStatus {
    #[default]
    Pending,
    Complete,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A point-in-time vitals readout suitable for publishing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    /// Free heap in bytes at the last change.
    pub free_memory_bytes: u32,
    /// Radio signal strength, 0–100 %.
    pub signal_strength: u8,
    /// Wi-Fi network name; empty on cellular.
    pub network_name: NetworkName,
    /// Last observed wall-clock time, formatted by the clock service.
    pub last_synced_time: TimeString,
    /// Reason for the current boot.
    pub reset_reason: ResetReason,
    /// Periodic vitals publish interval (seconds, 0 = off).
    pub publish_interval_secs: u32,
    /// Wi-Fi MAC address; empty when the module has no Wi-Fi.
    pub mac: MacString,
    /// Total RAM of the module (bytes, 0 = unknown).
    pub total_ram_bytes: u32,
    /// Total flash of the module (bytes, 0 = unknown).
    pub total_flash_bytes: u32,
    /// Flash sector count.
    pub total_sectors: u32,
}

/// Format a 6-byte MAC as lowercase colon-separated hex.
pub fn format_mac(mac: &[u8; 6]) -> MacString {
    let mut s = MacString::new();
    let _ = write!(
        s,
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    s
}

/// Copy `src` into a fixed-capacity string, truncating at a char boundary.
/// Returns `true` when the value had to be truncated.
pub fn fill_truncated<const N: usize>(dst: &mut heapless::String<N>, src: &str) -> bool {
    dst.clear();
    let mut end = src.len().min(N);
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    // Cannot fail: `end <= N` and lands on a char boundary.
    let _ = dst.push_str(&src[..end]);
    end < src.len()
}
