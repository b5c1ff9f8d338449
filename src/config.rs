//! Supervisor configuration parameters
//!
//! All tunable constants for the supervisor, selected once at startup.
//! Platform variants (radio type, memory sizing) are expressed as a
//! [`PlatformProfile`] rather than compile-time switches.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Device type string capacity.
pub type DeviceType = heapless::String<32>;

/// Topic string capacity.
pub type Topic = heapless::String<64>;

/// Flash sector size in bytes (all supported modules).
pub const FLASH_SECTOR_SIZE: u32 = 4 * 1024;

/// Hardware capabilities of the module the supervisor runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Module has a Wi-Fi radio.
    pub wifi: bool,
    /// Module has a cellular modem.
    pub cellular: bool,
    /// Total RAM in bytes (0 = unknown).
    pub total_ram_bytes: u32,
    /// Total flash in bytes (0 = unknown).
    pub total_flash_bytes: u32,
}

impl Capabilities {
    /// Number of flash sectors.
    pub fn total_sectors(&self) -> u32 {
        self.total_flash_bytes / FLASH_SECTOR_SIZE
    }
}

/// Supported module families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformProfile {
    /// Small Wi-Fi module (~80 KB RAM, 2 MB flash).
    WifiCompact,
    /// Small cellular module (~80 KB RAM, 2 MB flash).
    CellularCompact,
    /// Large Wi-Fi module (~3 MB RAM, 2 MB flash).
    WifiExtended,
    /// Wi-Fi + cellular system-on-module (~3 MB RAM, 8 MB flash).
    Hybrid,
    /// Host simulation: Wi-Fi only, sizes unknown.
    Host,
}

impl PlatformProfile {
    pub fn capabilities(self) -> Capabilities {
        const KIB: u32 = 1024;
        const MIB: u32 = 1024 * 1024;
        match self {
            Self::WifiCompact => Capabilities {
                wifi: true,
                cellular: false,
                total_ram_bytes: 80 * KIB,
                total_flash_bytes: 2 * MIB,
            },
            Self::CellularCompact => Capabilities {
                wifi: false,
                cellular: true,
                total_ram_bytes: 80 * KIB,
                total_flash_bytes: 2 * MIB,
            },
            Self::WifiExtended => Capabilities {
                wifi: true,
                cellular: false,
                total_ram_bytes: 3 * MIB,
                total_flash_bytes: 2 * MIB,
            },
            Self::Hybrid => Capabilities {
                wifi: true,
                cellular: true,
                total_ram_bytes: 3 * MIB,
                total_flash_bytes: 8 * MIB,
            },
            Self::Host => Capabilities {
                wifi: true,
                cellular: false,
                total_ram_bytes: 0,
                total_flash_bytes: 0,
            },
        }
    }
}

/// Core supervisor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    // --- Identity ---
    /// Device type reported alongside the structure version.
    pub device_type: DeviceType,
    /// Device structure version.
    pub device_version: u16,
    /// Module family (radio + memory sizing).
    pub platform: PlatformProfile,

    // --- Timing ---
    /// Fast check tick interval (milliseconds)
    pub check_interval_ms: u32,
    /// Periodic time resync interval (seconds)
    pub time_sync_interval_secs: u32,
    /// Hardware watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
    /// Vitals publish interval used until a persisted value exists (seconds, 0 = off)
    pub default_publish_vitals_secs: u32,

    // --- Safety ---
    /// Free-memory floor (bytes) below which the device resets
    pub memory_restart_limit_bytes: u32,

    // --- Cloud ---
    /// Topic prefix of the inbound name announcement
    pub name_topic: Topic,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        let mut device_type = DeviceType::new();
        let _ = device_type.push_str("nodewarden");
        let mut name_topic = Topic::new();
        let _ = name_topic.push_str("device/name");

        Self {
            device_type,
            device_version: 1,
            platform: PlatformProfile::Host,

            check_interval_ms: 100,
            time_sync_interval_secs: 6 * 60 * 60,
            watchdog_timeout_ms: 60_000,
            default_publish_vitals_secs: 6 * 60 * 60,

            memory_restart_limit_bytes: 5 * 1024,

            name_topic,
        }
    }
}

impl SupervisorConfig {
    pub fn capabilities(&self) -> Capabilities {
        self.platform.capabilities()
    }

    /// Reject combinations that would break the watchdog liveness margin or
    /// make the memory floor meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("check_interval_ms must be > 0"));
        }
        if self.time_sync_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "time_sync_interval_secs must be > 0",
            ));
        }
        if u64::from(self.check_interval_ms) * 10 > u64::from(self.watchdog_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "check_interval_ms must be at least 10x shorter than watchdog_timeout_ms",
            ));
        }
        if self.memory_restart_limit_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "memory_restart_limit_bytes must be > 0",
            ));
        }
        let ram = self.capabilities().total_ram_bytes;
        if ram != 0 && self.memory_restart_limit_bytes >= ram {
            return Err(ConfigError::ValidationFailed(
                "memory_restart_limit_bytes must be below total RAM",
            ));
        }
        if self.name_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("name_topic must not be empty"));
        }
        Ok(())
    }
}
