//! Port traits: the hexagonal boundary between the supervisor and the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor (domain)
//! ```
//!
//! Every call the supervisor makes through these ports is a fire-and-forget
//! request: connect/disconnect/publish return immediately, and their
//! completion is observed on a later tick through [`ConnectivityPort::is_connected`].
//! Nothing here may block.
//!
//! [`DevicePorts`] bundles every driven port so one mutable handle can be
//! threaded through a tick without double borrows.

use crate::error::StorageError;
use crate::vitals::{NetworkName, ResetReason, TimeString, VitalsSnapshot};

use super::events::SupervisorEvent;

/// Stable device identifier.
pub type DeviceId = heapless::String<24>;

// ───────────────────────────────────────────────────────────────
// Connectivity provider
// ───────────────────────────────────────────────────────────────

/// Transport the cloud link is currently running over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Wifi,
    Cellular,
    None,
}

/// The cloud connection.  Retry cadence and backoff are owned by the
/// implementation, not the supervisor.
pub trait ConnectivityPort {
    /// Request the link to come up.
    fn connect(&mut self);

    /// Request the link to drop.  Must not power the radio down.
    fn disconnect(&mut self);

    /// Probe: is the cloud link up right now?
    fn is_connected(&self) -> bool;

    /// Which transport the link uses.
    fn connection_kind(&self) -> ConnectionKind;

    /// Ask the cloud for an authoritative time.
    fn request_time_sync(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Watchdog service
// ───────────────────────────────────────────────────────────────

/// Hardware watchdog.  Once configured, the platform resets the device
/// (tagged `WatchdogTimeout`) unless `refresh` is called within the timeout.
pub trait WatchdogPort {
    fn configure(&mut self, timeout_ms: u32);
    fn refresh(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock service
// ───────────────────────────────────────────────────────────────

/// Wall clock, always UTC.
pub trait ClockPort {
    /// Seconds since the Unix epoch.
    fn now(&self) -> i64;

    /// False until the clock has been set from an authoritative source.
    fn is_valid(&self) -> bool;

    /// Render a timestamp for the vitals snapshot.
    fn format(&self, timestamp: i64) -> TimeString;
}

// ───────────────────────────────────────────────────────────────
// Radio telemetry
// ───────────────────────────────────────────────────────────────

pub trait RadioPort {
    /// Whether the radio behind `kind` is up and can be sampled.
    fn is_ready(&self, kind: ConnectionKind) -> bool;

    /// Signal strength, 0–100 %.
    fn signal_strength(&self) -> f32;

    /// Network name; `None` where the transport has no equivalent (cellular).
    fn network_name(&self) -> Option<NetworkName>;
}

// ───────────────────────────────────────────────────────────────
// Publish channel
// ───────────────────────────────────────────────────────────────

pub trait PublishPort {
    /// Publish the snapshot right now.
    fn publish_vitals(&mut self, snapshot: &VitalsSnapshot);

    /// Set the periodic vitals interval (seconds, 0 = off).
    fn set_vitals_interval(&mut self, secs: u32);

    /// Publish a named event with a string payload.
    fn publish_event(&mut self, name: &str, payload: &str);
}

// ───────────────────────────────────────────────────────────────
// Persistence trigger
// ───────────────────────────────────────────────────────────────

pub trait PersistencePort {
    /// Ask the persistence collaborator to save the current settings.
    fn request_save(&mut self);
}

// ───────────────────────────────────────────────────────────────
// System control
// ───────────────────────────────────────────────────────────────

pub trait SystemPort {
    /// Current free heap in bytes.
    fn free_memory(&self) -> u32;

    /// Reset the device, recording `reason` for the next boot.  On hardware
    /// this does not return.
    fn reset(&mut self, reason: ResetReason);

    /// Reason recorded for the current boot.
    fn last_reset_reason(&self) -> ResetReason;

    /// Stable device identifier.
    fn device_id(&self) -> DeviceId;

    /// Factory MAC of the Wi-Fi interface, if any.
    fn mac_address(&self) -> Option<[u8; 6]>;
}

// ───────────────────────────────────────────────────────────────
// Bundle
// ───────────────────────────────────────────────────────────────

/// Every driven port the supervisor needs during a tick.
pub trait DevicePorts:
    ConnectivityPort + WatchdogPort + ClockPort + RadioPort + PublishPort + PersistencePort + SystemPort
{
}

impl<T> DevicePorts for T where
    T: ConnectivityPort
        + WatchdogPort
        + ClockPort
        + RadioPort
        + PublishPort
        + PersistencePort
        + SystemPort
{
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The supervisor emits structured [`SupervisorEvent`]s through this port.
/// Adapters decide where they go (serial log, cloud event, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &SupervisorEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: settings ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Write operations MUST be atomic: no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this natively.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}
