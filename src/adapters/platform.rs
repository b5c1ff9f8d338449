//! Platform bundle.
//!
//! [`Platform`] owns one adapter per collaborator and implements every
//! driven port by delegation, so the supervisor sees a single
//! [`DevicePorts`](crate::app::ports::DevicePorts) handle.  It also keeps
//! the save-request flag raised through [`PersistencePort`]; the main loop
//! collects it with [`Platform::take_save_request`].

use embassy_time::Instant;

use crate::app::ports::{
    ClockPort, ConnectionKind, ConnectivityPort, DeviceId, PersistencePort, PublishPort,
    RadioPort, SystemPort, WatchdogPort,
};
use crate::drivers::watchdog::TaskWatchdog;
use crate::vitals::{NetworkName, ResetReason, TimeString, VitalsSnapshot};

use super::publish::LogPublisher;
use super::system::SystemAdapter;
use super::time::SystemClock;
use super::wifi::WifiAdapter;

pub struct Platform {
    pub wifi: WifiAdapter,
    pub watchdog: TaskWatchdog,
    pub clock: SystemClock,
    pub system: SystemAdapter,
    pub publisher: LogPublisher,
    save_requested: bool,
}

impl Platform {
    pub fn new(wifi: WifiAdapter, system: SystemAdapter) -> Self {
        Self {
            wifi,
            watchdog: TaskWatchdog::new(),
            clock: SystemClock::new(),
            system,
            publisher: LogPublisher::new(),
            save_requested: false,
        }
    }

    /// Monotonic uptime for the supervisor timers.
    pub fn uptime(&self) -> Instant {
        self.clock.instant()
    }

    /// Adapter housekeeping outside the supervisor: WiFi backoff and
    /// periodic vitals.
    pub fn service(&mut self, now: Instant, vitals: &VitalsSnapshot) {
        self.wifi.poll(now);
        self.publisher.poll(now, vitals);
    }

    /// Returns `true` once per raised save request.
    pub fn take_save_request(&mut self) -> bool {
        core::mem::take(&mut self.save_requested)
    }
}

impl ConnectivityPort for Platform {
    fn connect(&mut self) {
        self.wifi.connect();
    }
    fn disconnect(&mut self) {
        self.wifi.disconnect();
    }
    fn is_connected(&self) -> bool {
        self.wifi.is_connected()
    }
    fn connection_kind(&self) -> ConnectionKind {
        self.wifi.connection_kind()
    }
    fn request_time_sync(&mut self) {
        self.wifi.request_time_sync();
    }
}

impl WatchdogPort for Platform {
    fn configure(&mut self, timeout_ms: u32) {
        self.watchdog.configure(timeout_ms);
    }
    fn refresh(&mut self) {
        self.watchdog.refresh();
    }
}

impl ClockPort for Platform {
    fn now(&self) -> i64 {
        self.clock.now()
    }
    fn is_valid(&self) -> bool {
        self.clock.is_valid()
    }
    fn format(&self, timestamp: i64) -> TimeString {
        self.clock.format(timestamp)
    }
}

impl RadioPort for Platform {
    fn is_ready(&self, kind: ConnectionKind) -> bool {
        self.wifi.is_ready(kind)
    }
    fn signal_strength(&self) -> f32 {
        self.wifi.signal_strength()
    }
    fn network_name(&self) -> Option<NetworkName> {
        self.wifi.network_name()
    }
}

impl PublishPort for Platform {
    fn publish_vitals(&mut self, snapshot: &VitalsSnapshot) {
        self.publisher.publish_vitals(snapshot);
    }
    fn set_vitals_interval(&mut self, secs: u32) {
        self.publisher.set_vitals_interval(secs);
    }
    fn publish_event(&mut self, name: &str, payload: &str) {
        self.publisher.publish_event(name, payload);
    }
}

impl PersistencePort for Platform {
    fn request_save(&mut self) {
        self.save_requested = true;
    }
}

impl SystemPort for Platform {
    fn free_memory(&self) -> u32 {
        self.system.free_memory()
    }
    fn reset(&mut self, reason: ResetReason) {
        self.system.reset(reason);
    }
    fn last_reset_reason(&self) -> ResetReason {
        self.system.last_reset_reason()
    }
    fn device_id(&self) -> DeviceId {
        self.system.device_id()
    }
    fn mac_address(&self) -> Option<[u8; 6]> {
        self.system.mac_address()
    }
}
