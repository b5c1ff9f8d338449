//! Mock platform for integration tests.
//!
//! Implements every driven port and records each call in order, so tests
//! can assert on the exact effect sequence of an entry point.

use nodewarden::app::events::SupervisorEvent;
use nodewarden::app::ports::{
    ClockPort, ConnectionKind, ConnectivityPort, DeviceId, EventSink, PersistencePort,
    PublishPort, RadioPort, StoragePort, SystemPort, WatchdogPort,
};
use nodewarden::error::StorageError;
use nodewarden::vitals::{NetworkName, ResetReason, TimeString, VitalsSnapshot};
use std::collections::HashMap;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Configure(u32),
    Refresh,
    Connect,
    Disconnect,
    TimeSync,
    PublishVitals,
    SetInterval(u32),
    PublishEvent(String),
    Save,
    Reset(ResetReason),
}

// ── MockPorts ─────────────────────────────────────────────────

pub struct MockPorts {
    pub calls: Vec<Call>,
    pub connected: bool,
    pub free_bytes: u32,
    pub kind: ConnectionKind,
    pub radio_ready: bool,
    pub signal: f32,
    pub network: &'static str,
    pub clock: i64,
    pub boot_reason: ResetReason,
}

#[allow(dead_code)]
impl MockPorts {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            connected: false,
            free_bytes: 64 * 1024,
            kind: ConnectionKind::Wifi,
            radio_ready: true,
            signal: 72.4,
            network: "Workshop",
            clock: 0,
            boot_reason: ResetReason::Nominal,
        }
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn saves(&self) -> usize {
        self.count(&Call::Save)
    }

    pub fn last_call(&self) -> Option<&Call> {
        self.calls.last()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityPort for MockPorts {
    fn connect(&mut self) {
        self.calls.push(Call::Connect);
    }
    fn disconnect(&mut self) {
        self.calls.push(Call::Disconnect);
    }
    fn is_connected(&self) -> bool {
        self.connected
    }
    fn connection_kind(&self) -> ConnectionKind {
        self.kind
    }
    fn request_time_sync(&mut self) {
        self.calls.push(Call::TimeSync);
    }
}

impl WatchdogPort for MockPorts {
    fn configure(&mut self, timeout_ms: u32) {
        self.calls.push(Call::Configure(timeout_ms));
    }
    fn refresh(&mut self) {
        self.calls.push(Call::Refresh);
    }
}

impl ClockPort for MockPorts {
    fn now(&self) -> i64 {
        self.clock
    }
    fn is_valid(&self) -> bool {
        self.clock > 0
    }
    fn format(&self, timestamp: i64) -> TimeString {
        let mut s = TimeString::new();
        let _ = s.push_str(&format!("t{timestamp}"));
        s
    }
}

impl RadioPort for MockPorts {
    fn is_ready(&self, kind: ConnectionKind) -> bool {
        self.radio_ready && kind == self.kind
    }
    fn signal_strength(&self) -> f32 {
        self.signal
    }
    fn network_name(&self) -> Option<NetworkName> {
        let mut n = NetworkName::new();
        n.push_str(self.network).ok()?;
        Some(n)
    }
}

impl PublishPort for MockPorts {
    fn publish_vitals(&mut self, _snapshot: &VitalsSnapshot) {
        self.calls.push(Call::PublishVitals);
    }
    fn set_vitals_interval(&mut self, secs: u32) {
        self.calls.push(Call::SetInterval(secs));
    }
    fn publish_event(&mut self, name: &str, _payload: &str) {
        self.calls.push(Call::PublishEvent(name.to_owned()));
    }
}

impl PersistencePort for MockPorts {
    fn request_save(&mut self) {
        self.calls.push(Call::Save);
    }
}

impl SystemPort for MockPorts {
    fn free_memory(&self) -> u32 {
        self.free_bytes
    }
    fn reset(&mut self, reason: ResetReason) {
        self.calls.push(Call::Reset(reason));
    }
    fn last_reset_reason(&self) -> ResetReason {
        self.boot_reason
    }
    fn device_id(&self) -> DeviceId {
        let mut id = DeviceId::new();
        let _ = id.push_str("NW-TEST01");
        id
    }
    fn mac_address(&self) -> Option<[u8; 6]> {
        Some([0x24, 0x0A, 0xC4, 0x12, 0x34, 0x56])
    }
}

// ── Event log sink ────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<SupervisorEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &SupervisorEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &SupervisorEvent) {
        self.events.push(event.clone());
    }
}

// ── In-memory storage ─────────────────────────────────────────

#[derive(Default)]
pub struct MemStorage {
    pub data: HashMap<(String, String), Vec<u8>>,
    pub writes: u32,
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self
            .data
            .get(&(namespace.to_owned(), key.to_owned()))
            .ok_or(StorageError::NotFound)?;
        if v.len() > buf.len() {
            return Err(StorageError::BufferTooSmall);
        }
        buf[..v.len()].copy_from_slice(v);
        Ok(v.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.writes += 1;
        self.data
            .insert((namespace.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&(namespace.to_owned(), key.to_owned()));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.data
            .contains_key(&(namespace.to_owned(), key.to_owned()))
    }
}
