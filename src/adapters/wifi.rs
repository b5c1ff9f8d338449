//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`] and [`RadioPort`] for the cloud link.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` in station
//!   mode, SNTP for time sync.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! The supervisor has no retry policy; this adapter owns it.  After a
//! failed attempt or a dropped link it waits an exponential backoff
//! (2 s → 4 s → 8 s … capped at 60 s), driven by [`WifiAdapter::poll`].
//!
//! `disconnect` leaves the radio powered: the station is disassociated but
//! the driver keeps running, so a later `connect` is cheap.

use core::fmt;

use embassy_time::{Duration, Instant};
use log::{error, info, warn};

use crate::app::ports::{ConnectionKind, ConnectivityPort, RadioPort};
use crate::settings::is_printable_ascii;
use crate::vitals::{NetworkName, fill_truncated};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl std::error::Error for WifiError {}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Link state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    /// Not associated and not trying.
    Idle,
    Connecting,
    Connected,
    /// Waiting out the backoff before the next attempt.
    Backoff { attempt: u32 },
}

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;
/// How long an accepted connect request may take to associate.
const CONNECT_TIMEOUT_SECS: u64 = 10;

fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

/// Map RSSI (dBm) to 0–100 %: -100 dBm and below is 0, -50 dBm and above 100.
pub fn rssi_to_percent(rssi: i8) -> f32 {
    (f32::from(rssi) + 100.0).clamp(0.0, 50.0) * 2.0
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_secs: u32,
    retry_at: Option<Instant>,
    /// Association deadline while `Connecting`.
    connect_deadline: Option<Instant>,
    /// Retry number of the attempt in flight.
    in_flight: u32,
    time_syncs: u32,
    #[cfg(target_os = "espidf")]
    driver: Option<EspWifi<'static>>,
    #[cfg(target_os = "espidf")]
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
    /// Simulation: counts platform_connect() calls for deterministic failures.
    #[cfg(not(target_os = "espidf"))]
    sim_attempts: u32,
    /// Simulation: link status as reported by the "driver".
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
    /// Simulation: accepted requests never associate (AP absent, bad password).
    #[cfg(not(target_os = "espidf"))]
    sim_refuse_association: bool,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Idle,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            retry_at: None,
            connect_deadline: None,
            in_flight: 0,
            time_syncs: 0,
            #[cfg(target_os = "espidf")]
            driver: None,
            #[cfg(target_os = "espidf")]
            sntp: None,
            #[cfg(not(target_os = "espidf"))]
            sim_attempts: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_link_up: false,
            #[cfg(not(target_os = "espidf"))]
            sim_refuse_association: false,
        }
    }

    /// Attach the ESP-IDF WiFi driver created in `main`.
    #[cfg(target_os = "espidf")]
    pub fn with_driver(mut self, driver: EspWifi<'static>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Simulation: make accepted connect requests hang without associating.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_refuse_association(&mut self, refuse: bool) {
        self.sim_refuse_association = refuse;
    }

    /// Time sync requests forwarded since boot.
    pub fn time_sync_count(&self) -> u32 {
        self.time_syncs
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), WifiError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| WifiError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| WifiError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Drive the reconnect policy.  Call from the main loop.
    pub fn poll(&mut self, now: Instant) {
        match self.state {
            WifiState::Backoff { attempt } => {
                let due = self.retry_at.is_none_or(|at| now >= at);
                if due {
                    info!("WiFi: reconnect attempt {} (backoff {}s)", attempt, self.backoff_secs);
                    self.attempt(now, attempt);
                }
            }
            WifiState::Connecting => {
                if self.platform_is_connected() {
                    self.on_connected();
                    return;
                }
                match self.connect_deadline {
                    // Requested without a clock: the timeout starts now.
                    None => {
                        self.connect_deadline =
                            Some(now + Duration::from_secs(CONNECT_TIMEOUT_SECS));
                    }
                    Some(deadline) if now >= deadline => {
                        warn!("WiFi: association timed out after {}s", CONNECT_TIMEOUT_SECS);
                        self.platform_disconnect();
                        self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
                        self.schedule_retry(now, self.in_flight + 1);
                    }
                    Some(_) => {}
                }
            }
            WifiState::Connected => {
                if !self.platform_is_connected() {
                    warn!("WiFi: connection lost, entering backoff");
                    self.schedule_retry(now, 0);
                }
            }
            WifiState::Idle => {}
        }
    }

    fn attempt(&mut self, now: Instant, attempt: u32) {
        self.state = WifiState::Connecting;
        self.in_flight = attempt;
        self.connect_deadline = Some(now + Duration::from_secs(CONNECT_TIMEOUT_SECS));
        match self.platform_connect() {
            Ok(()) => {
                if self.platform_is_connected() {
                    self.on_connected();
                }
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
                self.schedule_retry(now, attempt + 1);
            }
        }
    }

    fn on_connected(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_secs = INITIAL_BACKOFF_SECS;
        self.retry_at = None;
        self.connect_deadline = None;
        info!("WiFi: connected (RSSI={:?})", self.platform_rssi());
    }

    fn schedule_retry(&mut self, now: Instant, attempt: u32) {
        self.state = WifiState::Backoff { attempt };
        self.connect_deadline = None;
        self.retry_at = Some(now + Duration::from_secs(u64::from(self.backoff_secs)));
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), WifiError> {
        let driver = self.driver.as_mut().ok_or(WifiError::ConnectionFailed)?;
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        driver
            .set_configuration(&config)
            .map_err(|_| WifiError::ConnectionFailed)?;
        if !driver.is_started().unwrap_or(false) {
            driver.start().map_err(|_| WifiError::ConnectionFailed)?;
        }
        // Non-blocking: association completes later and shows up in poll().
        driver.connect().map_err(|_| WifiError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), WifiError> {
        self.sim_attempts = self.sim_attempts.wrapping_add(1);
        // Every 10th attempt fails to exercise the backoff path.
        if self.sim_attempts % 10 == 3 {
            warn!("WiFi(sim): simulated failure (attempt {})", self.sim_attempts);
            return Err(WifiError::ConnectionFailed);
        }
        if self.sim_refuse_association {
            info!("WiFi(sim): request accepted, no association (attempt {})", self.sim_attempts);
            return Ok(());
        }
        self.sim_link_up = true;
        info!("WiFi(sim): connected to '{}' (attempt {})", self.ssid, self.sim_attempts);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(driver) = self.driver.as_mut() {
            // Disassociate only; the driver (and radio) stay up.
            if let Err(e) = driver.disconnect() {
                warn!("WiFi: disconnect failed: {}", e);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link_up = false;
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|d| d.is_connected().unwrap_or(false))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        // SAFETY: wifi_ap_record_t is plain C data; all-zero is a valid value
        // and the call only writes into it.
        let mut ap_info: esp_idf_svc::sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == esp_idf_svc::sys::ESP_OK).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        if !self.sim_link_up {
            return None;
        }
        // Oscillate around -60 dBm to mimic a real environment.
        let oscillation = ((self.sim_attempts % 12) as i8) - 6;
        Some((-60_i8).saturating_add(oscillation))
    }

    #[cfg(target_os = "espidf")]
    fn platform_time_sync(&mut self) {
        // Dropping the old client stops it; a fresh one starts a new sync.
        self.sntp = None;
        match esp_idf_svc::sntp::EspSntp::new_default() {
            Ok(sntp) => self.sntp = Some(sntp),
            Err(e) => warn!("WiFi: SNTP start failed: {}", e),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_time_sync(&mut self) {
        info!("WiFi(sim): time sync requested");
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) {
        if self.ssid.is_empty() {
            warn!("WiFi: connect requested but {}", WifiError::NoCredentials);
            return;
        }
        if matches!(self.state, WifiState::Connected | WifiState::Connecting) {
            return;
        }
        info!("WiFi: connecting to '{}'", self.ssid);
        self.retry_at = None;
        self.connect_deadline = None;
        self.in_flight = 0;
        self.state = WifiState::Connecting;
        match self.platform_connect() {
            Ok(()) => {
                if self.platform_is_connected() {
                    self.on_connected();
                }
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                // No clock here: the first retry goes out on the next poll.
                self.state = WifiState::Backoff { attempt: 0 };
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Idle;
        self.retry_at = None;
        self.connect_deadline = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn connection_kind(&self) -> ConnectionKind {
        ConnectionKind::Wifi
    }

    fn request_time_sync(&mut self) {
        self.time_syncs = self.time_syncs.wrapping_add(1);
        self.platform_time_sync();
    }
}

// ───────────────────────────────────────────────────────────────
// RadioPort
// ───────────────────────────────────────────────────────────────

impl RadioPort for WifiAdapter {
    fn is_ready(&self, kind: ConnectionKind) -> bool {
        kind == ConnectionKind::Wifi && self.is_connected()
    }

    fn signal_strength(&self) -> f32 {
        self.platform_rssi().map_or(0.0, rssi_to_percent)
    }

    fn network_name(&self) -> Option<NetworkName> {
        if !self.is_connected() {
            return None;
        }
        let mut name = NetworkName::new();
        fill_truncated(&mut name, &self.ssid);
        Some(name)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
