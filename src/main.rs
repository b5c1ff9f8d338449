//! Nodewarden firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter     SystemAdapter   SystemClock   TaskWatchdog    │
//! │  (Connectivity,  (System)        (Clock)       (Watchdog)      │
//! │   Radio)         LogPublisher    LogEventSink  NvsAdapter      │
//! │                  (Publish)       (EventSink)   (Storage)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Supervisor (pure logic)                   │    │
//! │  │  Tracker · Dispatch · Memory guard · Time sync         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  COMMANDS mailbox (console task → supervisor)                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The console task reads lines from the UART console and posts them as
//! [`SupervisorCommand`]s, e.g. `action=syncTime`, `publishVitalsSEC=600`
//! or `device/name greenhouse-3`.
#![deny(unused_must_use)]

use std::io::BufRead;
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use nodewarden::adapters::log_sink::LogEventSink;
use nodewarden::adapters::nvs::NvsAdapter;
use nodewarden::adapters::platform::Platform;
use nodewarden::adapters::system::SystemAdapter;
use nodewarden::adapters::wifi::WifiAdapter;
use nodewarden::app::commands::SupervisorCommand;
use nodewarden::app::service::Supervisor;
use nodewarden::config::{PlatformProfile, SupervisorConfig};
use nodewarden::mailbox::COMMANDS;
use nodewarden::settings::{Settings, SettingsStore};

/// Main loop pacing.  The supervisor's own timers decide when work is due.
const LOOP_SLEEP_MS: u64 = 10;

const CONSOLE_STACK_BYTES: usize = 4096;
/// Back-off while the console has nothing to read.
const CONSOLE_IDLE_MS: u64 = 50;

/// Console reader: one command per line into the supervisor mailbox.
fn spawn_console() -> Result<()> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(CONSOLE_STACK_BYTES)
        .spawn(|| {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) | Err(_) => {
                        std::thread::sleep(Duration::from_millis(CONSOLE_IDLE_MS));
                        continue;
                    }
                    Ok(_) => {}
                }
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                match text.parse::<SupervisorCommand>() {
                    Ok(cmd) => {
                        if COMMANDS.post(cmd) {
                            info!("Console: queued '{}'", text);
                        }
                    }
                    Err(e) => warn!("Console: '{}' rejected: {}", text, e),
                }
            }
        })?;
    Ok(())
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Nodewarden v{}", env!("CARGO_PKG_VERSION"));

    let config = SupervisorConfig {
        platform: PlatformProfile::WifiExtended,
        ..SupervisorConfig::default()
    };
    config.validate()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let partition = EspDefaultNvsPartition::take()?;

    // ── 2. Persisted settings ─────────────────────────────────
    let mut store = SettingsStore::new(NvsAdapter::new(partition.clone()));
    let defaults = Settings::with_publish_interval(config.default_publish_vitals_secs);
    let settings = match store.load(defaults.clone()) {
        Ok(s) => s,
        Err(e) => {
            warn!("Settings load failed ({}), using defaults", e);
            defaults
        }
    };

    // ── 3. Adapters ───────────────────────────────────────────
    let driver = EspWifi::new(peripherals.modem, sysloop, Some(partition.clone()))?;
    let mut wifi = WifiAdapter::new().with_driver(driver);
    match (option_env!("NODEWARDEN_SSID"), option_env!("NODEWARDEN_PASSWORD")) {
        (Some(ssid), Some(password)) => {
            if let Err(e) = wifi.set_credentials(ssid, password) {
                warn!("WiFi: build-time credentials rejected: {}", e);
            }
        }
        _ => warn!("WiFi: no credentials compiled in, link stays down"),
    }

    let system = SystemAdapter::new(NvsAdapter::new(partition));
    let mut platform = Platform::new(wifi, system);
    let mut sink = LogEventSink::new();

    // ── 4. Supervisor ─────────────────────────────────────────
    let mut sup = Supervisor::new(config, &settings);
    sup.setup(platform.uptime(), &mut platform, &mut sink);

    spawn_console()?;
    info!("System ready. Entering supervisor loop.");

    // ── 5. Loop ───────────────────────────────────────────────
    loop {
        let now = platform.uptime();

        COMMANDS.drain(|cmd| sup.handle_command(cmd, &mut platform, &mut sink));
        sup.poll(now, &mut platform, &mut sink);
        platform.service(now, sup.vitals());

        if platform.take_save_request() {
            if let Err(e) = store.save(&sup.settings()) {
                error!("Settings save failed: {}", e);
            }
        }

        std::thread::sleep(Duration::from_millis(LOOP_SLEEP_MS));
    }
}
