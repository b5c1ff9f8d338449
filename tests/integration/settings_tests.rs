//! Integration tests for settings persistence driven by the supervisor's
//! save requests.

use embassy_time::Instant;

use nodewarden::app::service::Supervisor;
use nodewarden::config::SupervisorConfig;
use nodewarden::error::{ConfigError, Error};
use nodewarden::settings::{Settings, SettingsStore};

use crate::mock_ports::{EventLog, MemStorage, MockPorts};

#[test]
fn defaults_when_nothing_stored() {
    let store = SettingsStore::new(MemStorage::default());
    let s = store.load(Settings::with_publish_interval(900)).unwrap();
    assert_eq!(s.publish_vitals_secs, 900);
    assert!(s.name.is_empty());
}

#[test]
fn supervisor_changes_survive_a_reboot() {
    let mut store = SettingsStore::new(MemStorage::default());
    let defaults = Settings::with_publish_interval(21_600);

    let mut sup = Supervisor::new(SupervisorConfig::default(), &store.load(defaults.clone()).unwrap());
    let mut hw = MockPorts::new();
    let mut sink = EventLog::new();
    sup.setup(Instant::from_millis(0), &mut hw, &mut sink);

    sup.set_publish_vitals_secs(600, &mut hw, &mut sink);
    sup.on_name_message("device/name", "greenhouse-3", &mut hw, &mut sink);
    for _ in 0..hw.saves() {
        store.save(&sup.settings()).unwrap();
    }

    // Next boot.
    let reloaded = store.load(defaults).unwrap();
    let sup = Supervisor::new(SupervisorConfig::default(), &reloaded);
    assert_eq!(sup.name(), "greenhouse-3");
    assert_eq!(sup.vitals().publish_interval_secs, 600);
}

#[test]
fn rejected_name_leaves_interval_saves_working() {
    let mut store = SettingsStore::new(MemStorage::default());
    let defaults = Settings::with_publish_interval(21_600);

    let mut sup = Supervisor::new(SupervisorConfig::default(), &defaults);
    let mut hw = MockPorts::new();
    let mut sink = EventLog::new();
    sup.setup(Instant::from_millis(0), &mut hw, &mut sink);
    hw.clear();

    sup.on_name_message("device/name", "café", &mut hw, &mut sink);
    assert_eq!(hw.saves(), 0);

    sup.set_publish_vitals_secs(600, &mut hw, &mut sink);
    assert_eq!(hw.saves(), 1);
    store.save(&sup.settings()).unwrap();

    let reloaded = store.load(defaults).unwrap();
    assert_eq!(reloaded.publish_vitals_secs, 600);
    assert!(reloaded.name.is_empty());
}

#[test]
fn corrupted_blob_is_reported() {
    let mut storage = MemStorage::default();
    storage.data.insert(
        ("nodewarden".to_owned(), "settings".to_owned()),
        vec![0xFF; 12],
    );
    let store = SettingsStore::new(storage);
    assert_eq!(
        store.load(Settings::with_publish_interval(60)),
        Err(Error::Config(ConfigError::Corrupted))
    );
}

#[test]
fn non_printable_name_is_not_saved() {
    let mut store = SettingsStore::new(MemStorage::default());
    let mut s = Settings::with_publish_interval(60);
    let _ = s.name.push_str("bad\u{7}name");
    assert!(store.save(&s).is_err());
    assert_eq!(store.storage().writes, 0);
}
