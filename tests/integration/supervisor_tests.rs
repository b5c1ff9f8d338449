//! Integration tests for the Supervisor → ports pipeline.
//!
//! These run on the host (x86_64) and check the ordering and at-most-once
//! guarantees of every entry point against the recorded call log.

use embassy_time::Instant;

use nodewarden::app::commands::{ActionCommand, SupervisorCommand};
use nodewarden::app::events::SupervisorEvent;
use nodewarden::app::service::Supervisor;
use nodewarden::config::{PlatformProfile, SupervisorConfig};
use nodewarden::connectivity::ConnectivityState;
use nodewarden::mailbox::Mailbox;
use nodewarden::settings::Settings;
use nodewarden::vitals::{ResetReason, StartupStatus};

use crate::mock_ports::{Call, EventLog, MockPorts};

fn ms(v: u64) -> Instant {
    Instant::from_millis(v)
}

fn make_supervisor() -> (Supervisor, MockPorts, EventLog) {
    let mut sup = Supervisor::new(
        SupervisorConfig::default(),
        &Settings::with_publish_interval(21_600),
    );
    let mut hw = MockPorts::new();
    let mut sink = EventLog::new();
    sup.setup(ms(0), &mut hw, &mut sink);
    hw.clear();
    sink.events.clear();
    (sup, hw, sink)
}

/// Supervisor ticked once with the link up, call log cleared.
fn connected_supervisor() -> (Supervisor, MockPorts, EventLog) {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    hw.connected = true;
    sup.tick(ms(100), &mut hw, &mut sink);
    assert_eq!(sup.state(), ConnectivityState::Connected);
    hw.clear();
    sink.events.clear();
    (sup, hw, sink)
}

// ── Setup ─────────────────────────────────────────────────────

#[test]
fn setup_arms_watchdog_before_anything_else() {
    let mut sup = Supervisor::new(
        SupervisorConfig::default(),
        &Settings::with_publish_interval(300),
    );
    let mut hw = MockPorts::new();
    hw.boot_reason = ResetReason::Panic;
    let mut sink = EventLog::new();

    sup.setup(ms(0), &mut hw, &mut sink);

    assert_eq!(
        hw.calls,
        vec![Call::Configure(60_000), Call::SetInterval(300), Call::Connect]
    );
    assert_eq!(sup.startup(), StartupStatus::Complete);
    assert_eq!(sup.device_id(), "NW-TEST01");
    assert_eq!(sup.vitals().mac.as_str(), "24:0a:c4:12:34:56");
    assert_eq!(sup.vitals().reset_reason, ResetReason::Panic);
    assert_eq!(
        sink.events,
        vec![SupervisorEvent::Started {
            reset_reason: ResetReason::Panic
        }]
    );
}

#[test]
fn second_setup_is_ignored() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.setup(ms(10), &mut hw, &mut sink);
    assert!(hw.calls.is_empty());
    assert!(sink.events.is_empty());
}

#[test]
fn cellular_only_module_reports_no_mac() {
    let config = SupervisorConfig {
        platform: PlatformProfile::CellularCompact,
        ..SupervisorConfig::default()
    };
    let mut sup = Supervisor::new(config, &Settings::with_publish_interval(0));
    let mut hw = MockPorts::new();
    let mut sink = EventLog::new();
    sup.setup(ms(0), &mut hw, &mut sink);

    assert!(sup.vitals().mac.is_empty());
    assert_eq!(sup.vitals().total_ram_bytes, 80 * 1024);
    assert_eq!(sup.vitals().total_sectors, 512);
}

// ── Tick ordering ─────────────────────────────────────────────

#[test]
fn refresh_is_first_and_happens_once_per_tick() {
    let (mut sup, mut hw, mut sink) = make_supervisor();

    for i in 1..=5u64 {
        hw.connected = i % 2 == 0;
        hw.clear();
        sup.tick(ms(i * 100), &mut hw, &mut sink);
        assert_eq!(hw.calls.first(), Some(&Call::Refresh));
        assert_eq!(hw.count(&Call::Refresh), 1);
    }
    assert_eq!(sup.watchdog_refreshes(), 5);
    assert_eq!(sup.tick_count(), 5);
}

#[test]
fn memory_exhaustion_resets_as_last_effect() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    hw.connected = true;
    hw.free_bytes = 1_000;

    sup.tick(ms(100), &mut hw, &mut sink);

    assert_eq!(
        hw.calls,
        vec![Call::Refresh, Call::Reset(ResetReason::OutOfMemory)]
    );
    // The probe never ran.
    assert_eq!(sup.state(), ConnectivityState::Connecting);
    assert_eq!(sup.halted(), Some(ResetReason::OutOfMemory));
    assert_eq!(
        sink.events,
        vec![
            SupervisorEvent::MemoryExhausted {
                free_bytes: 1_000,
                limit_bytes: 5_120
            },
            SupervisorEvent::ResetRequested(ResetReason::OutOfMemory),
        ]
    );

    hw.clear();
    sup.tick(ms(200), &mut hw, &mut sink);
    sup.set_action(ActionCommand::SendVitals, &mut hw, &mut sink);
    assert!(hw.calls.is_empty());
}

#[test]
fn memory_reading_at_floor_is_not_exhausted() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    hw.free_bytes = 5_120;
    sup.tick(ms(100), &mut hw, &mut sink);
    assert_eq!(sup.halted(), None);
    assert_eq!(sup.vitals().free_memory_bytes, 5_120);
}

#[test]
fn radio_sample_rounds_and_clamps() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    hw.signal = 72.6;
    sup.tick(ms(100), &mut hw, &mut sink);
    assert_eq!(sup.vitals().signal_strength, 73);
    assert_eq!(sup.vitals().network_name.as_str(), "Workshop");

    hw.signal = 140.0;
    sup.tick(ms(200), &mut hw, &mut sink);
    assert_eq!(sup.vitals().signal_strength, 100);
}

#[test]
fn radio_without_capability_is_not_sampled() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    // The host profile has no cellular modem.
    hw.kind = nodewarden::app::ports::ConnectionKind::Cellular;
    sup.tick(ms(100), &mut hw, &mut sink);
    assert_eq!(sup.vitals().signal_strength, 0);
    assert!(sup.vitals().network_name.is_empty());
}

#[test]
fn clock_advance_updates_last_synced_time() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.tick(ms(100), &mut hw, &mut sink);
    assert!(sup.vitals().last_synced_time.is_empty());

    hw.clock = 1_700_000_000;
    sup.tick(ms(200), &mut hw, &mut sink);
    assert_eq!(sup.vitals().last_synced_time.as_str(), "t1700000000");

    hw.clock = 1_699_999_000;
    sup.tick(ms(300), &mut hw, &mut sink);
    assert_eq!(sup.vitals().last_synced_time.as_str(), "t1700000000");
}

#[test]
fn poll_runs_tick_only_when_check_timer_elapsed() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    assert!(!sup.poll(ms(50), &mut hw, &mut sink));
    assert!(hw.calls.is_empty());
    assert!(sup.poll(ms(100), &mut hw, &mut sink));
    assert_eq!(hw.count(&Call::Refresh), 1);
    // Re-armed from the tick.
    assert!(!sup.poll(ms(150), &mut hw, &mut sink));
    assert!(sup.poll(ms(200), &mut hw, &mut sink));
}

// ── Connectivity ──────────────────────────────────────────────

#[test]
fn disconnected_ignores_positive_probe() {
    let (mut sup, mut hw, mut sink) = connected_supervisor();

    sup.set_action(ActionCommand::Disconnect, &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![Call::Disconnect]);
    assert_eq!(sup.state(), ConnectivityState::Disconnected);

    for i in 2..6u64 {
        sup.tick(ms(i * 100), &mut hw, &mut sink);
    }
    assert_eq!(sup.state(), ConnectivityState::Disconnected);
    assert_eq!(hw.count(&Call::Connect), 0);
}

#[test]
fn probe_loss_moves_back_to_connecting() {
    let (mut sup, mut hw, mut sink) = connected_supervisor();
    hw.connected = false;
    sup.tick(ms(200), &mut hw, &mut sink);
    assert_eq!(sup.state(), ConnectivityState::Connecting);
    assert!(sink.contains(&SupervisorEvent::ConnectivityChanged {
        from: ConnectivityState::Connected,
        to: ConnectivityState::Connecting,
    }));
}

#[test]
fn reconnect_while_connected_is_dropped() {
    let (mut sup, mut hw, mut sink) = connected_supervisor();

    sup.set_action(ActionCommand::Reconnect, &mut hw, &mut sink);

    assert_eq!(hw.count(&Call::Connect), 0);
    assert_eq!(sup.action(), ActionCommand::None);
    assert_eq!(sup.state(), ConnectivityState::Connected);
    assert_eq!(
        sink.events,
        vec![SupervisorEvent::ActionIgnored(ActionCommand::Reconnect)]
    );
}

#[test]
fn disconnect_then_reconnect_connects_once() {
    let (mut sup, mut hw, mut sink) = connected_supervisor();
    sup.set_action(ActionCommand::Disconnect, &mut hw, &mut sink);
    sup.set_action(ActionCommand::Disconnect, &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::Disconnect), 1);

    sup.set_action(ActionCommand::Reconnect, &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::Connect), 1);
    assert_eq!(sup.state(), ConnectivityState::Connecting);

    sup.set_action(ActionCommand::Reconnect, &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::Connect), 1);

    sup.tick(ms(200), &mut hw, &mut sink);
    assert_eq!(sup.state(), ConnectivityState::Connected);
}

// ── Time sync ─────────────────────────────────────────────────

#[test]
fn sync_time_while_offline_is_deferred_until_connected() {
    let (mut sup, mut hw, mut sink) = make_supervisor();

    sup.set_action(ActionCommand::SyncTime, &mut hw, &mut sink);
    assert!(sup.resync_pending());
    assert_eq!(sup.action(), ActionCommand::None);

    sup.tick(ms(100), &mut hw, &mut sink);
    sup.tick(ms(200), &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::TimeSync), 0);

    hw.connected = true;
    sup.tick(ms(300), &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::TimeSync), 1);
    assert!(!sup.resync_pending());
    assert!(sink.contains(&SupervisorEvent::TimeResynced));

    sup.tick(ms(400), &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::TimeSync), 1);
}

#[test]
fn sync_timer_raises_pending_resync() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    let six_hours = 6 * 60 * 60 * 1_000;

    sup.poll(ms(six_hours), &mut hw, &mut sink);
    assert!(sink.contains(&SupervisorEvent::ResyncPending));
    // The same poll ran the check tick, but the link is still down.
    assert!(sup.resync_pending());
    assert_eq!(hw.count(&Call::TimeSync), 0);
}

// ── Name ──────────────────────────────────────────────────────

#[test]
fn name_is_requested_once_on_first_connection() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.tick(ms(100), &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::PublishEvent("device/name".into())), 0);

    hw.connected = true;
    sup.tick(ms(200), &mut hw, &mut sink);
    sup.tick(ms(300), &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::PublishEvent("device/name".into())), 1);
    assert!(!sup.name_request_pending());

    sup.request_name_refresh();
    sup.tick(ms(400), &mut hw, &mut sink);
    assert_eq!(hw.count(&Call::PublishEvent("device/name".into())), 2);
}

#[test]
fn changed_name_saves_once_and_repeat_is_noop() {
    let mut settings = Settings::with_publish_interval(60);
    let _ = settings.name.push_str("device-1");
    let mut sup = Supervisor::new(SupervisorConfig::default(), &settings);
    let mut hw = MockPorts::new();
    let mut sink = EventLog::new();
    sup.setup(ms(0), &mut hw, &mut sink);
    hw.clear();

    sup.on_name_message("device/name/NW-TEST01", "device-42", &mut hw, &mut sink);
    assert_eq!(sup.name(), "device-42");
    assert_eq!(hw.saves(), 1);

    sup.on_name_message("device/name/NW-TEST01", "device-42", &mut hw, &mut sink);
    assert_eq!(hw.saves(), 1);
    assert_eq!(sup.settings().name.as_str(), "device-42");
}

#[test]
fn name_on_foreign_topic_is_ignored() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.on_name_message("device/other", "intruder", &mut hw, &mut sink);
    assert_eq!(sup.name(), "");
    assert_eq!(hw.saves(), 0);
}

#[test]
fn oversized_name_is_truncated() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    let long = "n".repeat(100);
    sup.on_name_message("device/name", &long, &mut hw, &mut sink);
    assert_eq!(sup.name().len(), 64);
    assert_eq!(hw.saves(), 1);
}

#[test]
fn repeated_oversized_name_saves_once() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    let long = "n".repeat(100);
    for _ in 0..3 {
        sup.on_name_message("device/name", &long, &mut hw, &mut sink);
    }
    assert_eq!(sup.name().len(), 64);
    assert_eq!(hw.saves(), 1);
}

#[test]
fn non_ascii_name_is_ignored() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.on_name_message("device/name", "greenhouse-3", &mut hw, &mut sink);
    hw.clear();

    sup.on_name_message("device/name", "café", &mut hw, &mut sink);
    sup.on_name_message("device/name", "line\nbreak", &mut hw, &mut sink);
    assert_eq!(sup.name(), "greenhouse-3");
    assert!(hw.calls.is_empty());
}

// ── Actions ───────────────────────────────────────────────────

#[test]
fn restart_resets_with_nothing_after() {
    let (mut sup, mut hw, mut sink) = connected_supervisor();

    sup.set_action(ActionCommand::Restart, &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![Call::Reset(ResetReason::UserRestart)]);
    assert_eq!(
        sink.events.last(),
        Some(&SupervisorEvent::ResetRequested(ResetReason::UserRestart))
    );

    sup.tick(ms(200), &mut hw, &mut sink);
    sup.on_name_message("device/name", "late", &mut hw, &mut sink);
    assert_eq!(hw.last_call(), Some(&Call::Reset(ResetReason::UserRestart)));
    assert_eq!(hw.calls.len(), 1);
}

#[test]
fn reset_action_records_user_reset() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.set_action(ActionCommand::Reset, &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![Call::Reset(ResetReason::UserReset)]);
    assert_eq!(sup.halted(), Some(ResetReason::UserReset));
}

#[test]
fn none_action_is_idempotent() {
    let (mut sup, mut hw, mut sink) = connected_supervisor();
    sup.set_action(ActionCommand::None, &mut hw, &mut sink);
    sup.set_action(ActionCommand::None, &mut hw, &mut sink);
    assert!(hw.calls.is_empty());
    assert!(sink.events.is_empty());
    assert_eq!(sup.action(), ActionCommand::None);
}

#[test]
fn send_vitals_publishes_and_clears() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.set_action(ActionCommand::SendVitals, &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![Call::PublishVitals]);
    assert_eq!(sup.action(), ActionCommand::None);
    assert!(sink.contains(&SupervisorEvent::VitalsPublished));
}

#[test]
fn unrecognized_code_reads_back_and_does_nothing() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.set_action(ActionCommand::from_code(42), &mut hw, &mut sink);
    assert!(hw.calls.is_empty());
    assert_eq!(sup.action(), ActionCommand::Unrecognized(42));
}

// ── Fields ────────────────────────────────────────────────────

#[test]
fn publish_interval_change_reaches_channel_and_saves() {
    let (mut sup, mut hw, mut sink) = make_supervisor();
    sup.set_publish_vitals_secs(300, &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![Call::SetInterval(300), Call::Save]);
    assert_eq!(sup.vitals().publish_interval_secs, 300);
    assert_eq!(sup.settings().publish_vitals_secs, 300);
}

#[test]
fn write_field_by_wire_name() {
    let (mut sup, mut hw, mut sink) = connected_supervisor();

    sup.write_field("action", "3", &mut hw, &mut sink).unwrap();
    assert_eq!(sup.state(), ConnectivityState::Disconnected);

    sup.write_field("action", "reconnect", &mut hw, &mut sink)
        .unwrap();
    assert_eq!(sup.state(), ConnectivityState::Connecting);

    sup.write_field("publishVitalsSEC", "0", &mut hw, &mut sink)
        .unwrap();
    assert_eq!(sup.vitals().publish_interval_secs, 0);

    assert!(sup.write_field("action", "explode", &mut hw, &mut sink).is_err());
    assert!(sup.write_field("publishVitalsSEC", "-1", &mut hw, &mut sink).is_err());
    assert!(sup.write_field("name", "x", &mut hw, &mut sink).is_err());
    assert!(sup.write_field("colour", "red", &mut hw, &mut sink).is_err());
}

// ── Mailbox ───────────────────────────────────────────────────

#[test]
fn mailbox_commands_apply_in_order() {
    let (mut sup, mut hw, mut sink) = connected_supervisor();
    let mailbox: Mailbox<4> = Mailbox::new();

    assert!(mailbox.post(SupervisorCommand::SetAction(ActionCommand::Disconnect)));
    assert!(mailbox.post(SupervisorCommand::SetPublishVitalsSecs(120)));
    assert!(mailbox.post(SupervisorCommand::name_message("device/name", "lab-7")));

    let n = mailbox.drain(|cmd| sup.handle_command(cmd, &mut hw, &mut sink));

    assert_eq!(n, 3);
    assert_eq!(
        hw.calls,
        vec![
            Call::Disconnect,
            Call::SetInterval(120),
            Call::Save,
            Call::Save,
        ]
    );
    assert_eq!(sup.name(), "lab-7");
}
