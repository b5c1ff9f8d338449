//! Supervisor service: the hexagonal core.
//!
//! [`Supervisor`] is the one process-wide context object.  It owns the
//! watchdog guard, memory monitor, connectivity tracker, time sync
//! scheduler, action field and vitals snapshot, and is handed the platform
//! ports at every entry point.
//!
//! ```text
//!   check timer ─┐                    ┌──▶ DevicePorts (watchdog, net, clock,
//!   sync timer  ─┼─▶ ┌────────────┐ ──┤     radio, publish, save, system)
//!   name message ┤   │ Supervisor │   │
//!   field write ─┘   └────────────┘ ──┴──▶ EventSink
//! ```
//!
//! Entry points run to completion and never block.  Once a reset has been
//! requested the supervisor halts: every later entry point is inert, the
//! watchdog included.

use embassy_time::{Duration, Instant};
use log::{debug, error, info, warn};

use crate::config::{Capabilities, SupervisorConfig};
use crate::connectivity::{ConnectivityState, ConnectivityTracker, Transition};
use crate::dispatch::{Effect, dispatch};
use crate::error::Result;
use crate::memory::{MemoryMonitor, MemoryStatus};
use crate::settings::{Settings, is_printable_ascii};
use crate::time_sync::TimeSyncScheduler;
use crate::timer::Timer;
use crate::vitals::{ResetReason, StartupStatus, VitalsSnapshot, fill_truncated, format_mac};
use crate::watchdog::WatchdogGuard;

use super::commands::{ActionCommand, DeviceName, SupervisorCommand};
use super::events::SupervisorEvent;
use super::fields::{FieldBinding, FieldId, build_field_table};
use super::ports::{ConnectionKind, DeviceId, DevicePorts, EventSink};

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

pub struct Supervisor {
    config: SupervisorConfig,
    caps: Capabilities,
    fields: [FieldBinding; FieldId::COUNT],

    watchdog: WatchdogGuard,
    memory: MemoryMonitor,
    tracker: ConnectivityTracker,
    time_sync: TimeSyncScheduler,
    check_timer: Timer,

    vitals: VitalsSnapshot,
    device_id: DeviceId,
    name: DeviceName,
    action: ActionCommand,

    startup: StartupStatus,
    pending_name_request: bool,
    /// Set once a reset was requested; nothing runs afterwards.
    halted: Option<ResetReason>,
    tick_count: u64,
}

impl Supervisor {
    /// Construct from configuration and the persisted settings.
    ///
    /// Touches no port; call [`setup`](Self::setup) next.
    pub fn new(config: SupervisorConfig, settings: &Settings) -> Self {
        let caps = config.capabilities();
        let vitals = VitalsSnapshot {
            publish_interval_secs: settings.publish_vitals_secs,
            total_ram_bytes: caps.total_ram_bytes,
            total_flash_bytes: caps.total_flash_bytes,
            total_sectors: caps.total_sectors(),
            ..VitalsSnapshot::default()
        };

        Self {
            memory: MemoryMonitor::new(config.memory_restart_limit_bytes),
            time_sync: TimeSyncScheduler::new(Duration::from_secs(u64::from(
                config.time_sync_interval_secs,
            ))),
            check_timer: Timer::new(Duration::from_millis(u64::from(config.check_interval_ms))),
            config,
            caps,
            fields: build_field_table(),
            watchdog: WatchdogGuard::new(),
            tracker: ConnectivityTracker::new(),
            vitals,
            device_id: DeviceId::new(),
            name: settings.name.clone(),
            action: ActionCommand::None,
            startup: StartupStatus::Pending,
            pending_name_request: true,
            halted: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Arm the watchdog, read identity, request the first connection and
    /// start both timers.  Runs once; later calls are ignored.
    pub fn setup(&mut self, now: Instant, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        if self.startup == StartupStatus::Complete || self.halted.is_some() {
            warn!("Supervisor: setup called twice, ignored");
            return;
        }

        self.watchdog.configure(hw, self.config.watchdog_timeout_ms);

        self.device_id = hw.device_id();
        if self.caps.wifi {
            if let Some(mac) = hw.mac_address() {
                self.vitals.mac = format_mac(&mac);
            }
        }
        let reason = hw.last_reset_reason();
        self.vitals.reset_reason = reason;
        if reason.is_fault() {
            warn!("Supervisor: recovered from fault reset ({})", reason);
        }

        hw.set_vitals_interval(self.vitals.publish_interval_secs);
        hw.connect();

        self.check_timer.start(now);
        self.time_sync.start(now);
        self.startup = StartupStatus::Complete;

        info!(
            "Supervisor: {} v{} id={} started (reset reason: {})",
            self.config.device_type, self.config.device_version, self.device_id, reason
        );
        sink.emit(&SupervisorEvent::Started {
            reset_reason: reason,
        });
    }

    /// Fire whichever timers are due.  The sync timer is serviced first so a
    /// resync it raises can go out on the same tick.  Returns `true` when
    /// the check tick ran.
    pub fn poll(
        &mut self,
        now: Instant,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.halted.is_some() {
            return false;
        }
        if self.time_sync.poll_timer(now) {
            self.on_sync_timer(sink);
        }
        if self.check_timer.poll(now) {
            self.tick(now, hw, sink);
            true
        } else {
            false
        }
    }

    /// Slow sync timer handler: mark a resync as pending.
    pub fn on_sync_timer(&mut self, sink: &mut impl EventSink) {
        if self.halted.is_some() {
            return;
        }
        debug!("Supervisor: sync interval elapsed");
        self.time_sync.on_timer();
        sink.emit(&SupervisorEvent::ResyncPending);
    }

    /// One orchestrator tick.
    ///
    /// Fixed order:
    /// 1. watchdog refresh
    /// 2. memory sample (may reset and halt here)
    /// 3. connectivity probe
    /// 4. radio sample
    /// 5. resync and clock advance
    /// 6. one-shot name request
    /// 7. reschedule
    pub fn tick(&mut self, now: Instant, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        self.run_tick(now, hw, sink);
    }

    fn run_tick(&mut self, now: Instant, hw: &mut dyn DevicePorts, sink: &mut dyn EventSink) {
        if self.halted.is_some() {
            return;
        }
        self.tick_count = self.tick_count.wrapping_add(1);

        // 1. Liveness first, never skipped by an early return below.
        self.watchdog.refresh(hw);

        // 2. Memory floor.
        match self.memory.sample(hw.free_memory()) {
            MemoryStatus::Exhausted(free) => {
                sink.emit(&SupervisorEvent::MemoryExhausted {
                    free_bytes: free,
                    limit_bytes: self.memory.limit_bytes(),
                });
                self.request_reset(ResetReason::OutOfMemory, hw, sink);
                return;
            }
            MemoryStatus::Changed(free) => self.vitals.free_memory_bytes = free,
            MemoryStatus::Unchanged => {}
        }

        // 3. Connectivity.
        let probe = hw.is_connected();
        if let Some(t) = self.tracker.observe(probe) {
            emit_transition(sink, t);
        }

        // 4. Radio.
        self.sample_radio(hw);

        // 5. Time.
        if self.time_sync.evaluate(self.tracker.is_connected(), now, hw) {
            sink.emit(&SupervisorEvent::TimeResynced);
        }
        if let Some(formatted) = self.time_sync.observe_clock(&*hw) {
            self.vitals.last_synced_time = formatted;
        }

        // 6. Name announce.
        if self.pending_name_request && self.tracker.is_connected() {
            info!("Supervisor: requesting device name");
            hw.publish_event(&self.config.name_topic, "");
            self.pending_name_request = false;
            sink.emit(&SupervisorEvent::NameRequested);
        }

        // 7. Reschedule.
        self.check_timer.start(now);
    }

    fn sample_radio(&mut self, hw: &mut dyn DevicePorts) {
        let kind = hw.connection_kind();
        let supported = match kind {
            ConnectionKind::Wifi => self.caps.wifi,
            ConnectionKind::Cellular => self.caps.cellular,
            ConnectionKind::None => false,
        };
        if !supported || !hw.is_ready(kind) {
            return;
        }

        let strength = hw.signal_strength().round().clamp(0.0, 100.0) as u8;
        if strength != self.vitals.signal_strength {
            self.vitals.signal_strength = strength;
        }
        if let Some(network) = hw.network_name() {
            if network != self.vitals.network_name {
                info!("Supervisor: network '{}'", network);
                self.vitals.network_name = network;
            }
        }
    }

    // ── Commands ──────────────────────────────────────────────

    /// Apply one mailbox command.
    pub fn handle_command(
        &mut self,
        cmd: SupervisorCommand,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            SupervisorCommand::SetAction(action) => self.set_action(action, hw, sink),
            SupervisorCommand::NameMessage { topic, payload } => {
                self.on_name_message(&topic, &payload, hw, sink);
            }
            SupervisorCommand::SetPublishVitalsSecs(secs) => {
                self.set_publish_vitals_secs(secs, hw, sink);
            }
        }
    }

    /// Write the action field and dispatch it synchronously.
    pub fn set_action(
        &mut self,
        action: ActionCommand,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        if self.halted.is_some() {
            return;
        }
        self.action = action;
        self.field_changed(FieldId::Action, hw, sink);
    }

    /// Write the periodic vitals interval (seconds, 0 = off).
    pub fn set_publish_vitals_secs(
        &mut self,
        secs: u32,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        if self.halted.is_some() {
            return;
        }
        self.vitals.publish_interval_secs = secs;
        self.field_changed(FieldId::PublishVitalsSecs, hw, sink);
    }

    /// Inbound name announcement.  Only a changed name is stored and saved.
    pub fn on_name_message(
        &mut self,
        topic: &str,
        payload: &str,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        if self.halted.is_some() {
            return;
        }
        if !topic.starts_with(self.config.name_topic.as_str()) {
            debug!("Supervisor: ignoring message on '{}'", topic);
            return;
        }
        // Compare what would be stored, not the raw payload.
        let mut name = DeviceName::new();
        let truncated = fill_truncated(&mut name, payload);
        if name == self.name {
            return;
        }
        // Same rule the settings store enforces on save.
        if !is_printable_ascii(&name) {
            warn!("Supervisor: rejecting non-printable device name");
            return;
        }
        if truncated {
            warn!("Supervisor: device name truncated to {} bytes", name.len());
        }
        self.name = name;
        self.field_changed(FieldId::Name, hw, sink);
    }

    /// Write a field by its wire name, e.g. from a console or cloud function.
    pub fn write_field(
        &mut self,
        field: &str,
        value: &str,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let cmd = SupervisorCommand::field_write(field, value)?;
        self.handle_command(cmd, hw, sink);
        Ok(())
    }

    /// Drop a no-op command left in the action field.
    pub fn clear_action(&mut self) {
        self.action = ActionCommand::None;
    }

    /// Re-arm the one-shot name request; it goes out on the next connected tick.
    pub fn request_name_refresh(&mut self) {
        self.pending_name_request = true;
    }

    // ── Field change handlers (called through the field table) ──

    fn field_changed(&mut self, id: FieldId, hw: &mut dyn DevicePorts, sink: &mut dyn EventSink) {
        let on_change = self.fields[id as usize].on_change;
        on_change(self, hw, sink);
    }

    pub(super) fn apply_action(&mut self, hw: &mut dyn DevicePorts, sink: &mut dyn EventSink) {
        let action = self.action;
        let d = dispatch(self.tracker.state(), action);

        match d.effect {
            Effect::Reset(reason) => {
                info!("Supervisor: action '{}'", action);
                sink.emit(&SupervisorEvent::ActionApplied(action));
                self.request_reset(reason, hw, sink);
                return;
            }
            Effect::DropLink => {
                if let Some(t) = self.tracker.disconnect(hw) {
                    emit_transition(sink, t);
                }
            }
            Effect::OpenLink => {
                if let Some(t) = self.tracker.reconnect(hw) {
                    emit_transition(sink, t);
                }
            }
            Effect::RequestResync => {
                self.time_sync.request();
                sink.emit(&SupervisorEvent::ResyncPending);
            }
            Effect::PublishVitals => {
                hw.publish_vitals(&self.vitals);
                sink.emit(&SupervisorEvent::VitalsPublished);
            }
            Effect::None => {}
        }
        debug_assert_eq!(self.tracker.state(), d.next_state);

        match (d.effect, action) {
            (_, ActionCommand::None) => {}
            (Effect::None, _) => {
                info!(
                    "Supervisor: action '{}' ignored in state {:?}",
                    action,
                    self.tracker.state()
                );
                sink.emit(&SupervisorEvent::ActionIgnored(action));
            }
            _ => {
                info!("Supervisor: action '{}'", action);
                sink.emit(&SupervisorEvent::ActionApplied(action));
            }
        }

        if d.clear {
            self.action = ActionCommand::None;
        }
    }

    pub(super) fn apply_publish_interval(
        &mut self,
        hw: &mut dyn DevicePorts,
        sink: &mut dyn EventSink,
    ) {
        let secs = self.vitals.publish_interval_secs;
        info!("Supervisor: vitals interval {} s", secs);
        hw.set_vitals_interval(secs);
        hw.request_save();
        sink.emit(&SupervisorEvent::VitalsIntervalChanged(secs));
    }

    pub(super) fn persist_name(&mut self, hw: &mut dyn DevicePorts, sink: &mut dyn EventSink) {
        info!("Supervisor: device name is now '{}'", self.name);
        hw.request_save();
        sink.emit(&SupervisorEvent::NameUpdated);
    }

    // ── Internal ──────────────────────────────────────────────

    /// Record the reason, halt, then hand control to the platform.  The
    /// reset call is always the last effect of the entry point.
    fn request_reset(
        &mut self,
        reason: ResetReason,
        hw: &mut dyn DevicePorts,
        sink: &mut dyn EventSink,
    ) {
        error!("Supervisor: resetting ({})", reason);
        sink.emit(&SupervisorEvent::ResetRequested(reason));
        self.halted = Some(reason);
        hw.reset(reason);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConnectivityState {
        self.tracker.state()
    }

    pub fn action(&self) -> ActionCommand {
        self.action
    }

    pub fn vitals(&self) -> &VitalsSnapshot {
        &self.vitals
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn startup(&self) -> StartupStatus {
        self.startup
    }

    pub fn resync_pending(&self) -> bool {
        self.time_sync.is_pending()
    }

    pub fn name_request_pending(&self) -> bool {
        self.pending_name_request
    }

    /// Reason of the reset this supervisor requested, if any.
    pub fn halted(&self) -> Option<ResetReason> {
        self.halted
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn watchdog_refreshes(&self) -> u64 {
        self.watchdog.refresh_count()
    }

    /// Current values of the persisted settings.
    pub fn settings(&self) -> Settings {
        Settings {
            name: self.name.clone(),
            publish_vitals_secs: self.vitals.publish_interval_secs,
        }
    }
}

fn emit_transition(sink: &mut dyn EventSink, t: Transition) {
    sink.emit(&SupervisorEvent::ConnectivityChanged {
        from: t.from,
        to: t.to,
    });
}
