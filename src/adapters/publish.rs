//! Log-backed publish channel.
//!
//! Implements [`PublishPort`] by rendering vitals as JSON (`serde_json`)
//! and writing them, together with named events, to the serial log.  A
//! cloud transport would implement the same trait.
//!
//! Periodic publishing lives here, not in the supervisor: the interval set
//! through [`PublishPort::set_vitals_interval`] arms a one-shot [`Timer`]
//! that [`LogPublisher::poll`] fires and re-arms.

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::app::ports::PublishPort;
use crate::timer::Timer;
use crate::vitals::VitalsSnapshot;

pub struct LogPublisher {
    /// `None` when periodic publishing is off.
    periodic: Option<Timer>,
    vitals_sent: u32,
    events_sent: u32,
}

impl Default for LogPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl LogPublisher {
    pub fn new() -> Self {
        Self {
            periodic: None,
            vitals_sent: 0,
            events_sent: 0,
        }
    }

    /// Publish `vitals` if the periodic interval elapsed.  Returns `true`
    /// when it did.
    pub fn poll(&mut self, now: Instant, vitals: &VitalsSnapshot) -> bool {
        let Some(timer) = self.periodic.as_mut() else {
            return false;
        };
        if !timer.is_running() {
            // First poll after the interval changed.
            timer.start(now);
            return false;
        }
        if !timer.poll(now) {
            return false;
        }
        timer.start(now);
        self.publish_vitals(vitals);
        true
    }

    pub fn vitals_sent(&self) -> u32 {
        self.vitals_sent
    }

    pub fn events_sent(&self) -> u32 {
        self.events_sent
    }
}

impl PublishPort for LogPublisher {
    fn publish_vitals(&mut self, snapshot: &VitalsSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => {
                info!("PUBLISH | vitals {}", json);
                self.vitals_sent = self.vitals_sent.wrapping_add(1);
            }
            Err(e) => warn!("PUBLISH | vitals encode failed: {}", e),
        }
    }

    fn set_vitals_interval(&mut self, secs: u32) {
        self.periodic =
            (secs > 0).then(|| Timer::new(Duration::from_secs(u64::from(secs))));
        info!("PUBLISH | vitals every {} s", secs);
    }

    fn publish_event(&mut self, name: &str, payload: &str) {
        info!("PUBLISH | event '{}' payload='{}'", name, payload);
        self.events_sent = self.events_sent.wrapping_add(1);
    }
}
