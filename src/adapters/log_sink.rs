//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured supervisor events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A cloud event adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::SupervisorEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SupervisorEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged since boot.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SupervisorEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            SupervisorEvent::Started { reset_reason } => {
                info!("START | reset_reason={}", reset_reason);
            }
            SupervisorEvent::ConnectivityChanged { from, to } => {
                info!("LINK  | {:?} -> {:?}", from, to);
            }
            SupervisorEvent::MemoryExhausted {
                free_bytes,
                limit_bytes,
            } => {
                error!("MEM   | {} B free < {} B floor", free_bytes, limit_bytes);
            }
            SupervisorEvent::ResetRequested(reason) => {
                warn!("RESET | {}", reason);
            }
            SupervisorEvent::ActionApplied(action) => {
                info!("ACT   | {} applied", action);
            }
            SupervisorEvent::ActionIgnored(action) => {
                info!("ACT   | {} ignored", action);
            }
            SupervisorEvent::ResyncPending => info!("TIME  | resync pending"),
            SupervisorEvent::TimeResynced => info!("TIME  | resync requested from cloud"),
            SupervisorEvent::NameRequested => info!("NAME  | requested"),
            SupervisorEvent::NameUpdated => info!("NAME  | updated"),
            SupervisorEvent::VitalsPublished => info!("VITAL | published"),
            SupervisorEvent::VitalsIntervalChanged(secs) => {
                info!("VITAL | interval {} s", secs);
            }
        }
    }
}
