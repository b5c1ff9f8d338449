//! Outbound supervisor events.
//!
//! The [`Supervisor`](super::service::Supervisor) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to the
//! cloud, etc.  Events are observations only; no collaborator effect
//! depends on a sink.

use crate::connectivity::ConnectivityState;
use crate::vitals::ResetReason;

use super::commands::ActionCommand;

/// Structured events emitted by the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub enum SupervisorEvent {
    /// Setup finished; carries the reason for this boot.
    Started { reset_reason: ResetReason },

    /// The tracked connectivity state moved along an edge.
    ConnectivityChanged {
        from: ConnectivityState,
        to: ConnectivityState,
    },

    /// Free memory dropped below the floor; a reset follows immediately.
    MemoryExhausted { free_bytes: u32, limit_bytes: u32 },

    /// A reset is about to be requested.
    ResetRequested(ResetReason),

    /// An action command produced an effect.
    ActionApplied(ActionCommand),

    /// An action command was dropped (precondition unmet or no-op).
    ActionIgnored(ActionCommand),

    /// A time resync is pending and waits for a connection.
    ResyncPending,

    /// The resync request went out to the cloud.
    TimeResynced,

    /// The one-shot name request went out.
    NameRequested,

    /// The device name changed and a save was requested.
    NameUpdated,

    /// Vitals were published on demand.
    VitalsPublished,

    /// The periodic vitals interval changed.
    VitalsIntervalChanged(u32),
}
