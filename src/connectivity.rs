//! Connectivity tracker.
//!
//! Mirrors the observed status of the cloud link in one of three states:
//!
//! ```text
//!   CONNECTING ──[probe up]────▶ CONNECTED
//!       ▲    ◀──[probe down]───────┘  │
//!       │                             │
//!  [reconnect]                  [disconnect]
//!       │                             ▼
//!       └──────────────────── DISCONNECTED
//!        (CONNECTING ──[disconnect]──▶ DISCONNECTED as well)
//! ```
//!
//! The periodic probe only ever moves between Connecting and Connected.
//! Disconnected is entered and left exclusively through explicit operator
//! actions, and each of those issues its side effect at most once.

use log::info;

use crate::app::ports::ConnectivityPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectivityState {
    /// Whether `self → to` is one of the allowed edges.
    pub fn can_transition_to(self, to: ConnectivityState) -> bool {
        use ConnectivityState::{Connected, Connecting, Disconnected};
        matches!(
            (self, to),
            (Connecting, Connected)
                | (Connected, Connecting)
                | (Connecting | Connected, Disconnected)
                | (Disconnected, Connecting)
        )
    }
}

/// A state change reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConnectivityState,
    pub to: ConnectivityState,
}

#[derive(Debug, Default)]
pub struct ConnectivityTracker {
    state: ConnectivityState,
}

impl ConnectivityTracker {
    /// Starts in Connecting.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectivityState::Connected
    }

    /// Apply the periodic probe.  Disconnected ignores the probe entirely.
    pub fn observe(&mut self, probe_connected: bool) -> Option<Transition> {
        let next = match (self.state, probe_connected) {
            (ConnectivityState::Connecting, true) => ConnectivityState::Connected,
            (ConnectivityState::Connected, false) => ConnectivityState::Connecting,
            _ => return None,
        };
        Some(self.set(next))
    }

    /// Explicit disconnect.  No-op (and no provider call) when already
    /// Disconnected.  The radio stays powered.
    pub fn disconnect<N>(&mut self, net: &mut N) -> Option<Transition>
    where
        N: ConnectivityPort + ?Sized,
    {
        if self.state == ConnectivityState::Disconnected {
            return None;
        }
        info!("Connectivity: disconnecting from the cloud");
        let t = self.set(ConnectivityState::Disconnected);
        net.disconnect();
        Some(t)
    }

    /// Explicit reconnect.  No-op (and no provider call) unless Disconnected.
    pub fn reconnect<N>(&mut self, net: &mut N) -> Option<Transition>
    where
        N: ConnectivityPort + ?Sized,
    {
        if self.state != ConnectivityState::Disconnected {
            return None;
        }
        info!("Connectivity: reconnecting to the cloud");
        let t = self.set(ConnectivityState::Connecting);
        net.connect();
        Some(t)
    }

    fn set(&mut self, next: ConnectivityState) -> Transition {
        debug_assert!(self.state.can_transition_to(next));
        let t = Transition {
            from: self.state,
            to: next,
        };
        info!("Connectivity: {:?} -> {:?}", t.from, t.to);
        self.state = next;
        t
    }
}
