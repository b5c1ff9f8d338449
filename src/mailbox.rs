//! Command mailbox.
//!
//! Bounded `embassy-sync` channel that carries [`SupervisorCommand`]s from
//! other tasks (cloud subscription callbacks, console) into the
//! single-threaded supervisor loop.  Producers never block; the loop drains
//! everything queued between timer polls.
//!
//! ```text
//! ┌──────────────┐ SupervisorCommand ┌──────────────┐
//! │ cloud / RPC  │──────────────────▶│  supervisor  │
//! │   tasks      │   (try_send)      │  loop (sync) │
//! └──────────────┘                   └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::SupervisorCommand;

/// Mailbox depth.
pub const MAILBOX_DEPTH: usize = 8;

pub struct Mailbox<const N: usize> {
    channel: Channel<CriticalSectionRawMutex, SupervisorCommand, N>,
}

impl<const N: usize> Mailbox<N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue a command.  Returns `false` (and drops the command) when full.
    pub fn post(&self, cmd: SupervisorCommand) -> bool {
        match self.channel.try_send(cmd) {
            Ok(()) => true,
            Err(_) => {
                warn!("Mailbox: full, command dropped");
                false
            }
        }
    }

    /// Take the oldest queued command.
    pub fn take(&self) -> Option<SupervisorCommand> {
        self.channel.try_receive().ok()
    }

    /// Hand every queued command to `f`, oldest first.  Returns the count.
    pub fn drain(&self, mut f: impl FnMut(SupervisorCommand)) -> usize {
        let mut n = 0;
        while let Some(cmd) = self.take() {
            f(cmd);
            n += 1;
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl<const N: usize> Default for Mailbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide mailbox: other tasks → supervisor loop.
pub static COMMANDS: Mailbox<MAILBOX_DEPTH> = Mailbox::new();
