//! Action dispatch table.
//!
//! A pure function from (connectivity state, command) to what the
//! supervisor must do.  The caller applies the effect; nothing here
//! touches a port.
//!
//! | Command        | Precondition        | Effect           | Clear |
//! |----------------|---------------------|------------------|-------|
//! | Restart        | any                 | reset UserRestart| no    |
//! | Reset          | any                 | reset UserReset  | no    |
//! | Disconnect     | state ≠ Disconnected| drop link        | yes   |
//! | Reconnect      | state = Disconnected| open link        | yes   |
//! | SyncTime       | any                 | request resync   | yes   |
//! | SendVitals     | any                 | publish vitals   | yes   |
//! | None/Snapshot/?| any                 | none             | no    |
//!
//! Disconnect and Reconnect clear the field even when their precondition
//! fails, so a stale command never blocks the next submission.  Restart
//! and Reset never return on hardware, so the field is left as written.

use crate::app::commands::ActionCommand;
use crate::connectivity::ConnectivityState;
use crate::vitals::ResetReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Reset(ResetReason),
    DropLink,
    OpenLink,
    RequestResync,
    PublishVitals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Connectivity state after the effect.
    pub next_state: ConnectivityState,
    pub effect: Effect,
    /// Reset the action field to `None` afterwards.
    pub clear: bool,
}

pub fn dispatch(state: ConnectivityState, command: ActionCommand) -> Dispatch {
    let (next_state, effect, clear) = match command {
        ActionCommand::Restart => (state, Effect::Reset(ResetReason::UserRestart), false),
        ActionCommand::Reset => (state, Effect::Reset(ResetReason::UserReset), false),
        ActionCommand::Disconnect if state != ConnectivityState::Disconnected => {
            (ConnectivityState::Disconnected, Effect::DropLink, true)
        }
        ActionCommand::Reconnect if state == ConnectivityState::Disconnected => {
            (ConnectivityState::Connecting, Effect::OpenLink, true)
        }
        ActionCommand::Disconnect | ActionCommand::Reconnect => (state, Effect::None, true),
        ActionCommand::SyncTime => (state, Effect::RequestResync, true),
        ActionCommand::SendVitals => (state, Effect::PublishVitals, true),
        ActionCommand::None | ActionCommand::Snapshot | ActionCommand::Unrecognized(_) => {
            (state, Effect::None, false)
        }
    };
    Dispatch {
        next_state,
        effect,
        clear,
    }
}
