//! Inbound commands to the supervisor.
//!
//! [`ActionCommand`] is the operator-writable action field.
//! [`SupervisorCommand`] wraps every externally triggered write so other
//! tasks can hand them to the supervisor loop through the
//! [`mailbox`](crate::mailbox).

use core::fmt;
use core::str::FromStr;

use crate::error::ConfigError;
use crate::vitals::fill_truncated;

use super::fields::FieldId;

/// Name payload capacity.
pub type DeviceName = heapless::String<64>;

/// Name message topic capacity.
pub type TopicBuf = heapless::String<64>;

/// Pending operator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionCommand {
    #[default]
    None,
    Restart,
    Reconnect,
    Disconnect,
    Reset,
    SyncTime,
    SendVitals,
    Snapshot,
    /// A code outside the known set, kept so the field reads back as written.
    Unrecognized(u8),
}

impl ActionCommand {
    /// Decode a wire code.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Restart,
            2 => Self::Reconnect,
            3 => Self::Disconnect,
            4 => Self::Reset,
            5 => Self::SyncTime,
            6 => Self::SendVitals,
            7 => Self::Snapshot,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Restart => 1,
            Self::Reconnect => 2,
            Self::Disconnect => 3,
            Self::Reset => 4,
            Self::SyncTime => 5,
            Self::SendVitals => 6,
            Self::Snapshot => 7,
            Self::Unrecognized(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "___",
            Self::Restart => "restart",
            Self::Reconnect => "reconnect",
            Self::Disconnect => "disconnect",
            Self::Reset => "reset",
            Self::SyncTime => "syncTime",
            Self::SendVitals => "sendVitals",
            Self::Snapshot => "snapshot",
            Self::Unrecognized(_) => "?",
        }
    }
}

impl fmt::Display for ActionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "unrecognized({code})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Unknown action name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownAction;

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action name")
    }
}

impl FromStr for ActionCommand {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "___" | "none" => Ok(Self::None),
            "restart" => Ok(Self::Restart),
            "reconnect" => Ok(Self::Reconnect),
            "disconnect" => Ok(Self::Disconnect),
            "reset" => Ok(Self::Reset),
            "syncTime" => Ok(Self::SyncTime),
            "sendVitals" => Ok(Self::SendVitals),
            "snapshot" => Ok(Self::Snapshot),
            _ => Err(UnknownAction),
        }
    }
}

/// Everything another task may ask of the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub enum SupervisorCommand {
    /// Write the action field.
    SetAction(ActionCommand),
    /// Inbound name announcement.
    NameMessage { topic: TopicBuf, payload: DeviceName },
    /// Write the vitals publish interval (seconds, 0 = off).
    SetPublishVitalsSecs(u32),
}

impl SupervisorCommand {
    /// Build a name message, truncating oversized fields.
    pub fn name_message(topic: &str, payload: &str) -> Self {
        let mut t = TopicBuf::new();
        fill_truncated(&mut t, topic);
        let mut p = DeviceName::new();
        fill_truncated(&mut p, payload);
        Self::NameMessage { topic: t, payload: p }
    }

    /// Build a write to a field given by its wire name.
    ///
    /// `action` accepts a numeric code or an action name; `name` is
    /// read-only and only changes through the name message.
    pub fn field_write(field: &str, value: &str) -> Result<Self, ConfigError> {
        match FieldId::from_name(field) {
            Some(FieldId::Action) => {
                let action = match value.parse::<u8>() {
                    Ok(code) => ActionCommand::from_code(code),
                    Err(_) => value
                        .parse()
                        .map_err(|_| ConfigError::ValidationFailed("unknown action"))?,
                };
                Ok(Self::SetAction(action))
            }
            Some(FieldId::PublishVitalsSecs) => value
                .parse()
                .map(Self::SetPublishVitalsSecs)
                .map_err(|_| ConfigError::ValidationFailed("interval must be whole seconds")),
            Some(FieldId::Name) => Err(ConfigError::ValidationFailed("name is read-only")),
            None => Err(ConfigError::ValidationFailed("unknown field")),
        }
    }
}

/// Console line syntax:
///
/// ```text
/// action=<code|name>        e.g. action=syncTime, action=1
/// publishVitalsSEC=<secs>   e.g. publishVitalsSEC=600
/// <topic> <payload>         e.g. device/name greenhouse-3
/// ```
impl FromStr for SupervisorCommand {
    type Err = ConfigError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if let Some((field, value)) = line.split_once('=') {
            return Self::field_write(field.trim(), value.trim());
        }
        match line.split_once(' ') {
            Some((topic, payload)) => Ok(Self::name_message(topic, payload.trim())),
            None => Err(ConfigError::ValidationFailed("expected field=value or topic payload")),
        }
    }
}
