//! Writable supervisor fields and their change handlers.
//!
//! Each externally writable field has one row: an id, its wire name, and a
//! plain `fn` pointer invoked synchronously by whichever setter mutated the
//! field.  No closures, no heap.
//!
//! ```text
//!  setter ──▶ field value updated ──▶ table[id].on_change(supervisor, ports, sink)
//! ```

use super::ports::{DevicePorts, EventSink};
use super::service::Supervisor;

/// Change handler signature.
pub type FieldChangeFn = fn(&mut Supervisor, &mut dyn DevicePorts, &mut dyn EventSink);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldId {
    Action = 0,
    PublishVitalsSecs = 1,
    Name = 2,
}

impl FieldId {
    pub const COUNT: usize = 3;

    pub fn from_name(name: &str) -> Option<Self> {
        FIELD_NAMES
            .iter()
            .position(|n| *n == name)
            .map(Self::from_index)
    }

    pub fn name(self) -> &'static str {
        FIELD_NAMES[self as usize]
    }

    fn from_index(i: usize) -> Self {
        match i {
            0 => Self::Action,
            1 => Self::PublishVitalsSecs,
            _ => Self::Name,
        }
    }
}

const FIELD_NAMES: [&str; FieldId::COUNT] = ["action", "publishVitalsSEC", "name"];

/// One row in the field table.
pub struct FieldBinding {
    pub id: FieldId,
    pub on_change: FieldChangeFn,
}

/// Build the field table.  Called once when the supervisor is constructed.
pub fn build_field_table() -> [FieldBinding; FieldId::COUNT] {
    [
        // Index 0: action
        FieldBinding {
            id: FieldId::Action,
            on_change: action_changed,
        },
        // Index 1: publishVitalsSEC
        FieldBinding {
            id: FieldId::PublishVitalsSecs,
            on_change: publish_interval_changed,
        },
        // Index 2: name
        FieldBinding {
            id: FieldId::Name,
            on_change: name_changed,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Handlers
// ═══════════════════════════════════════════════════════════════════════════

fn action_changed(sup: &mut Supervisor, hw: &mut dyn DevicePorts, sink: &mut dyn EventSink) {
    sup.apply_action(hw, sink);
}

fn publish_interval_changed(
    sup: &mut Supervisor,
    hw: &mut dyn DevicePorts,
    sink: &mut dyn EventSink,
) {
    sup.apply_publish_interval(hw, sink);
}

fn name_changed(sup: &mut Supervisor, hw: &mut dyn DevicePorts, sink: &mut dyn EventSink) {
    sup.persist_name(hw, sink);
}
