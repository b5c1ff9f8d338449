//! Memory monitor.
//!
//! Samples free heap once per tick.  The floor check is unconditional and
//! fatal: below `limit` the supervisor resets with `OutOfMemory` before any
//! other effect of the tick, because continuing risks corrupting in-flight
//! state.  Nothing here retries or defers.

use log::error;

/// Result of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStatus {
    /// Same reading as last tick.
    Unchanged,
    /// New reading, above the floor.
    Changed(u32),
    /// Below the floor.  The caller must reset.
    Exhausted(u32),
}

pub struct MemoryMonitor {
    limit_bytes: u32,
    last_free: Option<u32>,
}

impl MemoryMonitor {
    pub fn new(limit_bytes: u32) -> Self {
        Self {
            limit_bytes,
            last_free: None,
        }
    }

    pub fn limit_bytes(&self) -> u32 {
        self.limit_bytes
    }

    /// Last stored reading.
    pub fn last_free(&self) -> Option<u32> {
        self.last_free
    }

    /// Record `free_bytes` and classify it against the floor.
    pub fn sample(&mut self, free_bytes: u32) -> MemoryStatus {
        let changed = self.last_free != Some(free_bytes);
        self.last_free = Some(free_bytes);

        if free_bytes < self.limit_bytes {
            error!(
                "Memory: {} B free is below the {} B floor",
                free_bytes, self.limit_bytes
            );
            return MemoryStatus::Exhausted(free_bytes);
        }
        if changed {
            MemoryStatus::Changed(free_bytes)
        } else {
            MemoryStatus::Unchanged
        }
    }
}
