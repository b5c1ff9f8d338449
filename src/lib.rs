//! NodeWarden device supervisor library.
//!
//! Exposes the pure-logic modules for integration testing and the
//! platform adapters for the firmware binary.  All ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each adapter.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod connectivity;
pub mod dispatch;
pub mod error;
pub mod mailbox;
pub mod memory;
pub mod settings;
pub mod time_sync;
pub mod timer;
pub mod vitals;
pub mod watchdog;

// Platform adapters; each carries a host simulation so the crate builds
// and tests off-target.
pub mod adapters;
pub mod drivers;
