//! Application core: pure supervisor logic, zero I/O.
//!
//! The [`Supervisor`](service::Supervisor) coordinates the watchdog guard,
//! memory monitor, connectivity tracker, time sync scheduler and action
//! dispatcher.  All interaction with the platform happens through the
//! **port traits** in [`ports`], so the whole core runs on the host against
//! mock adapters.

pub mod commands;
pub mod events;
pub mod fields;
pub mod ports;
pub mod service;
