//! Hardware drivers.

pub mod watchdog;
