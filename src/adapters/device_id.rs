//! Device identity derived from the factory MAC address.
//!
//! Produces a stable, human-readable device ID in the form `NW-XXYYZZ`
//! (last 3 bytes of the 6-byte MAC in uppercase hex).  It is deterministic
//! across reboots (factory-burned eFuse MAC) and is what the supervisor
//! reports as its device id.

use core::fmt::Write;

use crate::app::ports::DeviceId;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer, the size the call writes.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Derive the short device ID from the last 3 MAC bytes.
pub fn device_id(mac: &MacAddress) -> DeviceId {
    let mut id = DeviceId::new();
    let _ = write!(id, "NW-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}
