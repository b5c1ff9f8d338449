//! System control adapter.
//!
//! Implements [`SystemPort`]: free heap, software reset with a recorded
//! reason, boot reason decode, device identity.
//!
//! A software reset first writes the reason code to NVS (namespace
//! `"nodewarden"`, key `"rst"`).  On the next boot the stored code wins;
//! without one the hardware reset cause is decoded instead, so watchdog
//! and panic resets are reported even though no code ran to record them.
//!
//! - **`target_os = "espidf"`**: `esp_get_free_heap_size`, `esp_restart`,
//!   `esp_reset_reason`.
//! - **all other targets**: a settable simulated heap; `reset` only
//!   records the request.

use log::{info, warn};

use crate::app::ports::{DeviceId, StoragePort, SystemPort};
use crate::vitals::ResetReason;

use super::device_id::{device_id, read_mac};
use super::nvs::NvsAdapter;

const NAMESPACE: &str = "nodewarden";
const RESET_KEY: &str = "rst";

pub struct SystemAdapter {
    nvs: NvsAdapter,
    boot_reason: ResetReason,
    #[cfg(not(target_os = "espidf"))]
    sim_free_bytes: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_reset: Option<ResetReason>,
}

impl SystemAdapter {
    /// Decode this boot's reason and consume the stored code.
    pub fn new(mut nvs: NvsAdapter) -> Self {
        let boot_reason = match take_stored_reason(&mut nvs) {
            Some(reason) => reason,
            None => hardware_reset_reason(),
        };
        info!("System: boot reason {}", boot_reason);
        Self {
            nvs,
            boot_reason,
            #[cfg(not(target_os = "espidf"))]
            sim_free_bytes: 200 * 1024,
            #[cfg(not(target_os = "espidf"))]
            sim_reset: None,
        }
    }

    /// Simulation: set the free heap the next sample reports.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_free_memory(&mut self, bytes: u32) {
        self.sim_free_bytes = bytes;
    }

    /// Simulation: the reset requested last, if any.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_reset(&self) -> Option<ResetReason> {
        self.sim_reset
    }

    /// Hand back the NVS adapter to rebuild after a simulated reboot.
    #[cfg(test)]
    fn into_storage(self) -> NvsAdapter {
        self.nvs
    }
}

fn take_stored_reason(nvs: &mut NvsAdapter) -> Option<ResetReason> {
    let mut buf = [0u8; 1];
    let len = nvs.read(NAMESPACE, RESET_KEY, &mut buf).ok()?;
    if let Err(e) = nvs.delete(NAMESPACE, RESET_KEY) {
        warn!("System: could not clear stored reset reason ({})", e);
    }
    (len == 1).then(|| ResetReason::from_code(buf[0]))
}

#[cfg(target_os = "espidf")]
fn hardware_reset_reason() -> ResetReason {
    use esp_idf_svc::sys::*;
    // SAFETY: plain query of a value latched at boot.
    let cause = unsafe { esp_reset_reason() };
    #[allow(non_upper_case_globals)]
    match cause {
        esp_reset_reason_t_ESP_RST_TASK_WDT
        | esp_reset_reason_t_ESP_RST_INT_WDT
        | esp_reset_reason_t_ESP_RST_WDT => ResetReason::WatchdogTimeout,
        esp_reset_reason_t_ESP_RST_PANIC => ResetReason::Panic,
        _ => ResetReason::Nominal,
    }
}

#[cfg(not(target_os = "espidf"))]
fn hardware_reset_reason() -> ResetReason {
    ResetReason::Nominal
}

impl SystemPort for SystemAdapter {
    #[cfg(target_os = "espidf")]
    fn free_memory(&self) -> u32 {
        // SAFETY: read-only heap statistics query.
        unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn free_memory(&self) -> u32 {
        self.sim_free_bytes
    }

    fn reset(&mut self, reason: ResetReason) {
        if let Err(e) = self.nvs.write(NAMESPACE, RESET_KEY, &[reason.code()]) {
            warn!("System: could not record reset reason ({})", e);
        }
        warn!("System: restarting ({})", reason);

        #[cfg(target_os = "espidf")]
        {
            // SAFETY: esp_restart never returns.
            unsafe {
                esp_idf_svc::sys::esp_restart();
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_reset = Some(reason);
        }
    }

    fn last_reset_reason(&self) -> ResetReason {
        self.boot_reason
    }

    fn device_id(&self) -> DeviceId {
        device_id(&read_mac())
    }

    fn mac_address(&self) -> Option<[u8; 6]> {
        Some(read_mac())
    }
}
