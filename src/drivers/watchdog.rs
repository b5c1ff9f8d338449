//! Task Watchdog Timer (TWDT) driver.
//!
//! Implements [`WatchdogPort`] over the ESP-IDF TWDT: `configure` sets the
//! timeout and subscribes the calling task, `refresh` resets the countdown.
//! A starved watchdog panics and resets the chip, which the next boot
//! reads back as a watchdog reset.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

use crate::app::ports::WatchdogPort;

#[derive(Default)]
pub struct TaskWatchdog {
    subscribed: bool,
    timeout_ms: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_refreshes: u64,
}

impl TaskWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Simulation: refreshes seen so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_refreshes(&self) -> u64 {
        self.sim_refreshes
    }
}

impl WatchdogPort for TaskWatchdog {
    fn configure(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;

        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT calls are made from the supervisor task only.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                if !self.subscribed {
                    let ret = esp_task_wdt_add(core::ptr::null_mut());
                    self.subscribed = ret == ESP_OK;
                    if !self.subscribed {
                        warn!("Watchdog: failed to subscribe ({})", ret);
                    }
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if self.subscribed {
                warn!("Watchdog(sim): reconfigured while subscribed");
            }
            self.subscribed = true;
        }

        info!("Watchdog: {} ms timeout, panic on trigger", timeout_ms);
    }

    fn refresh(&mut self) {
        if !self.subscribed {
            return;
        }

        #[cfg(target_os = "espidf")]
        {
            // SAFETY: the calling task is subscribed (checked above).
            unsafe {
                esp_task_wdt_reset();
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_refreshes = self.sim_refreshes.wrapping_add(1);
        }
    }
}
