//! Persisted settings.
//!
//! The two supervisor values that must survive a restart (the
//! cloud-assigned device name and the vitals publish interval), stored as
//! one `postcard` blob through the [`StoragePort`].
//!
//! The supervisor never writes storage itself; it raises
//! [`PersistencePort::request_save`](crate::app::ports::PersistencePort::request_save)
//! and the main loop calls [`SettingsStore::save`] with the current values.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::commands::DeviceName;
use crate::app::ports::StoragePort;
use crate::error::{ConfigError, Error, StorageError};

const NAMESPACE: &str = "nodewarden";
const KEY: &str = "settings";
const MAX_BLOB_SIZE: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Cloud-derived device name.
    pub name: DeviceName,
    /// Periodic vitals publish interval (seconds, 0 = off).
    pub publish_vitals_secs: u32,
}

impl Settings {
    /// Defaults before anything was saved.
    pub fn with_publish_interval(publish_vitals_secs: u32) -> Self {
        Self {
            name: DeviceName::new(),
            publish_vitals_secs,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_printable_ascii(&self.name) {
            return Err(ConfigError::ValidationFailed(
                "name must be printable ASCII",
            ));
        }
        Ok(())
    }
}

/// Returns `true` if every byte of `s` is in the printable ASCII range.
pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub struct SettingsStore<S> {
    storage: S,
}

impl<S: StoragePort> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load stored settings, or `defaults` when nothing was saved yet.
    pub fn load(&self, defaults: Settings) -> Result<Settings, Error> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match self.storage.read(NAMESPACE, KEY, &mut buf) {
            Ok(len) => {
                let settings: Settings =
                    postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
                info!("Settings: loaded (name='{}')", settings.name);
                Ok(settings)
            }
            Err(StorageError::NotFound) => {
                info!("Settings: none stored, using defaults");
                Ok(defaults)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate and persist.
    pub fn save(&mut self, settings: &Settings) -> Result<(), Error> {
        settings.validate()?;
        let bytes = postcard::to_allocvec(settings).map_err(|_| {
            warn!("Settings: encode failed");
            ConfigError::Corrupted
        })?;
        self.storage.write(NAMESPACE, KEY, &bytes)?;
        info!("Settings: saved ({} bytes)", bytes.len());
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
