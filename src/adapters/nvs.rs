//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] over the default NVS partition.
//!
//! - Atomic writes: ESP-IDF NVS commits are atomic per `set_blob`.
//! - Namespace isolation: each subsystem uses its own namespace.
//! - The simulation backend is an in-memory map (dev/test only).

use log::info;

use crate::app::ports::StoragePort;
use crate::error::StorageError;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

#[cfg(target_os = "espidf")]
use log::warn;

pub struct NvsAdapter {
    #[cfg(target_os = "espidf")]
    partition: EspDefaultNvsPartition,
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsAdapter {
    /// Wrap the default NVS partition taken in `main`.
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Self {
        info!("NvsAdapter: ESP-IDF NVS partition attached");
        Self { partition }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        info!("NvsAdapter: simulation backend");
        Self {
            store: HashMap::new(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Open `namespace` on the default partition.
    #[cfg(target_os = "espidf")]
    fn open(&self, namespace: &str, write: bool) -> Result<EspNvs<NvsDefault>, StorageError> {
        EspNvs::new(self.partition.clone(), namespace, write).map_err(|e| {
            warn!("NVS: open '{}' failed: {}", namespace, e);
            StorageError::IoError
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let data = self
                .store
                .get(&Self::composite_key(namespace, key))
                .ok_or(StorageError::NotFound)?;
            if data.len() > buf.len() {
                return Err(StorageError::BufferTooSmall);
            }
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        #[cfg(target_os = "espidf")]
        {
            let nvs = self.open(namespace, false)?;
            let len = nvs
                .blob_len(key)
                .map_err(|_| StorageError::IoError)?
                .ok_or(StorageError::NotFound)?;
            if len > buf.len() {
                return Err(StorageError::BufferTooSmall);
            }
            match nvs.get_blob(key, buf) {
                Ok(Some(data)) => Ok(data.len()),
                Ok(None) => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .insert(Self::composite_key(namespace, key), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let mut nvs = self.open(namespace, true)?;
            nvs.set_blob(key, data).map_err(|e| {
                warn!("NVS: write '{}::{}' failed: {}", namespace, key, e);
                if e.code() == esp_idf_svc::sys::ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store.remove(&Self::composite_key(namespace, key));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let mut nvs = self.open(namespace, true)?;
            nvs.remove(key)
                .map(|_| ())
                .map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .contains_key(&Self::composite_key(namespace, key))
        }

        #[cfg(target_os = "espidf")]
        {
            self.open(namespace, false)
                .and_then(|nvs| nvs.contains(key).map_err(|_| StorageError::IoError))
                .unwrap_or(false)
        }
    }
}
