//! Fuzz target: `SettingsStore::load` on arbitrary stored blobs
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A blob either decodes or reports `Corrupted`; storage errors never leak
//! - Anything that decodes and validates saves and reloads unchanged
//!
//! cargo fuzz run fuzz_settings_decode

#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use nodewarden::app::ports::StoragePort;
use nodewarden::error::{ConfigError, Error, StorageError};
use nodewarden::settings::{Settings, SettingsStore};

#[derive(Default)]
struct Blob {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for Blob {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self
            .data
            .get(&format!("{ns}::{key}"))
            .ok_or(StorageError::NotFound)?;
        let n = v.len().min(buf.len());
        buf[..n].copy_from_slice(&v[..n]);
        Ok(n)
    }
    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }
    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }
    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }
}

fuzz_target!(|data: &[u8]| {
    let mut blob = Blob::default();
    blob.data
        .insert("nodewarden::settings".to_owned(), data.to_vec());
    let mut store = SettingsStore::new(blob);

    match store.load(Settings::with_publish_interval(60)) {
        Ok(settings) => {
            if store.save(&settings).is_ok() {
                let again = store.load(Settings::with_publish_interval(0));
                assert_eq!(again, Ok(settings), "saved settings must reload unchanged");
            }
        }
        Err(e) => assert_eq!(e, Error::Config(ConfigError::Corrupted)),
    }
});
