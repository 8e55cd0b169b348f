//! Key/value persistence.
//!
//! Every component persists JSON values under its own keys through the
//! [`KeyValueStore`] capability. Reads go through [`load_or_default`], which
//! never fails: an unavailable backend yields the default, a malformed value
//! is discarded and the key reinitialized. Writes go through [`save`] /
//! [`save_batch`], which log and swallow backend failures so the engine keeps
//! running in memory.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use crate::error::StorageError;

/// Durable string-keyed JSON storage.
///
/// Implementations only move strings; (de)serialization and recovery live in
/// the helpers of this module.
pub trait KeyValueStore: Send {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Write several keys as one logical update. Readers must never observe
    /// a subset of the batch.
    fn put_batch(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;
}

/// Read `key`, falling back to `default()` when missing, unreadable or invalid.
///
/// `validate` runs after a successful parse; returning `Err(message)` marks
/// the value malformed. A malformed value is overwritten with the default.
pub fn load_or_default<T, D, V>(store: &dyn KeyValueStore, key: &str, default: D, validate: V) -> T
where
    T: Serialize + DeserializeOwned,
    D: FnOnce() -> T,
    V: FnOnce(&T) -> Result<(), String>,
{
    let raw = match store.get_raw(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default(),
        Err(e) => {
            warn!(key, error = %e, "storage read failed, using default");
            return default();
        }
    };

    let parsed = serde_json::from_str::<T>(&raw)
        .map_err(|e| e.to_string())
        .and_then(|value| validate(&value).map(|()| value));

    match parsed {
        Ok(value) => value,
        Err(message) => {
            let err = StorageError::Malformed {
                key: key.to_string(),
                message,
            };
            warn!(key, error = %err, "discarding malformed persisted value");
            let value = default();
            save(store, key, &value);
            value
        }
    }
}

/// Accept any parsed value.
pub fn any<T>(_: &T) -> Result<(), String> {
    Ok(())
}

/// Serialize and write one key. Failures are logged, never returned.
pub fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(key, error = %e, "failed to serialize value, write skipped");
            return;
        }
    };
    if let Err(e) = store.put_raw(key, &json) {
        warn!(key, error = %e, "storage write failed, keeping in-memory state");
    }
}

/// Write pre-serialized entries as one batch. Failures are logged, never returned.
pub fn save_batch(store: &dyn KeyValueStore, entries: &[(&str, String)]) {
    if let Err(e) = store.put_batch(entries) {
        let keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
        warn!(?keys, error = %e, "storage batch write failed, keeping in-memory state");
    }
}

/// Serialize a value for [`save_batch`].
pub(crate) fn to_entry<'k, T: Serialize + ?Sized>(
    key: &'k str,
    value: &T,
) -> Result<(&'k str, String), StorageError> {
    serde_json::to_string(value)
        .map(|json| (key, json))
        .map_err(|e| StorageError::Malformed {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Returns the data directory.
///
/// `FOCUSROOM_DATA_DIR` wins when set; otherwise `~/.config/focusroom[-dev]/`
/// depending on `FOCUSROOM_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FOCUSROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusroom-dev")
            } else {
                base_dir.join("focusroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
