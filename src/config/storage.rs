//! Local key/value storage
//!
//! A small persistent string map living in the data directory. It plays the
//! role browser local storage plays for the web client: a best-effort cache
//! for progress, theme, vocabulary state and credentials. Values are stored as
//! strings; structured values are JSON encoded.
//!
//! Writes are serialized within the process, but nothing coordinates two
//! processes writing the same file; the last writer wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Config;
use crate::api::ApiError;

/// Persistent string key/value store
#[derive(Debug, Default)]
pub struct LocalStore {
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
    /// Current entries
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalStore {
    /// Open the store at the default location in the data directory
    pub fn open_default() -> Result<Self> {
        Self::open(Config::data_dir()?.join("local_storage.json"))
    }

    /// Open (or create) a store backed by the given file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read local storage from {:?}", path))?;
            match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Local storage at {:?} is corrupted, starting empty: {}", path, e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path: Some(path), entries: Mutex::new(entries) })
    }

    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read a raw string value
    pub fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Write a raw string value and persist
    pub fn set_item(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.into());
        self.flush(&entries)
    }

    /// Remove a value and persist; returns whether it existed
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let mut entries = self.lock();
        let existed = entries.remove(key).is_some();
        if existed {
            self.flush(&entries)?;
        }
        Ok(existed)
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Decode a JSON value. Corrupted data is reported as a validation error.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ApiError> {
        let Some(raw) = self.get_item(key) else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ApiError::Validation(format!("stored value '{}' is malformed: {}", key, e)))
    }

    /// Encode a value as JSON and persist it
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize local storage value '{}'", key))?;
        self.set_item(key, encoded)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(entries)
            .with_context(|| "Failed to serialize local storage")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write local storage to {:?}", path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u32,
    }

    #[test]
    fn in_memory_store_round_trips_strings() {
        let store = LocalStore::in_memory();
        store.set_item("cwm_theme", "dark").unwrap();
        assert_eq!(store.get_item("cwm_theme").as_deref(), Some("dark"));
        assert!(store.remove_item("cwm_theme").unwrap());
        assert!(!store.contains("cwm_theme"));
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let store = LocalStore::open(&path).unwrap();
        store.set_json("sample", &Sample { count: 3 }).unwrap();
        drop(store);

        let reopened = LocalStore::open(&path).unwrap();
        let sample: Option<Sample> = reopened.get_json("sample").unwrap();
        assert_eq!(sample, Some(Sample { count: 3 }));
    }

    #[test]
    fn malformed_value_is_a_validation_error() {
        let store = LocalStore::in_memory();
        store.set_item("sample", "{not json").unwrap();

        let result: Result<Option<Sample>, ApiError> = store.get_json("sample");
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn corrupted_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = LocalStore::open(&path).unwrap();
        assert!(store.get_item("anything").is_none());
    }
}
