//! JSON file store
//!
//! Features:
//! - Single JSON object of integer entries
//! - Writes go to `<file>.tmp` first, then replace the save atomically
//! - Missing file means an empty store

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::StoreError;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, i64>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let json = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let entries: BTreeMap<String, i64> = serde_json::from_str(&json)?;
            log::info!("Loaded {} entries from {}", entries.len(), path.display());
            entries
        } else {
            log::info!("No save at {}, starting fresh", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.entries.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        if self.entries.insert(key.to_string(), value) != Some(value) {
            self.dirty = true;
        }
    }

    fn delete_key(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }

        let io_err = |path: &Path, source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;

        self.dirty = false;
        log::debug!("Store saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "dual_balance_{}_{}_{}.json",
            name,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn test_roundtrip_through_disk() {
        let path = scratch_path("roundtrip");
        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store.set_int("BEST_SCORE", 2500);
            store.set_bool("ACH_first_death", true);
            store.flush().unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_int("BEST_SCORE", 0), 2500);
        assert!(store.get_bool("ACH_first_death"));
        assert!(!store.tmp_path().exists());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty() {
        let path = scratch_path("missing");
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_int("STATS_RUNS", 0), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let path = scratch_path("corrupt");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
        std::fs::remove_file(&path).unwrap();
    }
}
