//! In-memory store (tests, headless runs, hosts that persist elsewhere)

use std::collections::BTreeMap;

use super::KeyValueStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, i64>,
    /// Number of successful flushes (observable in tests)
    flushes: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.entries.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete_key(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_and_set() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_int("BEST_SCORE", 0), 0);
        assert_eq!(store.get_int("BEST_SCORE", 7), 7);
        store.set_int("BEST_SCORE", 2500);
        assert_eq!(store.get_int("BEST_SCORE", 0), 2500);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = MemoryStore::new();
        store.set_bool("ACH_first_attack", true);
        assert!(store.get_bool("ACH_first_attack"));
        store.delete_key("ACH_first_attack");
        store.delete_key("ACH_first_attack");
        assert!(!store.get_bool("ACH_first_attack"));
        assert!(store.is_empty());
    }
}
