//! Durable key-value persistence
//!
//! All durable state (best score, stat counters, achievement flags) is stored
//! as named integers under stable keys. The core only depends on the
//! [`KeyValueStore`] contract; the medium is up to the host.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;

/// Logical read/write contract for durable integer entries
pub trait KeyValueStore {
    /// Value under `key`, or `default` when absent
    fn get_int(&self, key: &str, default: i64) -> i64;

    fn set_int(&mut self, key: &str, value: i64);

    /// Remove `key`; no-op if absent
    fn delete_key(&mut self, key: &str);

    /// Make every prior write durable
    fn flush(&mut self) -> Result<(), StoreError>;

    /// Boolean entries are stored as 0/1
    fn get_bool(&self, key: &str) -> bool {
        self.get_int(key, 0) == 1
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set_int(key, i64::from(value));
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        (**self).get_int(key, default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        (**self).set_int(key, value)
    }

    fn delete_key(&mut self, key: &str) {
        (**self).delete_key(key)
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        (**self).flush()
    }
}

/// Flush and log instead of failing; a lost write must never abort a tick
pub(crate) fn flush_or_warn(store: &mut dyn KeyValueStore) {
    if let Err(e) = store.flush() {
        log::warn!("Failed to flush persistent store: {}", e);
    }
}
