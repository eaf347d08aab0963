use std::collections::HashMap;

use parking_lot::RwLock;

use super::Storage;
use crate::error::StorageError;

/// Thread-safe in-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set`/`remove` calls performed so far.
    pub fn writes(&self) -> usize {
        self.inner.read().writes
    }

    /// Whether a value exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().values.contains_key(key)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write();
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write();
        inner.values.remove(key);
        inner.writes += 1;
        Ok(())
    }
}
