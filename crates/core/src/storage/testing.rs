//! Storage doubles for unit tests.

use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
};

use super::{MemoryStorage, Storage};
use crate::error::StorageError;

/// Memory storage whose writes can be switched to fail.
#[derive(Debug, Default)]
pub(crate) struct FailingStorage {
    inner: MemoryStorage,
    failing: AtomicBool,
}

impl FailingStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every later `set`/`remove` fail (or succeed again).
    pub(crate) fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self, action: &'static str, key: &str) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::io(
                action,
                key,
                io::Error::new(io::ErrorKind::PermissionDenied, "read-only storage"),
            ));
        }
        Ok(())
    }
}

impl Storage for FailingStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check("write", key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check("remove", key)?;
        self.inner.remove(key)
    }
}
