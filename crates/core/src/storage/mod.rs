//! Key-value storage adapters shared by the collection and army stores.

/// One-file-per-key persistence under a data directory.
pub mod file;
/// Process-local storage used by tests and ephemeral sessions.
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// Minimal string key-value capability.
///
/// `get` never fails: absent or unreadable values are reported as `None`,
/// and interpreting the raw text is left to the caller.
pub trait Storage: Send + Sync {
    /// Raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Drop `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
