//! Error types for the collection and army stores.

use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by store mutations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before it reached stored state.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The storage adapter failed to write.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Stored state could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Rejected user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Item name empty after trimming.
    #[error("name must not be empty")]
    EmptyName,

    /// Enhancement name empty after trimming.
    #[error("enhancement name must not be empty")]
    EmptyEnhancementName,

    /// Points field was not a non-negative integer.
    #[error("'{0}' is not a valid point value")]
    InvalidPoints(String),

    /// Model count was not a positive integer.
    #[error("'{0}' is not a valid model count")]
    InvalidModelCount(String),

    /// Two enhancements of one unit share a name.
    #[error("enhancement '{0}' is listed more than once")]
    DuplicateEnhancement(String),

    /// Enhancement field entry could not be split into name and points.
    #[error("could not parse enhancement '{0}'")]
    MalformedEnhancement(String),

    /// Toggled enhancement is not offered by the entry.
    #[error("unknown enhancement '{0}'")]
    UnknownEnhancement(String),
}

/// Failures writing to or removing from a storage adapter.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failure for the given key.
    #[error("failed to {action} key '{key}': {source}")]
    Io {
        /// Operation that failed (`write`, `remove`).
        action: &'static str,
        /// Storage key involved.
        key: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(action: &'static str, key: &str, source: std::io::Error) -> Self {
        Self::Io {
            action,
            key: key.to_string(),
            source,
        }
    }
}
