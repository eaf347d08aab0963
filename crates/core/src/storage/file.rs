use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::Storage;
use crate::error::StorageError;

/// Storage backed by one JSON file per key inside `root`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at the provided directory. The directory is
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the value files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("Failed to read {}: {err}", path.display());
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|err| StorageError::io("write", key, err))?;
        let path = self.path_for(key);
        write_atomic(&self.root, &path, value.as_bytes())
            .map_err(|err| StorageError::io("write", key, err))?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io("remove", key, err)),
        }
    }
}

/// Write `contents` to `path` through a temp file in `dir` so readers never
/// observe a partial value.
pub(crate) fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub(crate) fn sanitize_key(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "value".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn values_survive_a_new_handle() -> Result<()> {
        let dir = tempdir()?;
        let storage = FileStorage::new(dir.path().join("data"));
        assert_eq!(storage.get("wh40kCollection"), None);

        storage.set("wh40kCollection", "[]")?;
        let reopened = FileStorage::new(dir.path().join("data"));
        assert_eq!(reopened.get("wh40kCollection").as_deref(), Some("[]"));

        reopened.remove("wh40kCollection")?;
        assert_eq!(storage.get("wh40kCollection"), None);
        reopened.remove("wh40kCollection")?;
        Ok(())
    }

    #[test]
    fn overwrite_replaces_contents() -> Result<()> {
        let dir = tempdir()?;
        let storage = FileStorage::new(dir.path());
        storage.set("key", "a much longer first value")?;
        storage.set("key", "short")?;
        assert_eq!(storage.get("key").as_deref(), Some("short"));
        Ok(())
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        assert_eq!(sanitize_key("../army list?"), "armylist");
        assert_eq!(sanitize_key("///"), "value");
    }
}
