//! Filesystem storage backend.
//!
//! Each path maps to one file under the root directory. Writes go to a
//! temporary file in the same directory, are fsynced, then renamed over the
//! target, so a crash leaves either the old or the new blob.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::traits::{StorageBackend, StorageError};

#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Use `root` as the storage directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical path, refusing anything that escapes the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::new(format!("invalid storage path: {path:?}")));
        }
        Ok(self.root.join(relative))
    }
}

impl StorageBackend for FileBackend {
    fn put(&self, path: &str, value: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        let dir = target
            .parent()
            .ok_or_else(|| StorageError::new(format!("no parent directory for {path:?}")))?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(value)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| StorageError::from(e.error))?;
        debug!(path, bytes = value.len(), "wrote storage entry");
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let target = self.resolve(path)?;
        match fs::read(&target) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
