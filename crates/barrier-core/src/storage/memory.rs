//! In-memory storage backend.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::{StorageBackend, StorageError};

/// Process-local backend. Each `put` swaps the whole value under a write
/// lock, which satisfies the per-path atomicity contract trivially.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored paths.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn put(&self, path: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries.write().insert(path.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().get(path).cloned())
    }
}
