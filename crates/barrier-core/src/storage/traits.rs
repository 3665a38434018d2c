//! Storage collaborator consumed by the keyring store.

use thiserror::Error;

/// Durable key/value storage for sealed blobs.
///
/// # Contract
/// - `put` is all-or-nothing for a single path: no reader ever observes a
///   half-written value.
/// - A `get` following a successful `put` on the same path observes the new
///   value.
///
/// No cross-path transactions are required.
pub trait StorageBackend: Send + Sync {
    fn put(&self, path: &str, value: &[u8]) -> Result<(), StorageError>;

    /// `Ok(None)` when nothing has been written at `path`.
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Backend-level failure (wraps arbitrary error strings from the backend).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
