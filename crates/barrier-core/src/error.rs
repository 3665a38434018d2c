//! Error type shared by the keyring, cipher, storage and rotation layers.

use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BarrierError>;

#[derive(Debug, Error)]
pub enum BarrierError {
    #[error("Key rotation already in progress")]
    RotationInProgress,

    #[error("Clock regression: install time {candidate} precedes previous install time {previous}")]
    ClockRegression {
        previous: DateTime<Utc>,
        candidate: DateTime<Utc>,
    },

    #[error("Term sequence violation: expected term {expected}, got {got}")]
    TermSequence { expected: u32, got: u32 },

    #[error("Term space exhausted at term {0}")]
    TermOverflow(u32),

    #[error("Failed to persist keyring: {0}")]
    StorageWrite(String),

    #[error("Failed to read keyring: {0}")]
    StorageRead(String),

    #[error("No key installed for term {0}")]
    KeyNotFound(u32),

    #[error("Message authentication failed")]
    Authentication,

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u8),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Corrupt keyring: {0}")]
    CorruptKeyring(String),

    #[error("Barrier is not initialized")]
    NotInitialized,

    #[error("Barrier is already initialized")]
    AlreadyInitialized,

    #[error("Master key unavailable: {0}")]
    MasterKey(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] barrier_crypto::CryptoError),
}

impl BarrierError {
    /// Whether retrying the same call may succeed without operator action.
    ///
    /// Failed rotations leave no residual state, so a storage failure or a
    /// lost race for the rotation lock can simply be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BarrierError::RotationInProgress
                | BarrierError::StorageWrite(_)
                | BarrierError::StorageRead(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_kinds_are_retryable() {
        assert!(BarrierError::RotationInProgress.is_retryable());
        assert!(BarrierError::StorageWrite("disk full".into()).is_retryable());
        assert!(BarrierError::StorageRead("timeout".into()).is_retryable());
        assert!(!BarrierError::Authentication.is_retryable());
        assert!(!BarrierError::KeyNotFound(3).is_retryable());
        assert!(!BarrierError::NotInitialized.is_retryable());
    }

    #[test]
    fn messages_include_details() {
        let err = BarrierError::TermSequence {
            expected: 4,
            got: 6,
        };
        assert_eq!(
            err.to_string(),
            "Term sequence violation: expected term 4, got 6"
        );
        assert_eq!(
            BarrierError::KeyNotFound(9).to_string(),
            "No key installed for term 9"
        );
    }
}
