//! Read-only view of the active key generation.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::handle::KeyringHandle;
use crate::key::Key;

/// Active term and when it was installed. Never carries key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStatus {
    pub term: u32,
    pub install_time: DateTime<Utc>,
}

impl KeyStatus {
    pub(crate) fn of(key: &Key) -> Self {
        Self {
            term: key.term(),
            install_time: key.install_time(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyStatusReporter {
    keyring: KeyringHandle,
}

impl KeyStatusReporter {
    pub fn new(keyring: KeyringHandle) -> Self {
        Self { keyring }
    }

    /// Fails with `NotInitialized` until a first key is installed.
    pub fn status(&self) -> Result<KeyStatus> {
        let keyring = self.keyring.current()?;
        Ok(KeyStatus::of(keyring.active_key()))
    }
}
