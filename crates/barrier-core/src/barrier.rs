//! One barrier engine instance: keyring handle, cipher, rotation, status.

use std::sync::Arc;

use crate::cipher::BarrierCipher;
use crate::clock::{Clock, SystemClock};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::handle::KeyringHandle;
use crate::master::MasterKeySource;
use crate::rotation::RotationManager;
use crate::status::{KeyStatus, KeyStatusReporter};
use crate::storage::StorageBackend;
use crate::store::{KeyringStore, DEFAULT_KEYRING_PATH};

/// Configuration for `Barrier`.
pub struct BarrierOptions {
    pub storage: Arc<dyn StorageBackend>,
    pub master_key: Arc<dyn MasterKeySource>,
    /// Install-time source (default: `SystemClock`)
    pub clock: Option<Arc<dyn Clock>>,
    /// Storage path of the sealed keyring (default: `core/keyring`)
    pub keyring_path: Option<String>,
}

impl BarrierOptions {
    pub fn new(storage: Arc<dyn StorageBackend>, master_key: Arc<dyn MasterKeySource>) -> Self {
        Self {
            storage,
            master_key,
            clock: None,
            keyring_path: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_keyring_path(mut self, path: impl Into<String>) -> Self {
        self.keyring_path = Some(path.into());
        self
    }
}

/// The storage encryption barrier.
///
/// Encrypt, decrypt and status calls read a lock-free snapshot of the
/// keyring and may run from any number of threads while `rotate` runs.
#[derive(Debug)]
pub struct Barrier {
    handle: KeyringHandle,
    cipher: BarrierCipher,
    reporter: KeyStatusReporter,
    rotation: RotationManager,
}

impl Barrier {
    /// Build an engine with no keyring loaded.
    pub fn new(options: BarrierOptions) -> Self {
        let path = options
            .keyring_path
            .unwrap_or_else(|| DEFAULT_KEYRING_PATH.to_string());
        let clock = options.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = Arc::new(KeyringStore::new(options.storage, options.master_key, path));

        let handle = KeyringHandle::empty();
        Self {
            cipher: BarrierCipher::new(handle.clone()),
            reporter: KeyStatusReporter::new(handle.clone()),
            rotation: RotationManager::new(handle.clone(), store, clock),
            handle,
        }
    }

    /// Build an engine and load the persisted keyring, if there is one.
    pub fn open(options: BarrierOptions) -> Result<Self> {
        let barrier = Self::new(options);
        barrier.rotation.reload()?;
        Ok(barrier)
    }

    /// Install and persist the first key (term 1).
    pub fn initialize(&self) -> Result<KeyStatus> {
        self.rotation.install_initial()
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.is_initialized()
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Envelope> {
        self.cipher.encrypt(plaintext)
    }

    pub fn decrypt(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        self.cipher.decrypt(envelope)
    }

    /// Install a new active key; see `RotationManager::rotate`.
    pub fn rotate(&self) -> Result<KeyStatus> {
        self.rotation.rotate()
    }

    pub fn key_status(&self) -> Result<KeyStatus> {
        self.reporter.status()
    }

    /// Shared keyring handle, for wiring additional readers.
    pub fn handle(&self) -> &KeyringHandle {
        &self.handle
    }

    pub fn cipher(&self) -> &BarrierCipher {
        &self.cipher
    }

    pub fn status_reporter(&self) -> &KeyStatusReporter {
        &self.reporter
    }
}
