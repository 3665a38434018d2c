//! Durable, sealed persistence of the keyring.
//!
//! Blob format v1:
//! [1 byte: version=1][12 bytes: nonce][N bytes: AES-256-GCM(keyring CBOR) + tag]
//!
//! The sealing key is derived from the master key with HKDF-SHA256 and the
//! storage path is bound as AAD, so a blob copied to another path does not
//! unseal.

use std::sync::Arc;

use barrier_crypto::{hkdf_derive, KeyCipher, AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{BarrierError, Result};
use crate::keyring::Keyring;
use crate::master::MasterKeySource;
use crate::storage::StorageBackend;

/// Storage path of the sealed keyring unless configured otherwise.
pub const DEFAULT_KEYRING_PATH: &str = "core/keyring";

/// Sealed keyring blob version.
pub const KEYRING_BLOB_VERSION: u8 = 1;

const KEYRING_SALT: &[u8] = b"barrier:keyring-salt:v1";
const KEYRING_INFO: &[u8] = b"barrier:keyring:v1";

/// Reads and writes the sealed keyring through a storage backend.
pub struct KeyringStore {
    backend: Arc<dyn StorageBackend>,
    master: Arc<dyn MasterKeySource>,
    path: String,
}

impl KeyringStore {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        master: Arc<dyn MasterKeySource>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            master,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Seal and write `keyring`. The backend write is all-or-nothing.
    pub fn put(&self, keyring: &Keyring) -> Result<()> {
        let blob = self.seal(keyring)?;
        self.backend
            .put(&self.path, &blob)
            .map_err(|e| BarrierError::StorageWrite(e.to_string()))?;
        debug!(path = %self.path, term = keyring.active_term(), "persisted sealed keyring");
        Ok(())
    }

    /// Read and unseal the keyring. `Ok(None)` if none was ever written.
    pub fn load(&self) -> Result<Option<Keyring>> {
        match self.read_blob()? {
            Some(blob) => {
                let keyring = self.unseal(&blob)?;
                debug!(path = %self.path, term = keyring.active_term(), "loaded sealed keyring");
                Ok(Some(keyring))
            }
            None => Ok(None),
        }
    }

    /// Whether a keyring blob exists, without unsealing it.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.read_blob()?.is_some())
    }

    fn read_blob(&self) -> Result<Option<Vec<u8>>> {
        self.backend
            .get(&self.path)
            .map_err(|e| BarrierError::StorageRead(e.to_string()))
    }

    /// Encrypt the serialized keyring under the master key.
    pub fn seal(&self, keyring: &Keyring) -> Result<Vec<u8>> {
        let cipher = self.sealing_cipher()?;
        let plaintext = Zeroizing::new(keyring.serialize()?);
        let (nonce, ciphertext) = cipher.seal(&plaintext, self.path.as_bytes())?;

        let mut blob = Vec::with_capacity(1 + nonce.len() + ciphertext.len());
        blob.push(KEYRING_BLOB_VERSION);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt and decode a sealed keyring blob.
    pub fn unseal(&self, blob: &[u8]) -> Result<Keyring> {
        let (&version, rest) = blob
            .split_first()
            .ok_or_else(|| BarrierError::CorruptKeyring("empty keyring blob".into()))?;
        if version != KEYRING_BLOB_VERSION {
            return Err(BarrierError::UnsupportedVersion(version));
        }
        if rest.len() < AES_GCM_NONCE_LENGTH + AES_GCM_TAG_LENGTH {
            return Err(BarrierError::CorruptKeyring("keyring blob too short".into()));
        }
        let (nonce, ciphertext) = rest.split_at(AES_GCM_NONCE_LENGTH);

        let cipher = self.sealing_cipher()?;
        let plaintext = Zeroizing::new(
            cipher
                .open(nonce, ciphertext, self.path.as_bytes())
                .map_err(|_| BarrierError::Authentication)?,
        );
        Keyring::deserialize(&plaintext)
    }

    fn sealing_cipher(&self) -> Result<KeyCipher> {
        let master = self.master.master_key()?;
        let sealing_key = hkdf_derive(&master[..], KEYRING_SALT, KEYRING_INFO)?;
        KeyCipher::new(&sealing_key[..]).map_err(BarrierError::from)
    }
}

impl std::fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
