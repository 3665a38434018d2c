//! A single installed barrier key.

use barrier_crypto::{generate_key, KeyCipher, AES_KEY_LENGTH};
use chrono::{DateTime, SubsecRound, Utc};
use zeroize::Zeroize;

use crate::error::{BarrierError, Result};

/// Immutable key material for one term.
///
/// Install times are kept at millisecond precision so that a keyring
/// survives a serialize/deserialize cycle unchanged.
pub struct Key {
    term: u32,
    bytes: [u8; AES_KEY_LENGTH],
    install_time: DateTime<Utc>,
    cipher: KeyCipher,
}

impl Key {
    /// Build a key from raw material.
    ///
    /// # Arguments
    /// * `term` - Generation number (must be >= 1)
    /// * `bytes` - 32-byte AES-256 key
    /// * `install_time` - When the key was installed
    pub fn new(term: u32, bytes: &[u8], install_time: DateTime<Utc>) -> Result<Self> {
        if term == 0 {
            return Err(BarrierError::TermSequence {
                expected: 1,
                got: 0,
            });
        }
        let cipher = KeyCipher::new(bytes)?;
        let mut material = [0u8; AES_KEY_LENGTH];
        material.copy_from_slice(bytes);
        Ok(Self {
            term,
            bytes: material,
            install_time: install_time.trunc_subsecs(3),
            cipher,
        })
    }

    /// Generate fresh random key material for `term`.
    pub fn generate(term: u32, install_time: DateTime<Utc>) -> Result<Self> {
        let bytes = generate_key()?;
        Self::new(term, &bytes[..], install_time)
    }

    pub fn term(&self) -> u32 {
        self.term
    }

    pub fn install_time(&self) -> DateTime<Utc> {
        self.install_time
    }

    /// Raw key material. Only the keyring serializer needs this.
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn cipher(&self) -> &KeyCipher {
        &self.cipher
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("term", &self.term)
            .field("install_time", &self.install_time)
            .finish_non_exhaustive()
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}
