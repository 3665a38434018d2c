//! AES-256-GCM sealing with explicit nonce and AAD.
//!
//! Output of [`KeyCipher::seal`] is `ciphertext || tag`; the nonce is
//! returned separately so callers can place it in their own framing.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::error::CryptoError;
use crate::keygen::generate_nonce;
use crate::types::{AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH};

/// An initialized AES-256-GCM cipher for one key.
///
/// The key schedule is computed once; `aes-gcm` zeroizes it on drop.
#[derive(Clone)]
pub struct KeyCipher {
    cipher: Aes256Gcm,
}

impl KeyCipher {
    /// Create a cipher from 32 bytes of raw key material.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != AES_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: AES_KEY_LENGTH,
                got: key.len(),
            });
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Encrypt under a fresh random nonce.
    ///
    /// Returns `(nonce, ciphertext || tag)`.
    pub fn seal(
        &self,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<([u8; AES_GCM_NONCE_LENGTH], Vec<u8>), CryptoError> {
        let nonce = generate_nonce()?;
        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        Ok((nonce, ciphertext))
    }

    /// Verify and decrypt `ciphertext || tag`.
    ///
    /// Any tag mismatch yields `DecryptionFailed`; no plaintext is released.
    pub fn open(&self, nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if nonce.len() != AES_GCM_NONCE_LENGTH {
            return Err(CryptoError::InvalidNonceLength {
                expected: AES_GCM_NONCE_LENGTH,
                got: nonce.len(),
            });
        }
        if ciphertext.len() < AES_GCM_TAG_LENGTH {
            return Err(CryptoError::DataTooShort);
        }
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

impl std::fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyCipher(..)")
    }
}
