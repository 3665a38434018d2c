//! Encrypt/decrypt against the live keyring.
//!
//! Every envelope carries the term of the key that sealed it, so data
//! written before a rotation decrypts with its original key for as long as
//! that term stays in the keyring. No re-encryption is ever needed.

use tracing::debug;

use crate::envelope::{header_bytes, Envelope, ENVELOPE_FORMAT_VERSION, SUPPORTED_ENVELOPE_VERSIONS};
use crate::error::{BarrierError, Result};
use crate::handle::KeyringHandle;

/// Stateless data-path cipher. Reads the keyring, never modifies it.
#[derive(Debug, Clone)]
pub struct BarrierCipher {
    keyring: KeyringHandle,
}

impl BarrierCipher {
    pub fn new(keyring: KeyringHandle) -> Self {
        Self { keyring }
    }

    /// Encrypt under the active key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Envelope> {
        self.encrypt_with_aad(plaintext, &[])
    }

    /// Encrypt under the active key, additionally binding `aad`
    /// (for example the storage path the envelope is written to).
    pub fn encrypt_with_aad(&self, plaintext: &[u8], aad: &[u8]) -> Result<Envelope> {
        // One snapshot per call: the term stamped and the key used always agree.
        let keyring = self.keyring.current()?;
        let key = keyring.active_key();

        let header = header_bytes(ENVELOPE_FORMAT_VERSION, key.term());
        let (nonce, ciphertext) = key.cipher().seal(plaintext, &bind(&header, aad))?;

        Ok(Envelope {
            format_version: ENVELOPE_FORMAT_VERSION,
            term: key.term(),
            nonce,
            ciphertext,
        })
    }

    /// Verify and decrypt an envelope with the key for its term.
    pub fn decrypt(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        self.decrypt_with_aad(envelope, &[])
    }

    /// Verify and decrypt, checking the same `aad` given at encryption.
    pub fn decrypt_with_aad(&self, envelope: &Envelope, aad: &[u8]) -> Result<Vec<u8>> {
        if !SUPPORTED_ENVELOPE_VERSIONS.contains(&envelope.format_version) {
            return Err(BarrierError::UnsupportedVersion(envelope.format_version));
        }
        let keyring = self.keyring.current()?;
        let key = keyring.get_key(envelope.term)?;

        key.cipher()
            .open(&envelope.nonce, &envelope.ciphertext, &bind(&envelope.header(), aad))
            .map_err(|e| {
                debug!(term = envelope.term, error = %e, "envelope failed verification");
                BarrierError::Authentication
            })
    }

    /// Parse wire bytes and decrypt.
    pub fn decrypt_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decrypt(&Envelope::from_bytes(data)?)
    }
}

fn bind(header: &[u8], aad: &[u8]) -> Vec<u8> {
    let mut bound = Vec::with_capacity(header.len() + aad.len());
    bound.extend_from_slice(header);
    bound.extend_from_slice(aad);
    bound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::keyring::Keyring;
    use chrono::Utc;
    use std::sync::Arc;

    fn cipher_at_term_one() -> (BarrierCipher, KeyringHandle) {
        let ring = Keyring::new(Key::generate(1, Utc::now()).unwrap()).unwrap();
        let handle = KeyringHandle::with_keyring(ring);
        (BarrierCipher::new(handle.clone()), handle)
    }

    fn advance(handle: &KeyringHandle) {
        let live = handle.current().unwrap();
        let next = live
            .with_key(Key::generate(live.next_term().unwrap(), Utc::now()).unwrap())
            .unwrap();
        handle.publish(Arc::new(next));
    }

    #[test]
    fn round_trip() {
        let (cipher, _) = cipher_at_term_one();
        let env = cipher.encrypt(b"secret").unwrap();
        assert_eq!(env.term, 1);
        assert_eq!(env.format_version, ENVELOPE_FORMAT_VERSION);
        assert_eq!(cipher.decrypt(&env).unwrap(), b"secret");
    }

    #[test]
    fn round_trip_through_wire_bytes() {
        let (cipher, _) = cipher_at_term_one();
        let bytes = cipher.encrypt(b"on disk").unwrap().to_bytes();
        assert_eq!(cipher.decrypt_bytes(&bytes).unwrap(), b"on disk");
    }

    #[test]
    fn empty_plaintext() {
        let (cipher, _) = cipher_at_term_one();
        let env = cipher.encrypt(b"").unwrap();
        assert!(cipher.decrypt(&env).unwrap().is_empty());
    }

    #[test]
    fn old_envelopes_decrypt_after_new_term() {
        let (cipher, handle) = cipher_at_term_one();
        let old = cipher.encrypt(b"secret").unwrap();
        advance(&handle);
        advance(&handle);

        let new = cipher.encrypt(b"secret2").unwrap();
        assert_eq!(new.term, 3);
        assert_eq!(cipher.decrypt(&old).unwrap(), b"secret");
        assert_eq!(cipher.decrypt(&new).unwrap(), b"secret2");
    }

    #[test]
    fn uninitialized_fails() {
        let cipher = BarrierCipher::new(KeyringHandle::empty());
        assert!(matches!(
            cipher.encrypt(b"x").unwrap_err(),
            BarrierError::NotInitialized
        ));
    }

    #[test]
    fn unknown_term_fails() {
        let (cipher, _) = cipher_at_term_one();
        let mut env = cipher.encrypt(b"x").unwrap();
        env.term = 42;
        assert!(matches!(
            cipher.decrypt(&env).unwrap_err(),
            BarrierError::KeyNotFound(42)
        ));
    }

    #[test]
    fn unsupported_version_fails() {
        let (cipher, _) = cipher_at_term_one();
        let mut env = cipher.encrypt(b"x").unwrap();
        env.format_version = 7;
        assert!(matches!(
            cipher.decrypt(&env).unwrap_err(),
            BarrierError::UnsupportedVersion(7)
        ));
    }

    #[test]
    fn every_single_bit_flip_is_detected() {
        let (cipher, _) = cipher_at_term_one();
        let env = cipher.encrypt(b"tamper me").unwrap();
        for byte in 0..env.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = env.clone();
                tampered.ciphertext[byte] ^= 1 << bit;
                assert!(matches!(
                    cipher.decrypt(&tampered).unwrap_err(),
                    BarrierError::Authentication
                ));
            }
        }
    }

    #[test]
    fn nonce_tamper_is_detected() {
        let (cipher, _) = cipher_at_term_one();
        let mut env = cipher.encrypt(b"x").unwrap();
        env.nonce[0] ^= 0x01;
        assert!(matches!(
            cipher.decrypt(&env).unwrap_err(),
            BarrierError::Authentication
        ));
    }

    #[test]
    fn repointing_term_is_detected() {
        let (cipher, handle) = cipher_at_term_one();
        advance(&handle);
        let mut env = cipher.encrypt(b"x").unwrap();
        assert_eq!(env.term, 2);
        env.term = 1;
        assert!(matches!(
            cipher.decrypt(&env).unwrap_err(),
            BarrierError::Authentication
        ));
    }

    #[test]
    fn aad_is_bound() {
        let (cipher, _) = cipher_at_term_one();
        let env = cipher.encrypt_with_aad(b"row", b"logical/a").unwrap();
        assert_eq!(cipher.decrypt_with_aad(&env, b"logical/a").unwrap(), b"row");
        assert!(matches!(
            cipher.decrypt_with_aad(&env, b"logical/b").unwrap_err(),
            BarrierError::Authentication
        ));
        assert!(cipher.decrypt(&env).is_err());
    }
}
