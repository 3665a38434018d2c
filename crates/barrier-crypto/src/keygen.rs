//! Random key and nonce generation backed by the OS RNG.

use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::types::{AES_GCM_NONCE_LENGTH, AES_KEY_LENGTH};

/// Generate a random 256-bit key. The buffer is wiped when dropped.
pub fn generate_key() -> Result<Zeroizing<[u8; AES_KEY_LENGTH]>, CryptoError> {
    let mut key = Zeroizing::new([0u8; AES_KEY_LENGTH]);
    getrandom::getrandom(&mut key[..]).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(key)
}

/// Generate a random 96-bit AES-GCM nonce.
pub fn generate_nonce() -> Result<[u8; AES_GCM_NONCE_LENGTH], CryptoError> {
    let mut nonce = [0u8; AES_GCM_NONCE_LENGTH];
    getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroize;

    #[test]
    fn generate_key_is_32_bytes() {
        let key = generate_key().unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn generate_key_is_unique() {
        let a = generate_key().unwrap();
        let b = generate_key().unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn generated_key_can_be_wiped_in_place() {
        let mut key = generate_key().unwrap();
        assert_ne!(*key, [0u8; 32]);
        key.zeroize();
        assert_eq!(*key, [0u8; 32]);
    }

    #[test]
    fn generate_nonce_is_12_bytes_and_unique() {
        let a = generate_nonce().unwrap();
        let b = generate_nonce().unwrap();
        assert_eq!(a.len(), 12);
        assert_ne!(a, b);
    }
}
