//! HKDF-SHA256 key derivation.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::types::AES_KEY_LENGTH;

/// Derive a 256-bit key using HKDF-SHA256. The output is wiped when dropped.
///
/// # Arguments
/// * `ikm` - Input keying material (32 bytes)
/// * `salt` - Salt for domain separation
/// * `info` - Context and application-specific info
pub fn hkdf_derive(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
) -> Result<Zeroizing<[u8; AES_KEY_LENGTH]>, CryptoError> {
    if ikm.len() != AES_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: AES_KEY_LENGTH,
            got: ikm.len(),
        });
    }
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = Zeroizing::new([0u8; AES_KEY_LENGTH]);
    hk.expand(info, &mut okm[..])
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    Ok(okm)
}
