//! Key-encrypting key supplied by the unseal process.

use barrier_crypto::AES_KEY_LENGTH;
use zeroize::Zeroizing;

use crate::error::{BarrierError, Result};

/// Source of the master key that seals the persisted keyring.
pub trait MasterKeySource: Send + Sync {
    fn master_key(&self) -> Result<Zeroizing<[u8; AES_KEY_LENGTH]>>;
}

/// A master key already held in memory.
pub struct StaticMasterKey {
    key: Zeroizing<[u8; AES_KEY_LENGTH]>,
}

impl StaticMasterKey {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != AES_KEY_LENGTH {
            return Err(BarrierError::MasterKey(format!(
                "expected {} bytes, got {}",
                AES_KEY_LENGTH,
                key.len()
            )));
        }
        let mut material = Zeroizing::new([0u8; AES_KEY_LENGTH]);
        material.copy_from_slice(key);
        Ok(Self { key: material })
    }
}

impl MasterKeySource for StaticMasterKey {
    fn master_key(&self) -> Result<Zeroizing<[u8; AES_KEY_LENGTH]>> {
        Ok(self.key.clone())
    }
}

impl std::fmt::Debug for StaticMasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticMasterKey(..)")
    }
}
