//! Cryptographic primitives for the storage barrier.
//!
//! - AES-256-GCM sealing with caller-supplied nonce and AAD
//! - HKDF-SHA256 derivation of purpose-bound keys
//! - Random key and nonce generation
//!
//! Framing (version bytes, terms, nonce placement) belongs to the callers.

pub mod aes_gcm;
pub mod error;
pub mod hkdf;
pub mod keygen;
pub mod types;

pub use aes_gcm::KeyCipher;
pub use error::CryptoError;
pub use hkdf::hkdf_derive;
pub use keygen::{generate_key, generate_nonce};
pub use types::{AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH};
