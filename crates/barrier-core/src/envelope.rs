//! Self-describing ciphertext produced by the barrier.
//!
//! Wire format v1:
//! [1 byte: version=1][4 bytes: term BE][12 bytes: nonce][N bytes: ciphertext + tag]
//!
//! The 5-byte header is authenticated as AAD, so an envelope cannot be
//! re-pointed at a different term without failing verification.

use barrier_crypto::{AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH};

use crate::error::{BarrierError, Result};

/// Envelope format version written by `encrypt`.
pub const ENVELOPE_FORMAT_VERSION: u8 = 1;

/// Envelope versions accepted by `decrypt`.
pub const SUPPORTED_ENVELOPE_VERSIONS: &[u8] = &[1];

/// Version byte plus big-endian term.
pub const ENVELOPE_HEADER_LENGTH: usize = 5;

/// Smallest well-formed envelope: header, nonce, and a bare tag.
pub const MIN_ENVELOPE_LENGTH: usize =
    ENVELOPE_HEADER_LENGTH + AES_GCM_NONCE_LENGTH + AES_GCM_TAG_LENGTH;

/// One encrypted payload, stamped with the term of the key that sealed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub format_version: u8,
    pub term: u32,
    pub nonce: [u8; AES_GCM_NONCE_LENGTH],
    /// Ciphertext with the 16-byte GCM tag appended.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Header bytes bound into the AEAD as associated data.
    pub fn header(&self) -> [u8; ENVELOPE_HEADER_LENGTH] {
        header_bytes(self.format_version, self.term)
    }

    /// Encode to the v1 wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(ENVELOPE_HEADER_LENGTH + AES_GCM_NONCE_LENGTH + self.ciphertext.len());
        out.extend_from_slice(&self.header());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse the wire format.
    ///
    /// The version is checked before the length, since an unknown version
    /// may use a different layout.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (&format_version, rest) = data
            .split_first()
            .ok_or_else(|| BarrierError::MalformedEnvelope("empty input".into()))?;
        if !SUPPORTED_ENVELOPE_VERSIONS.contains(&format_version) {
            return Err(BarrierError::UnsupportedVersion(format_version));
        }
        if data.len() < MIN_ENVELOPE_LENGTH {
            return Err(BarrierError::MalformedEnvelope(format!(
                "expected at least {} bytes, got {}",
                MIN_ENVELOPE_LENGTH,
                data.len()
            )));
        }

        let (term_bytes, rest) = rest.split_at(4);
        let (nonce_bytes, ciphertext) = rest.split_at(AES_GCM_NONCE_LENGTH);
        let mut term = [0u8; 4];
        term.copy_from_slice(term_bytes);
        let mut nonce = [0u8; AES_GCM_NONCE_LENGTH];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            format_version,
            term: u32::from_be_bytes(term),
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

pub(crate) fn header_bytes(format_version: u8, term: u32) -> [u8; ENVELOPE_HEADER_LENGTH] {
    let mut header = [0u8; ENVELOPE_HEADER_LENGTH];
    header[0] = format_version;
    header[1..].copy_from_slice(&term.to_be_bytes());
    header
}
