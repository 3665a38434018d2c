//! The ordered set of every installed key plus the active term.
//!
//! Serialized form (CBOR, sealed by `KeyringStore` before it is persisted):
//! `{ v: 1, active: <term>, keys: [{ term, key: bytes, installed_ms }] }`
//! with keys in ascending term order.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{BarrierError, Result};
use crate::key::Key;

/// Current keyring record version.
pub const KEYRING_RECORD_VERSION: u8 = 1;

/// All keys ever installed, indexed by term.
///
/// Keys are shared by `Arc` between snapshots: staging a rotation clones the
/// map, never the key material.
#[derive(Debug, Clone)]
pub struct Keyring {
    keys: BTreeMap<u32, Arc<Key>>,
    active_term: u32,
}

#[derive(Serialize, Deserialize)]
struct KeyringRecord {
    v: u8,
    active: u32,
    keys: Vec<KeyRecord>,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct KeyRecord {
    term: u32,
    #[serde(with = "serde_bytes")]
    key: Vec<u8>,
    installed_ms: i64,
}

impl Keyring {
    /// Start a keyring from its first key, which must be term 1.
    pub fn new(first: Key) -> Result<Self> {
        if first.term() != 1 {
            return Err(BarrierError::TermSequence {
                expected: 1,
                got: first.term(),
            });
        }
        let active_term = first.term();
        let mut keys = BTreeMap::new();
        keys.insert(active_term, Arc::new(first));
        Ok(Self { keys, active_term })
    }

    /// Append the next key and make it active.
    ///
    /// The key's term must be exactly `active_term + 1` and its install time
    /// must not precede the current active key's.
    pub fn add_key(&mut self, key: Key) -> Result<()> {
        let expected = self.next_term()?;
        if key.term() != expected {
            return Err(BarrierError::TermSequence {
                expected,
                got: key.term(),
            });
        }
        let previous = self.active_key().install_time();
        if key.install_time() < previous {
            return Err(BarrierError::ClockRegression {
                previous,
                candidate: key.install_time(),
            });
        }
        self.active_term = key.term();
        self.keys.insert(key.term(), Arc::new(key));
        Ok(())
    }

    /// A copy of this keyring with `key` appended. `self` is left untouched.
    pub fn with_key(&self, key: Key) -> Result<Self> {
        let mut staged = self.clone();
        staged.add_key(key)?;
        Ok(staged)
    }

    /// Look up the key for `term`.
    pub fn get_key(&self, term: u32) -> Result<&Arc<Key>> {
        self.keys.get(&term).ok_or(BarrierError::KeyNotFound(term))
    }

    /// The key new writes are encrypted under.
    pub fn active_key(&self) -> &Arc<Key> {
        // active_term is only ever set to a term that was just inserted
        &self.keys[&self.active_term]
    }

    pub fn active_term(&self) -> u32 {
        self.active_term
    }

    /// The term a rotation would install next.
    pub fn next_term(&self) -> Result<u32> {
        self.active_term
            .checked_add(1)
            .ok_or(BarrierError::TermOverflow(self.active_term))
    }

    /// Installed terms in ascending order.
    pub fn terms(&self) -> impl Iterator<Item = u32> + '_ {
        self.keys.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Encode every term, key, and install time as CBOR.
    ///
    /// The returned buffer holds raw key material; callers should zeroize it.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let record = KeyringRecord {
            v: KEYRING_RECORD_VERSION,
            active: self.active_term,
            keys: self
                .keys
                .values()
                .map(|k| KeyRecord {
                    term: k.term(),
                    key: k.bytes().to_vec(),
                    installed_ms: k.install_time().timestamp_millis(),
                })
                .collect(),
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&record, &mut buf)
            .map_err(|e| BarrierError::CorruptKeyring(format!("CBOR encode: {}", e)))?;
        Ok(buf)
    }

    /// Decode a keyring, re-checking every sequencing invariant.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let record: KeyringRecord = ciborium::from_reader(data)
            .map_err(|e| BarrierError::CorruptKeyring(format!("CBOR decode: {}", e)))?;
        if record.v != KEYRING_RECORD_VERSION {
            return Err(BarrierError::UnsupportedVersion(record.v));
        }

        let mut entries = record.keys.iter();
        let first = entries
            .next()
            .ok_or_else(|| BarrierError::CorruptKeyring("no keys".into()))?;
        let mut keyring = Self::new(decode_key(first)?).map_err(corrupt)?;
        for entry in entries {
            keyring.add_key(decode_key(entry)?).map_err(corrupt)?;
        }

        if keyring.active_term != record.active {
            return Err(BarrierError::CorruptKeyring(format!(
                "active term {} does not match newest term {}",
                record.active, keyring.active_term
            )));
        }
        Ok(keyring)
    }
}

fn decode_key(record: &KeyRecord) -> Result<Key> {
    let installed = Utc
        .timestamp_millis_opt(record.installed_ms)
        .single()
        .ok_or_else(|| {
            BarrierError::CorruptKeyring(format!(
                "term {} has invalid install time {}",
                record.term, record.installed_ms
            ))
        })?;
    Key::new(record.term, &record.key, installed).map_err(corrupt)
}

fn corrupt(err: BarrierError) -> BarrierError {
    BarrierError::CorruptKeyring(err.to_string())
}
