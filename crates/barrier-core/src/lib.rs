//! Storage encryption barrier with a multi-term keyring and online rotation.
//!
//! Every payload is sealed under the active key and stamped with that key's
//! term. Rotation adds a term and atomically swaps the live keyring
//! snapshot, so payloads written under older terms keep decrypting and
//! concurrent readers never observe a partial keyring.

pub mod barrier;
pub mod cipher;
pub mod clock;
pub mod envelope;
pub mod error;
pub mod handle;
pub mod key;
pub mod keyring;
pub mod master;
pub mod rotation;
pub mod status;
pub mod storage;
pub mod store;

pub use barrier::{Barrier, BarrierOptions};
pub use cipher::BarrierCipher;
pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::{Envelope, ENVELOPE_FORMAT_VERSION, MIN_ENVELOPE_LENGTH};
pub use error::{BarrierError, Result};
pub use handle::KeyringHandle;
pub use key::Key;
pub use keyring::Keyring;
pub use master::{MasterKeySource, StaticMasterKey};
pub use rotation::RotationManager;
pub use status::{KeyStatus, KeyStatusReporter};
pub use storage::{FileBackend, MemoryBackend, StorageBackend, StorageError};
pub use store::{KeyringStore, DEFAULT_KEYRING_PATH};
