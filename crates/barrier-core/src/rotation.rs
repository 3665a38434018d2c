//! Online key rotation.
//!
//! A rotation moves `Idle -> Rotating -> Idle` and either fully commits or
//! fully aborts:
//!
//! 1. Begin: take the rotation lock without waiting.
//! 2. GenerateKey: fresh key at `active_term + 1`, install time from the clock.
//! 3. StageKeyring: candidate = live keyring + new key; live is untouched.
//! 4. Persist: seal the candidate and write it through `KeyringStore`.
//! 5. Commit: swap the live snapshot pointer.
//!
//! Anything that fails before step 5 leaves no trace readers can observe.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{BarrierError, Result};
use crate::handle::KeyringHandle;
use crate::key::Key;
use crate::keyring::Keyring;
use crate::status::KeyStatus;
use crate::store::KeyringStore;

/// Serializes keyring changes and publishes them atomically.
pub struct RotationManager {
    keyring: KeyringHandle,
    store: Arc<KeyringStore>,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl RotationManager {
    pub fn new(keyring: KeyringHandle, store: Arc<KeyringStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            keyring,
            store,
            clock,
            lock: Mutex::new(()),
        }
    }

    /// Whether a rotation (or initialization) currently holds the lock.
    pub fn is_rotating(&self) -> bool {
        self.lock.is_locked()
    }

    /// Install a new active key. Existing terms stay available for decrypt.
    pub fn rotate(&self) -> Result<KeyStatus> {
        let _guard = self
            .lock
            .try_lock()
            .ok_or(BarrierError::RotationInProgress)?;

        let live = self.keyring.current()?;
        let previous = live.active_key();
        let term = live.next_term()?;

        let key = Key::generate(term, self.clock.now())?;
        if key.install_time() < previous.install_time() {
            let err = BarrierError::ClockRegression {
                previous: previous.install_time(),
                candidate: key.install_time(),
            };
            return Err(abort(term, err));
        }

        let candidate = live.with_key(key).map_err(|e| abort(term, e))?;
        debug!(term, "staged candidate keyring");

        self.commit(candidate).map_err(|e| abort(term, e))
    }

    /// Install term 1 on a barrier that has never held a keyring.
    pub fn install_initial(&self) -> Result<KeyStatus> {
        let _guard = self
            .lock
            .try_lock()
            .ok_or(BarrierError::RotationInProgress)?;

        if self.keyring.is_initialized() || self.store.exists()? {
            return Err(BarrierError::AlreadyInitialized);
        }

        let keyring = Keyring::new(Key::generate(1, self.clock.now())?)?;
        let status = self.commit(keyring)?;
        info!(term = status.term, "initialized barrier keyring");
        Ok(status)
    }

    /// Publish whatever keyring is persisted. Returns its status, if any.
    pub fn reload(&self) -> Result<Option<KeyStatus>> {
        let _guard = self
            .lock
            .try_lock()
            .ok_or(BarrierError::RotationInProgress)?;

        match self.store.load()? {
            Some(keyring) => {
                let keyring = Arc::new(keyring);
                let status = KeyStatus::of(keyring.active_key());
                let terms = keyring.len();
                self.keyring.publish(keyring);
                info!(term = status.term, terms, "loaded barrier keyring");
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    /// Persist, then publish. Callers hold the lock.
    fn commit(&self, candidate: Keyring) -> Result<KeyStatus> {
        self.store.put(&candidate)?;

        let candidate = Arc::new(candidate);
        let status = KeyStatus::of(candidate.active_key());
        self.keyring.publish(candidate);
        info!(
            term = status.term,
            install_time = %status.install_time,
            "installed barrier key"
        );
        Ok(status)
    }
}

fn abort(term: u32, err: BarrierError) -> BarrierError {
    warn!(term, error = %err, "key rotation aborted");
    err
}

impl std::fmt::Debug for RotationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationManager")
            .field("keyring", &self.keyring)
            .field("rotating", &self.is_rotating())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::master::StaticMasterKey;
    use crate::storage::{MemoryBackend, StorageBackend, StorageError};
    use crate::store::DEFAULT_KEYRING_PATH;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory backend whose writes can be made to fail.
    #[derive(Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        fail_puts: AtomicBool,
    }

    impl StorageBackend for FlakyBackend {
        fn put(&self, path: &str, value: &[u8]) -> std::result::Result<(), StorageError> {
            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(StorageError::new("injected write failure"));
            }
            self.inner.put(path, value)
        }

        fn get(&self, path: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
            self.inner.get(path)
        }
    }

    struct Fixture {
        manager: RotationManager,
        handle: KeyringHandle,
        backend: Arc<FlakyBackend>,
        clock: Arc<ManualClock>,
        store: Arc<KeyringStore>,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(FlakyBackend::default());
        let store = Arc::new(KeyringStore::new(
            backend.clone(),
            Arc::new(StaticMasterKey::new(&[7u8; 32]).unwrap()),
            DEFAULT_KEYRING_PATH,
        ));
        let clock = Arc::new(ManualClock::new(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ));
        let handle = KeyringHandle::empty();
        let manager = RotationManager::new(handle.clone(), store.clone(), clock.clone());
        Fixture {
            manager,
            handle,
            backend,
            clock,
            store,
        }
    }

    #[test]
    fn rotate_before_initialize_fails() {
        let f = fixture();
        assert!(matches!(
            f.manager.rotate().unwrap_err(),
            BarrierError::NotInitialized
        ));
    }

    #[test]
    fn install_initial_then_rotate() {
        let f = fixture();
        let first = f.manager.install_initial().unwrap();
        assert_eq!(first.term, 1);

        f.clock.advance(Duration::seconds(10));
        let second = f.manager.rotate().unwrap();
        assert_eq!(second.term, 2);
        assert_eq!(second.install_time, first.install_time + Duration::seconds(10));
        assert_eq!(f.handle.current().unwrap().active_term(), 2);
        assert!(!f.manager.is_rotating());
    }

    #[test]
    fn install_initial_twice_fails() {
        let f = fixture();
        f.manager.install_initial().unwrap();
        assert!(matches!(
            f.manager.install_initial().unwrap_err(),
            BarrierError::AlreadyInitialized
        ));
    }

    #[test]
    fn install_initial_refuses_to_clobber_persisted_keyring() {
        let f = fixture();
        f.manager.install_initial().unwrap();

        let fresh_handle = KeyringHandle::empty();
        let other = RotationManager::new(fresh_handle, f.store.clone(), f.clock.clone());
        assert!(matches!(
            other.install_initial().unwrap_err(),
            BarrierError::AlreadyInitialized
        ));
    }

    #[test]
    fn rotation_is_persisted() {
        let f = fixture();
        f.manager.install_initial().unwrap();
        f.manager.rotate().unwrap();
        f.manager.rotate().unwrap();

        let persisted = f.store.load().unwrap().unwrap();
        assert_eq!(persisted.terms().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn storage_failure_leaves_live_keyring_untouched() {
        let f = fixture();
        f.manager.install_initial().unwrap();
        let before = f.handle.current().unwrap();

        f.backend.fail_puts.store(true, Ordering::SeqCst);
        let err = f.manager.rotate().unwrap_err();
        assert!(matches!(err, BarrierError::StorageWrite(_)));
        assert!(err.is_retryable());

        let after = f.handle.current().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(f.store.load().unwrap().unwrap().active_term(), 1);
        assert!(!f.manager.is_rotating());

        f.backend.fail_puts.store(false, Ordering::SeqCst);
        assert_eq!(f.manager.rotate().unwrap().term, 2);
    }

    #[test]
    fn clock_regression_aborts() {
        let f = fixture();
        f.manager.install_initial().unwrap();
        f.clock.advance(Duration::seconds(-1));

        let err = f.manager.rotate().unwrap_err();
        assert!(matches!(err, BarrierError::ClockRegression { .. }));
        assert_eq!(f.handle.current().unwrap().active_term(), 1);

        f.clock.advance(Duration::seconds(1));
        assert_eq!(f.manager.rotate().unwrap().term, 2);
    }

    #[test]
    fn held_lock_reports_rotation_in_progress() {
        let f = fixture();
        f.manager.install_initial().unwrap();
        let _held = f.manager.lock.lock();
        assert!(f.manager.is_rotating());
        assert!(matches!(
            f.manager.rotate().unwrap_err(),
            BarrierError::RotationInProgress
        ));
    }

    #[test]
    fn reload_publishes_persisted_keyring() {
        let f = fixture();
        f.manager.install_initial().unwrap();
        f.manager.rotate().unwrap();

        let handle = KeyringHandle::empty();
        let restarted = RotationManager::new(handle.clone(), f.store.clone(), f.clock.clone());
        let status = restarted.reload().unwrap().unwrap();
        assert_eq!(status.term, 2);
        assert_eq!(handle.current().unwrap().active_term(), 2);
    }

    #[test]
    fn reload_with_nothing_persisted() {
        let f = fixture();
        assert!(f.manager.reload().unwrap().is_none());
        assert!(!f.handle.is_initialized());
    }
}
