//! Shared, atomically swappable reference to the live keyring.
//!
//! Readers load a snapshot via `ArcSwapOption::load_full()`, which is
//! lock-free. The only writer is the rotation path, which replaces the
//! whole snapshot with `store()`. A snapshot is never mutated in place.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::error::{BarrierError, Result};
use crate::keyring::Keyring;

/// Cloneable handle to the live keyring of one barrier instance.
#[derive(Clone)]
pub struct KeyringHandle {
    live: Arc<ArcSwapOption<Keyring>>,
}

impl KeyringHandle {
    /// A handle with no keyring installed yet.
    pub fn empty() -> Self {
        Self {
            live: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// A handle already pointing at `keyring`.
    pub fn with_keyring(keyring: Keyring) -> Self {
        Self {
            live: Arc::new(ArcSwapOption::new(Some(Arc::new(keyring)))),
        }
    }

    /// Snapshot of the live keyring, if any.
    pub fn load(&self) -> Option<Arc<Keyring>> {
        self.live.load_full()
    }

    /// Snapshot of the live keyring, or `NotInitialized`.
    pub fn current(&self) -> Result<Arc<Keyring>> {
        self.load().ok_or(BarrierError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.live.load().is_some()
    }

    /// Replace the live keyring. Callers must hold the rotation lock.
    pub(crate) fn publish(&self, keyring: Arc<Keyring>) {
        self.live.store(Some(keyring));
    }
}

impl Default for KeyringHandle {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for KeyringHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.load().map(|k| k.active_term());
        f.debug_struct("KeyringHandle")
            .field("active_term", &active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use chrono::Utc;

    #[test]
    fn empty_handle_is_not_initialized() {
        let handle = KeyringHandle::empty();
        assert!(!handle.is_initialized());
        assert!(matches!(
            handle.current().unwrap_err(),
            BarrierError::NotInitialized
        ));
    }

    #[test]
    fn publish_is_visible_to_clones() {
        let handle = KeyringHandle::empty();
        let reader = handle.clone();
        let ring = Keyring::new(Key::generate(1, Utc::now()).unwrap()).unwrap();
        handle.publish(Arc::new(ring));
        assert_eq!(reader.current().unwrap().active_term(), 1);
    }

    #[test]
    fn old_snapshot_survives_publish() {
        let ring = Keyring::new(Key::generate(1, Utc::now()).unwrap()).unwrap();
        let handle = KeyringHandle::with_keyring(ring);
        let before = handle.current().unwrap();

        let next = before
            .with_key(Key::generate(2, Utc::now()).unwrap())
            .unwrap();
        handle.publish(Arc::new(next));

        assert_eq!(before.active_term(), 1);
        assert_eq!(handle.current().unwrap().active_term(), 2);
    }
}
