//! The two system operations the CLI drives, and the local transport.

use std::sync::Arc;

use barrier_core::{Barrier, BarrierOptions, FileBackend, KeyStatus, StaticMasterKey};
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::{ConnectionArgs, MASTER_KEY_ENV};
use crate::error::{CliError, CliResult, ClientError};

/// Remote system capability used by the `rotate` command.
///
/// Implemented by whichever transport is in use.
pub trait SystemClient {
    /// Install a new barrier key.
    fn rotate(&self) -> Result<(), ClientError>;

    /// Active key term and install time.
    fn key_status(&self) -> Result<KeyStatus, ClientError>;
}

/// In-process client driving a `Barrier` directly.
#[derive(Debug)]
pub struct LocalClient {
    barrier: Barrier,
}

impl LocalClient {
    pub fn new(barrier: Barrier) -> Self {
        Self { barrier }
    }

    pub fn barrier(&self) -> &Barrier {
        &self.barrier
    }
}

impl SystemClient for LocalClient {
    fn rotate(&self) -> Result<(), ClientError> {
        self.barrier.rotate()?;
        Ok(())
    }

    fn key_status(&self) -> Result<KeyStatus, ClientError> {
        Ok(self.barrier.key_status()?)
    }
}

/// Build a client for `conn.address`.
///
/// Only `file://<dir>` addresses are served, by opening the barrier stored
/// under `<dir>` in-process with the hex master key from `master_key_hex`.
pub fn connect(conn: &ConnectionArgs, master_key_hex: Option<&str>) -> CliResult<LocalClient> {
    let address = conn.address.as_deref().ok_or_else(|| {
        CliError::client_init("no server address configured (set -address or BARRIER_ADDR)")
    })?;
    let dir = address.strip_prefix("file://").ok_or_else(|| {
        CliError::client_init(format!(
            "unsupported address {address:?}: only file:// addresses are supported"
        ))
    })?;
    if dir.is_empty() {
        return Err(CliError::client_init("file:// address has no directory"));
    }
    if let Some(ca) = conn.ca_source() {
        debug!(ca = %ca.display(), "ignoring CA configuration for local address");
    }

    let master_hex = master_key_hex
        .ok_or_else(|| CliError::client_init(format!("{MASTER_KEY_ENV} is not set")))?;
    let master_bytes = Zeroizing::new(
        hex::decode(master_hex.trim())
            .map_err(|e| CliError::client_init(format!("invalid {MASTER_KEY_ENV}: {e}")))?,
    );
    let master =
        StaticMasterKey::new(&master_bytes).map_err(|e| CliError::client_init(e.to_string()))?;

    let backend = FileBackend::new(dir).map_err(|e| CliError::client_init(e.to_string()))?;
    let barrier = Barrier::open(BarrierOptions::new(Arc::new(backend), Arc::new(master)))
        .map_err(|e| CliError::client_init(e.to_string()))?;
    debug!(dir, initialized = barrier.is_initialized(), "opened local barrier");
    Ok(LocalClient::new(barrier))
}
