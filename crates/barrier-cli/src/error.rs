//! CLI error types and exit codes.

use barrier_core::BarrierError;
use thiserror::Error;

/// Failure reported by a `SystemClient` implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Barrier(#[from] BarrierError),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Flags(String),

    #[error("Error initializing client: {0}")]
    ClientInit(String),

    #[error("Error with key rotation: {0}")]
    Rotate(#[source] ClientError),

    #[error("Error reading key status: {0}")]
    KeyStatus(#[source] ClientError),

    #[error("Error writing output: {0}")]
    Output(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn client_init(message: impl Into<String>) -> Self {
        CliError::ClientInit(message.into())
    }

    /// 1 for flag parsing failures, 2 for anything after parsing.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Flags(_) => 1,
            _ => 2,
        }
    }
}
