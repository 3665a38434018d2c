//! Barrier CLI
//!
//! ```text
//! barrier rotate [-address=addr] [-ca-cert=path] [-ca-path=path] [-tls-skip-verify]
//! ```
//!
//! On success `rotate` prints the new `Key Term` and `Installation Time`
//! and exits 0. Flag errors exit 1; client, rotation and status failures
//! exit 2.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

pub mod client;
pub mod command;
pub mod config;
pub mod error;

pub use client::{connect, LocalClient, SystemClient};
pub use command::{run_rotate, ROTATE_HELP, ROTATE_SYNOPSIS};
pub use config::{normalize_args, Cli, Commands, ConnectionArgs, MASTER_KEY_ENV};
pub use error::{CliError, CliResult, ClientError};

/// Execute a parsed command line, writing command output to `out`.
pub fn run(cli: Cli, master_key_hex: Option<&str>, out: &mut dyn std::io::Write) -> CliResult<()> {
    match cli.command {
        Commands::Rotate(conn) => {
            let client = connect(&conn, master_key_hex)?;
            run_rotate(&client, out)
        }
    }
}
