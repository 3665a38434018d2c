//! The `rotate` command.

use std::io::Write;

use chrono::SecondsFormat;

use crate::client::SystemClient;
use crate::error::{CliError, CliResult};

pub const ROTATE_SYNOPSIS: &str = "Rotates the backend encryption key used to persist data";

pub const ROTATE_HELP: &str = "\
Usage: barrier rotate [options]

  Rotates the backend encryption key which is used to secure data
  written to the storage backend. This is done by installing a new key
  which encrypts new data, while old keys are still used to decrypt
  secrets written previously. This is an online operation and is not
  disruptive.

General Options:

  -address=addr           The address of the barrier server.

  -ca-cert=path           Path to a PEM encoded CA cert file to use to
                          verify the barrier server SSL certificate.

  -ca-path=path           Path to a directory of PEM encoded CA cert files
                          to verify the barrier server SSL certificate. If both
                          -ca-cert and -ca-path are specified, -ca-path is used.

  -tls-skip-verify        Do not verify TLS certificate. This is highly
                          not recommended.";

/// Rotate the key, then report the new status on `out`.
///
/// Nothing is written to `out` unless both calls succeed.
pub fn run_rotate<C>(client: &C, out: &mut dyn Write) -> CliResult<()>
where
    C: SystemClient + ?Sized,
{
    client.rotate().map_err(CliError::Rotate)?;
    let status = client.key_status().map_err(CliError::KeyStatus)?;

    let report = format!(
        "Key Term: {}\nInstallation Time: {}\n",
        status.term,
        status
            .install_time
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    out.write_all(report.as_bytes())?;
    out.flush()?;
    Ok(())
}
