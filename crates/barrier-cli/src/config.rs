//! Command-line definitions and connection configuration.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::command::{ROTATE_HELP, ROTATE_SYNOPSIS};

/// Environment variable holding the hex-encoded master key for local
/// (`file://`) addresses.
pub const MASTER_KEY_ENV: &str = "BARRIER_MASTER_KEY";

/// Global connection flags. Accepted with one or two leading dashes.
const GLOBAL_FLAGS: &[&str] = &["address", "ca-cert", "ca-path", "tls-skip-verify"];

/// Storage barrier command-line interface
#[derive(Parser, Debug)]
#[command(name = "barrier")]
#[command(version)]
#[command(about = "Storage barrier administration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = ROTATE_SYNOPSIS, override_help = ROTATE_HELP)]
    Rotate(ConnectionArgs),
}

/// How to reach the barrier server.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// The address of the barrier server.
    #[arg(long, env = "BARRIER_ADDR", value_name = "addr")]
    pub address: Option<String>,

    /// Path to a PEM encoded CA cert file.
    #[arg(long = "ca-cert", env = "BARRIER_CACERT", value_name = "path")]
    pub ca_cert: Option<PathBuf>,

    /// Path to a directory of PEM encoded CA cert files.
    #[arg(long = "ca-path", env = "BARRIER_CAPATH", value_name = "path")]
    pub ca_path: Option<PathBuf>,

    /// Do not verify the server TLS certificate.
    #[arg(long = "tls-skip-verify", env = "BARRIER_SKIP_VERIFY")]
    pub tls_skip_verify: bool,
}

impl ConnectionArgs {
    /// CA material to trust. `ca_path` wins when both are set.
    pub fn ca_source(&self) -> Option<&PathBuf> {
        self.ca_path.as_ref().or(self.ca_cert.as_ref())
    }
}

/// Rewrite `-address=x` style flags to `--address=x` so both spellings parse.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(flag) = text.strip_prefix('-').filter(|f| !f.starts_with('-')) else {
                return arg;
            };
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if GLOBAL_FLAGS.contains(&name) {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn single_dash_long_flags_are_accepted() {
        let cli = parse(&[
            "barrier",
            "rotate",
            "-address=file:///tmp/x",
            "-ca-cert",
            "/etc/ca.pem",
            "-tls-skip-verify",
        ])
        .unwrap();
        let Commands::Rotate(conn) = cli.command;
        assert_eq!(conn.address.as_deref(), Some("file:///tmp/x"));
        assert_eq!(conn.ca_cert, Some(PathBuf::from("/etc/ca.pem")));
        assert!(conn.tls_skip_verify);
    }

    #[test]
    fn double_dash_flags_are_accepted() {
        let cli = parse(&["barrier", "rotate", "--address", "file:///data"]).unwrap();
        let Commands::Rotate(conn) = cli.command;
        assert_eq!(conn.address.as_deref(), Some("file:///data"));
    }

    #[test]
    fn rotation_specific_flags_do_not_exist() {
        assert!(parse(&["barrier", "rotate", "--term", "5"]).is_err());
        assert!(parse(&["barrier", "rotate", "-force"]).is_err());
    }

    #[test]
    fn ca_path_wins_over_ca_cert() {
        let conn = ConnectionArgs {
            ca_cert: Some(PathBuf::from("cert.pem")),
            ca_path: Some(PathBuf::from("certs/")),
            ..Default::default()
        };
        assert_eq!(conn.ca_source(), Some(&PathBuf::from("certs/")));
    }

    #[test]
    fn normalize_leaves_other_args_alone() {
        let out = normalize_args(["barrier", "rotate", "-x", "--address=a", "-"].map(OsString::from));
        assert_eq!(
            out,
            ["barrier", "rotate", "-x", "--address=a", "-"].map(OsString::from)
        );
    }
}
