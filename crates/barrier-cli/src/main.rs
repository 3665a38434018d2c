use std::process;

use barrier_cli::{normalize_args, run, Cli, CliError, MASTER_KEY_ENV, ROTATE_HELP};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

fn main() {
    init_logging();

    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            process::exit(0);
        }
        Err(e) => {
            let err = CliError::Flags(e.to_string());
            eprintln!("{err}");
            eprintln!("{ROTATE_HELP}");
            process::exit(err.exit_code());
        }
    };

    let master_key = std::env::var(MASTER_KEY_ENV).ok().map(Zeroizing::new);
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = run(cli, master_key.as_deref().map(String::as_str), &mut stdout) {
        eprintln!("{e}");
        process::exit(e.exit_code());
    }
}

/// Log to stderr so stdout carries only command output.
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
