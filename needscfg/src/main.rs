//! CLI entrypoint for `needscfg`.

use std::process::ExitCode;

use clap::Parser;
use needs_config_writer::TracingSink;
use needscfg::Status;
use needscfg::cli::Args;
use tracing_subscriber::EnvFilter;

/// Exit code of `--check` when the target would change.
const EXIT_STALE: u8 = 1;
/// Exit code of fatal errors.
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match needscfg::run(&args, &mut TracingSink) {
        Ok(Status::Stale) if args.should_check => ExitCode::from(EXIT_STALE),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
