//! Command-line driver for `needs_config_writer`.
//!
//! Loads a namespace snapshot from TOML, resolves the writer options from it
//! and the environment, then writes (or checks) `ubproject.toml`.

pub mod cli;
pub mod error;

use std::io;

use camino::Utf8Path;
use needs_config_writer::{ConfigWriter, EventSink, Namespace, WriteOutcome, WriterOptions};

use crate::cli::Args;
use crate::error::CliError;

/// Result of a successful run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// The target holds the rendered configuration.
    Current,
    /// The target differs from the rendered configuration and was left alone.
    Stale,
}

/// Load the namespace snapshot at `path`. Every root key counts as explicitly
/// set.
///
/// # Errors
///
/// Returns [`CliError::ReadNamespace`] or [`CliError::ParseNamespace`] when
/// the file cannot be read or decoded.
pub fn load_namespace(path: &Utf8Path) -> Result<Namespace, CliError> {
    let data = std::fs::read_to_string(path).map_err(|source| CliError::ReadNamespace {
        path: path.to_path_buf(),
        source,
    })?;
    let table: toml::Table = toml::from_str(&data).map_err(|source| CliError::ParseNamespace {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    Ok(Namespace::from_toml(table))
}

/// Run the driver for `args`, reporting events to `sink`.
///
/// # Errors
///
/// Returns a [`CliError`] when the snapshot or options are invalid, or the
/// target cannot be read or written.
pub fn run(args: &Args, sink: &mut dyn EventSink) -> Result<Status, CliError> {
    let namespace = load_namespace(&args.namespace)?;
    let options = WriterOptions::load(&namespace)?;
    let writer = ConfigWriter::new(options, args.anchors());

    if args.should_check {
        return check(&writer, &namespace, sink);
    }
    let outcome = writer.write(&namespace, sink)?;
    tracing::debug!(%outcome, path = %writer.output_path(), "needs configuration processed");
    Ok(if outcome == WriteOutcome::ChangedNotOverwritten {
        Status::Stale
    } else {
        Status::Current
    })
}

fn check(
    writer: &ConfigWriter,
    namespace: &Namespace,
    sink: &mut dyn EventSink,
) -> Result<Status, CliError> {
    let rendered = writer.render(namespace, sink)?;
    let target = writer.output_path();
    match std::fs::read_to_string(&target) {
        Ok(existing) if existing == rendered => Ok(Status::Current),
        Ok(_) => {
            tracing::info!(path = %target, "needs configuration is out of date");
            Ok(Status::Stale)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %target, "needs configuration has not been written yet");
            Ok(Status::Stale)
        }
        Err(source) => Err(CliError::Io {
            path: target,
            source,
        }),
    }
}
