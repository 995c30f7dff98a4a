//! Error types for `needscfg`.

use camino::Utf8PathBuf;
use needs_config_writer::{OptionsError, WriteError};
use thiserror::Error;

/// Errors surfaced by the `needscfg` driver.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read namespace snapshot {path}: {source}")]
    ReadNamespace {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse namespace snapshot {path}: {source}")]
    ParseNamespace {
        path: Utf8PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
