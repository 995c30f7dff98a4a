//! Error types produced by the writer.
//!
//! Only [`OptionsError`] and [`WriteError`] ever reach the caller.
//! [`MergeSourceError`] is consumed by the merger and reported as a
//! `merge_failed` warning.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Failure extracting [`crate::WriterOptions`] from its layers.
#[derive(Debug, Error)]
#[error("Failed to extract needscfg options: {source}")]
pub struct OptionsError {
    /// Underlying figment error describing the offending key.
    #[source]
    pub source: Box<figment::Error>,
}

impl From<figment::Error> for OptionsError {
    fn from(source: figment::Error) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

/// Reasons a merge source could not contribute to the output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MergeSourceError {
    /// The resolved path does not exist.
    #[error("TOML file to merge not found: '{path}'")]
    NotFound {
        /// Resolved location of the merge source.
        path: Utf8PathBuf,
    },

    /// The file exists but could not be read.
    #[error("Failed to read TOML file '{path}': {source}")]
    Read {
        /// Resolved location of the merge source.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML.
    #[error("Failed to parse TOML file '{path}': {source}")]
    Parse {
        /// Resolved location of the merge source.
        path: Utf8PathBuf,
        /// Decoder diagnostics.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// The file's `needs` entry is not a table.
    #[error("TOML file '{path}' defines 'needs' as a {found}, expected a table")]
    NeedsNotTable {
        /// Resolved location of the merge source.
        path: Utf8PathBuf,
        /// TOML type name found instead.
        found: &'static str,
    },
}

/// Failure rendering or persisting the output document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteError {
    /// The document could not be encoded as TOML.
    #[error("Failed to render needs configuration: {0}")]
    Render(#[from] toml::ser::Error),

    /// Reading, creating or writing the target failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that triggered the failure.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The output path has no file name component.
    #[error("output path '{0}' does not name a file")]
    NotAFile(Utf8PathBuf),
}

impl WriteError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
