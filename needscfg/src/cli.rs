//! Command-line interface definitions for `needscfg`.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use needs_config_writer::Anchors;

/// Parsed CLI arguments for `needscfg`.
#[derive(Debug, Parser)]
#[command(name = "needscfg")]
#[command(about = "Write the Sphinx-Needs configuration of a namespace snapshot to ubproject.toml")]
#[command(version)]
pub struct Args {
    /// TOML file holding the namespace snapshot (`needs_*` and `needscfg_*` keys).
    #[arg(long, value_name = "path")]
    pub namespace: Utf8PathBuf,
    /// Build output directory substituted for `${outdir}` [default: <confdir>/_build].
    #[arg(long, value_name = "path")]
    pub outdir: Option<Utf8PathBuf>,
    /// Documentation source directory substituted for `${srcdir}` [default: <confdir>].
    #[arg(long, value_name = "path")]
    pub srcdir: Option<Utf8PathBuf>,
    /// Base for relative paths [default: the namespace file's directory].
    #[arg(long, value_name = "path")]
    pub confdir: Option<Utf8PathBuf>,
    /// Report whether the output would change instead of writing it.
    #[arg(long = "check")]
    pub should_check: bool,
}

impl Args {
    /// Directory anchors with defaults filled in.
    #[must_use]
    pub fn anchors(&self) -> Anchors {
        let confdir = self.confdir.clone().unwrap_or_else(|| {
            self.namespace
                .parent()
                .filter(|parent| !parent.as_str().is_empty())
                .unwrap_or_else(|| Utf8Path::new("."))
                .to_path_buf()
        });
        let srcdir = self.srcdir.clone().unwrap_or_else(|| confdir.clone());
        let outdir = self
            .outdir
            .clone()
            .unwrap_or_else(|| confdir.join("_build"));
        Anchors::new(outdir, srcdir, confdir)
    }
}
