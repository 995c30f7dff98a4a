//! The `needscfg_*` option set and its layered extraction.
//!
//! Options are resolved with figment, lowest precedence first:
//!
//! 1. built-in defaults ([`WriterOptions::default`]);
//! 2. `needscfg_*` entries of the host namespace, prefix stripped;
//! 3. `NEEDSCFG_*` environment variables.

use std::fmt;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::error::OptionsError;
use crate::namespace::Namespace;

/// Prefix of option keys inside the host namespace.
pub const OPTIONS_PREFIX: &str = "needscfg_";

/// Prefix of environment variables overriding options.
pub const ENV_PREFIX: &str = "NEEDSCFG_";

/// One entry of `needscfg_relativize_paths`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelativePathField {
    /// A bare pattern such as `needs_build_json`.
    Pattern(String),
    /// A pattern whose path is embedded between a literal prefix and suffix.
    Detailed {
        /// The pattern; required, reported as a configuration error when absent.
        field: Option<String>,
        /// Text preceding the embedded path.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        /// Text following the embedded path.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suffix: Option<String>,
    },
    /// Anything else; kept so it can be reported instead of failing extraction.
    Invalid(serde_json::Value),
}

impl fmt::Display for RelativePathField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(pattern) => f.write_str(pattern),
            Self::Detailed {
                field,
                prefix,
                suffix,
            } => write!(
                f,
                "{{field: {field:?}, prefix: {prefix:?}, suffix: {suffix:?}}}"
            ),
            Self::Invalid(value) => write!(f, "{value}"),
        }
    }
}

/// Behaviour switches of the writer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Output path template; `${outdir}` and `${srcdir}` are substituted.
    pub outpath: String,
    /// Warn with a diff preview when the existing file differs.
    pub warn_on_diff: bool,
    /// Overwrite the existing file when it differs.
    pub overwrite: bool,
    /// Write every `needs_*` value rather than only explicitly set ones.
    pub write_all: bool,
    /// Prefix the output with the auto-generated warning header.
    pub add_header: bool,
    /// Namespaced names that are never written.
    pub exclude_vars: Vec<String>,
    /// Templates of TOML documents to shallow-merge, in precedence order.
    pub merge_toml_files: Vec<String>,
    /// Skip values equal to their registered default.
    pub exclude_defaults: bool,
    /// Configuration paths whose absolute paths are relativized.
    pub relativize_paths: Vec<RelativePathField>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            outpath: "${outdir}/ubproject.toml".to_owned(),
            warn_on_diff: true,
            overwrite: false,
            write_all: false,
            add_header: true,
            exclude_vars: vec![
                "needs_from_toml".to_owned(),
                "needs_from_toml_table".to_owned(),
                "needs_schema_definitions_from_json".to_owned(),
            ],
            merge_toml_files: Vec::new(),
            exclude_defaults: false,
            relativize_paths: Vec::new(),
        }
    }
}

impl WriterOptions {
    /// Build the layered figment for `namespace` without extracting it.
    #[must_use]
    pub fn figment(namespace: &Namespace) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Serialized::defaults(namespace.prefixed_json(OPTIONS_PREFIX)))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extract options from defaults, `namespace` and the environment.
    ///
    /// # Errors
    ///
    /// Returns an [`OptionsError`] when a layer holds a value of the wrong
    /// type, for example `needscfg_overwrite = "sometimes"`.
    pub fn load(namespace: &Namespace) -> Result<Self, OptionsError> {
        Ok(Self::figment(namespace).extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawValue;
    use anyhow::{Result, ensure};
    use test_helpers::figment::with_jail;

    #[test]
    fn defaults_apply_without_layers() -> Result<()> {
        with_jail(|_| {
            let options = WriterOptions::load(&Namespace::new())?;
            ensure!(options == WriterOptions::default(), "unexpected {options:?}");
            ensure!(options.warn_on_diff && !options.overwrite);
            ensure!(options.exclude_vars.len() == 3);
            Ok(())
        })
    }

    #[test]
    fn namespace_entries_override_defaults() -> Result<()> {
        with_jail(|_| {
            let mut namespace = Namespace::new();
            namespace
                .set("needscfg_overwrite", true)
                .set("needscfg_outpath", "${srcdir}/ubproject.toml")
                .set(
                    "needscfg_relativize_paths",
                    RawValue::list([
                        RawValue::from("needs_build_json"),
                        RawValue::map([("field", "needs_x"), ("prefix", "file://")]),
                    ]),
                )
                .set("needs_build_json", true);
            let options = WriterOptions::load(&namespace)?;
            ensure!(options.overwrite);
            ensure!(options.outpath == "${srcdir}/ubproject.toml");
            ensure!(
                options.relativize_paths
                    == vec![
                        RelativePathField::Pattern("needs_build_json".to_owned()),
                        RelativePathField::Detailed {
                            field: Some("needs_x".to_owned()),
                            prefix: Some("file://".to_owned()),
                            suffix: None,
                        },
                    ],
                "unexpected rules {:?}",
                options.relativize_paths
            );
            Ok(())
        })
    }

    #[test]
    fn environment_overrides_namespace() -> Result<()> {
        with_jail(|j| {
            j.set_env("NEEDSCFG_WRITE_ALL", "true");
            j.set_env("NEEDSCFG_ADD_HEADER", "false");
            let mut namespace = Namespace::new();
            namespace.set("needscfg_write_all", false);
            let options = WriterOptions::load(&namespace)?;
            ensure!(options.write_all, "environment should win over namespace");
            ensure!(!options.add_header);
            Ok(())
        })
    }

    #[test]
    fn mistyped_option_is_an_error() -> Result<()> {
        with_jail(|_| {
            let mut namespace = Namespace::new();
            namespace.set("needscfg_exclude_defaults", RawValue::map([("a", 1_i64)]));
            ensure!(WriterOptions::load(&namespace).is_err());
            Ok(())
        })
    }
}
