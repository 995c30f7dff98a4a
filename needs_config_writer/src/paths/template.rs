//! Directory anchors and `${outdir}` / `${srcdir}` template resolution.

use camino::{Utf8Path, Utf8PathBuf};

const OUTDIR_PLACEHOLDER: &str = "${outdir}";
const SRCDIR_PLACEHOLDER: &str = "${srcdir}";

/// The three directories of a documentation build that paths resolve against.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Anchors {
    /// Build output directory, substituted for `${outdir}`.
    pub outdir: Utf8PathBuf,
    /// Documentation source directory, substituted for `${srcdir}`.
    pub srcdir: Utf8PathBuf,
    /// Directory holding the host configuration; base for relative paths.
    pub confdir: Utf8PathBuf,
}

impl Anchors {
    /// Construct anchors from the output, source and configuration directories.
    #[must_use]
    pub fn new(
        outdir: impl Into<Utf8PathBuf>,
        srcdir: impl Into<Utf8PathBuf>,
        confdir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            outdir: outdir.into(),
            srcdir: srcdir.into(),
            confdir: confdir.into(),
        }
    }
}

/// Substitute the anchor placeholders in `template`.
///
/// A result that is still relative is joined onto [`Anchors::confdir`].
///
/// # Examples
///
/// ```
/// use needs_config_writer::{Anchors, resolve_path_template};
///
/// let anchors = Anchors::new("/p/_build", "/p/docs", "/p/docs");
/// assert_eq!(resolve_path_template("${outdir}/ubproject.toml", &anchors), "/p/_build/ubproject.toml");
/// assert_eq!(resolve_path_template("extra.toml", &anchors), "/p/docs/extra.toml");
/// ```
#[must_use]
pub fn resolve_path_template(template: &str, anchors: &Anchors) -> Utf8PathBuf {
    let substituted = template
        .replace(OUTDIR_PLACEHOLDER, anchors.outdir.as_str())
        .replace(SRCDIR_PLACEHOLDER, anchors.srcdir.as_str());
    let path = Utf8Path::new(&substituted);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        anchors.confdir.join(path)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use rstest::rstest;

    fn anchors() -> Anchors {
        Anchors::new("/work/_build/html", "/work/docs", "/work/conf")
    }

    #[rstest]
    #[case::outdir("${outdir}/custom/path/config.toml", "/work/_build/html/custom/path/config.toml")]
    #[case::srcdir("${srcdir}/generated_config.toml", "/work/docs/generated_config.toml")]
    #[case::relative("relative/config.toml", "/work/conf/relative/config.toml")]
    #[case::absolute("/elsewhere/config.toml", "/elsewhere/config.toml")]
    fn resolves_templates(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(resolve_path_template(template, &anchors()), expected);
    }

    #[test]
    fn relative_anchor_is_joined_onto_confdir() {
        let anchors = Anchors::new("_build", "/work/docs", "/work/conf");
        assert_eq!(
            resolve_path_template("${outdir}/ubproject.toml", &anchors),
            "/work/conf/_build/ubproject.toml"
        );
    }
}
