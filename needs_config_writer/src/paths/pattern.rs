//! Relativization rules and anchored configuration-path matching.

use regex_lite::Regex;

use crate::events::{Event, EventSink, INFO_CATEGORY, Subtype};
use crate::options::RelativePathField;

/// Matches any run of characters inside a single path segment.
const SEGMENT_WILDCARD: &str = r"[^.\[\]]*";

/// A compiled relativization rule.
///
/// Patterns use host option names (`needs_external_needs[*].json_path`) and
/// match the whole configuration path; `*` stays within one segment, so
/// `[*]` matches any collection index.
#[derive(Clone, Debug)]
pub struct PathSpec {
    pattern: String,
    regex: Regex,
    prefix: Option<String>,
    suffix: Option<String>,
}

impl PathSpec {
    /// Compile `pattern` into a rule without prefix or suffix.
    ///
    /// # Errors
    ///
    /// Returns a [`regex_lite::Error`] if the translated pattern does not
    /// compile.
    pub fn new(pattern: &str) -> Result<Self, regex_lite::Error> {
        let translated = regex_lite::escape(pattern).replace(r"\*", SEGMENT_WILDCARD);
        let regex = Regex::new(&format!("^(?:{translated})$"))?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
            prefix: None,
            suffix: None,
        })
    }

    /// Literal text expected before the embedded path. Empty text means none.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix.filter(|text| !text.is_empty());
        self
    }

    /// Literal text expected after the embedded path. Empty text means none.
    #[must_use]
    pub fn with_suffix(mut self, suffix: Option<String>) -> Self {
        self.suffix = suffix.filter(|text| !text.is_empty());
        self
    }

    /// The pattern as written in the options.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Literal prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Literal suffix, if any.
    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Whether `config_path` (for example `needs.types[0].directive`) matches.
    ///
    /// ```
    /// use needs_config_writer::PathSpec;
    ///
    /// let spec = PathSpec::new("needs_external_needs[*].json_path").unwrap();
    /// assert!(spec.matches("needs.external_needs[3].json_path"));
    /// assert!(!spec.matches("needs.external_needs.json_path"));
    /// ```
    #[must_use]
    pub fn matches(&self, config_path: &str) -> bool {
        match config_path.strip_prefix("needs.") {
            Some(rest) => self.regex.is_match(&format!("needs_{rest}")),
            None => self.regex.is_match(config_path),
        }
    }

    /// Split `text` into `(prefix, body, suffix)` around the configured affixes.
    ///
    /// Affixes that are not present in `text` come back empty.
    #[must_use]
    pub fn split_affixes<'a>(&self, text: &'a str) -> (&'a str, &'a str, &'a str) {
        let (prefix, rest) = match self.prefix() {
            Some(prefix) if text.starts_with(prefix) => text.split_at(prefix.len()),
            _ => ("", text),
        };
        let (body, suffix) = match self.suffix() {
            Some(suffix) if rest.ends_with(suffix) => rest.split_at(rest.len() - suffix.len()),
            _ => (rest, ""),
        };
        (prefix, body, suffix)
    }
}

/// Compile option entries into rules, warning about malformed entries.
pub(crate) fn compile_rules(fields: &[RelativePathField], sink: &mut dyn EventSink) -> Vec<PathSpec> {
    let mut rules = Vec::with_capacity(fields.len());
    for field in fields {
        let (pattern, prefix, suffix) = match field {
            RelativePathField::Pattern(pattern) => (pattern.as_str(), None, None),
            RelativePathField::Detailed {
                field: Some(pattern),
                prefix,
                suffix,
            } => (pattern.as_str(), prefix.clone(), suffix.clone()),
            RelativePathField::Detailed { field: None, .. } => {
                sink.emit(config_error(format!(
                    "needscfg_relativize_paths entry missing 'field': {field}"
                )));
                continue;
            }
            RelativePathField::Invalid(value) => {
                sink.emit(config_error(format!(
                    "Invalid needscfg_relativize_paths entry (must be string or table): {value}"
                )));
                continue;
            }
        };
        match PathSpec::new(pattern) {
            Ok(spec) => rules.push(spec.with_prefix(prefix).with_suffix(suffix)),
            Err(err) => sink.emit(config_error(format!(
                "Invalid needscfg_relativize_paths pattern '{pattern}': {err}"
            ))),
        }
    }
    rules
}

fn config_error(message: String) -> Event {
    Event::warning(Subtype::ConfigError, message).in_category(INFO_CATEGORY)
}
