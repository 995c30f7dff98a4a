//! Conversion of raw namespace values into TOML-safe values.

use camino::{Utf8Path, Utf8PathBuf};

use crate::events::{Event, EventSink, INFO_CATEGORY, Subtype};
use crate::options::RelativePathField;
use crate::paths::{PathSpec, compile_rules, relativize_path};
use crate::value::{RawValue, SafeTable, SafeValue};

/// Filters unrepresentable values and relativizes selected paths.
///
/// Relativization is only possible when the sanitizer knows the directory of
/// the output file; without one every path object is converted verbatim.
#[derive(Clone, Debug, Default)]
pub struct Sanitizer {
    rules: Vec<PathSpec>,
    base_dir: Option<Utf8PathBuf>,
}

impl Sanitizer {
    /// A sanitizer with pre-compiled `rules` relativizing against `base_dir`.
    #[must_use]
    pub fn new(rules: Vec<PathSpec>, base_dir: Option<Utf8PathBuf>) -> Self {
        Self { rules, base_dir }
    }

    /// Compile `fields` and relativize against the directory of `output_path`.
    ///
    /// Malformed entries are reported to `sink` once, here, and skipped.
    #[must_use]
    pub fn for_output(
        fields: &[RelativePathField],
        output_path: &Utf8Path,
        sink: &mut dyn EventSink,
    ) -> Self {
        let base_dir = output_path.parent().map(Utf8Path::to_path_buf);
        Self::new(compile_rules(fields, sink), base_dir)
    }

    /// Sanitize `value` found at configuration path `path`.
    ///
    /// Returns `None` when the value has no TOML form. Nulls at the top level
    /// are unset options and vanish silently; everything else that is dropped
    /// produces an `unsupported_type` warning.
    pub fn sanitize(
        &self,
        value: &RawValue,
        path: &str,
        sink: &mut dyn EventSink,
    ) -> Option<SafeValue> {
        self.visit(value, path, false, sink)
    }

    fn visit(
        &self,
        value: &RawValue,
        path: &str,
        nested: bool,
        sink: &mut dyn EventSink,
    ) -> Option<SafeValue> {
        if matches!(value, RawValue::Null) {
            if nested {
                sink.emit(unsupported(path, value.type_name()));
            }
            return None;
        }
        let rule = self.matching_rule(path, sink);
        match value {
            RawValue::Null => None,
            RawValue::Unsupported { type_name } => {
                sink.emit(unsupported(path, type_name));
                None
            }
            RawValue::Path(target) => {
                Some(SafeValue::Text(self.path_to_text(target, rule, path, sink)))
            }
            RawValue::Text(text) => {
                Some(SafeValue::Text(self.relativize_text(text, rule, path, sink)))
            }
            RawValue::Integer(int) => Some(SafeValue::Integer(*int)),
            RawValue::Float(float) => Some(SafeValue::Float(*float)),
            RawValue::Boolean(flag) => Some(SafeValue::Boolean(*flag)),
            RawValue::Datetime(datetime) => Some(SafeValue::Datetime(*datetime)),
            RawValue::Map(entries) => {
                let mut table = SafeTable::with_capacity(entries.len());
                for (key, child) in entries {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    if let Some(safe) = self.visit(child, &child_path, true, sink) {
                        table.insert(key.clone(), safe);
                    }
                }
                Some(SafeValue::Table(table))
            }
            RawValue::List(items) => Some(SafeValue::Array(self.visit_items(items, path, sink))),
            RawValue::Tuple(items) => Some(SafeValue::Tuple(self.visit_items(items, path, sink))),
            RawValue::Set(items) => Some(SafeValue::Set(self.visit_items(items, path, sink))),
        }
    }

    fn visit_items(
        &self,
        items: &[RawValue],
        path: &str,
        sink: &mut dyn EventSink,
    ) -> Vec<SafeValue> {
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| self.visit(item, &format!("{path}[{index}]"), true, sink))
            .collect()
    }

    fn path_to_text(
        &self,
        target: &Utf8Path,
        rule: Option<&PathSpec>,
        path: &str,
        sink: &mut dyn EventSink,
    ) -> String {
        if let Some(base) = self.base_dir.as_deref()
            && rule.is_some()
            && target.is_absolute()
        {
            let relative = relativize_path(target, base);
            sink.emit(relativized(format!(
                "Relativizing path at '{path}': {target} -> {relative}"
            )));
            return relative;
        }
        sink.emit(
            Event::warning(
                Subtype::PathConversion,
                format!("Converting Path/PosixPath to string at '{path}': {target}"),
            )
            .in_category(INFO_CATEGORY),
        );
        target.to_string()
    }

    fn relativize_text(
        &self,
        text: &str,
        rule: Option<&PathSpec>,
        path: &str,
        sink: &mut dyn EventSink,
    ) -> String {
        let (Some(base), Some(rule)) = (self.base_dir.as_deref(), rule) else {
            return text.to_owned();
        };
        let (prefix, body, suffix) = rule.split_affixes(text);
        let candidate = Utf8Path::new(body);
        let looks_like_path =
            body.contains('/') || body.contains('\\') || candidate.exists();
        if !(candidate.is_absolute() && looks_like_path) {
            return text.to_owned();
        }

        let result = format!("{prefix}{}{suffix}", relativize_path(candidate, base));
        let kind = if rule.prefix().is_some() || rule.suffix().is_some() {
            "embedded string path"
        } else {
            "string path"
        };
        sink.emit(relativized(format!(
            "Relativizing {kind} at '{path}': {text} -> {result}"
        )));
        result
    }

    /// First rule matching `path`, announced with a `path_matching` event.
    /// Rules only apply once the output directory is known.
    fn matching_rule(&self, path: &str, sink: &mut dyn EventSink) -> Option<&PathSpec> {
        self.base_dir.as_ref()?;
        let rule = self.rules.iter().find(|rule| rule.matches(path))?;
        sink.emit(
            Event::info(format!(
                "Path '{path}' matches pattern '{}' (prefix={:?}, suffix={:?})",
                rule.pattern(),
                rule.prefix(),
                rule.suffix()
            ))
            .with_subtype(Subtype::PathMatching)
            .at(path),
        );
        Some(rule)
    }
}

fn unsupported(path: &str, type_name: &str) -> Event {
    Event::warning(
        Subtype::UnsupportedType,
        format!("Unsupported type at '{path}': {type_name} - filtering out"),
    )
    .at(path)
}

fn relativized(message: String) -> Event {
    Event::info(message).with_subtype(Subtype::PathRelativization)
}
