//! Read-only snapshot of the host's configuration namespace.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::value::RawValue;

/// Prefix selecting the settings that are written to the `needs` table.
pub const NEEDS_PREFIX: &str = "needs_";

/// Namespaced settings as handed over by the host, plus the side channels the
/// collector needs: which keys the user set explicitly and which defaults the
/// host registered.
#[derive(Clone, Debug, Default)]
pub struct Namespace {
    values: IndexMap<String, RawValue>,
    explicit: HashSet<String>,
    defaults: HashMap<String, RawValue>,
}

impl Namespace {
    /// An empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` as explicitly configured by the user.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<RawValue>) -> &mut Self {
        let key = key.into();
        self.explicit.insert(key.clone());
        self.values.insert(key, value.into());
        self
    }

    /// Register `default` for `key`.
    ///
    /// The default also becomes the current value unless `key` already has
    /// one. Defaulted values are not explicit.
    pub fn register_default(
        &mut self,
        key: impl Into<String>,
        default: impl Into<RawValue>,
    ) -> &mut Self {
        let key = key.into();
        let default = default.into();
        self.values
            .entry(key.clone())
            .or_insert_with(|| default.clone());
        self.defaults.insert(key, default);
        self
    }

    /// Build a namespace from a decoded TOML table; every key is explicit.
    #[must_use]
    pub fn from_toml(table: toml::Table) -> Self {
        let mut namespace = Self::new();
        for (key, value) in table {
            namespace.set(key, RawValue::from(value));
        }
        namespace
    }

    /// Current value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    /// Whether the user set `key` explicitly.
    #[must_use]
    pub fn is_explicit(&self, key: &str) -> bool {
        self.explicit.contains(key)
    }

    /// The registered default of `key`.
    #[must_use]
    pub fn default_of(&self, key: &str) -> Option<&RawValue> {
        self.defaults.get(key)
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Entries under `prefix`, prefix stripped, as a JSON object.
    pub(crate) fn prefixed_json(&self, prefix: &str) -> serde_json::Value {
        let map = self
            .iter()
            .filter_map(|(key, value)| {
                let bare = key.strip_prefix(prefix)?;
                Some((bare.to_owned(), value.to_json()?))
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_override_registered_defaults() {
        let mut namespace = Namespace::new();
        namespace
            .register_default("needs_id_length", 5_i64)
            .register_default("needs_title", "")
            .set("needs_id_length", 7_i64);
        assert_eq!(namespace.get("needs_id_length"), Some(&RawValue::Integer(7)));
        assert!(namespace.is_explicit("needs_id_length"));
        assert!(!namespace.is_explicit("needs_title"));
        assert_eq!(
            namespace.default_of("needs_id_length"),
            Some(&RawValue::Integer(5))
        );
    }

    #[test]
    fn prefixed_json_strips_prefix() {
        let mut namespace = Namespace::new();
        namespace
            .set("needscfg_overwrite", true)
            .set("needs_build_json", true)
            .set("needscfg_broken", RawValue::unsupported("object"));
        assert_eq!(
            namespace.prefixed_json("needscfg_"),
            serde_json::json!({"overwrite": true})
        );
    }
}
