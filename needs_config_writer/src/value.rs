//! Value trees flowing through the pipeline.
//!
//! [`RawValue`] models whatever the host hands over, including types that
//! cannot be written to TOML. [`SafeValue`] is the sanitised subset that
//! converts losslessly into a [`toml::Value`].

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use toml::value::Datetime;

/// Insertion-ordered table of safe values.
pub type SafeTable = IndexMap<String, SafeValue>;

/// A value as supplied by the host namespace.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// An unset value.
    Null,
    /// UTF-8 text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Date, time or date-time.
    Datetime(Datetime),
    /// A filesystem path object (as opposed to text that happens to be a path).
    Path(Utf8PathBuf),
    /// Insertion-ordered mapping.
    Map(IndexMap<String, RawValue>),
    /// Ordered, growable collection.
    List(Vec<RawValue>),
    /// Fixed-size collection.
    Tuple(Vec<RawValue>),
    /// Unordered collection.
    Set(Vec<RawValue>),
    /// Any value the output format cannot represent, identified by its type name.
    Unsupported {
        /// Host type name reported in warnings.
        type_name: String,
    },
}

impl RawValue {
    /// Construct a placeholder for an unrepresentable host object.
    #[must_use]
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::Unsupported {
            type_name: type_name.into(),
        }
    }

    /// Build a mapping from `(key, value)` pairs, preserving their order.
    #[must_use]
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Build a list from anything convertible into raw values.
    #[must_use]
    pub fn list<V, I>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Host-facing type name, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "NoneType",
            Self::Text(_) => "str",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::Boolean(_) => "bool",
            Self::Datetime(_) => "datetime",
            Self::Path(_) => "Path",
            Self::Map(_) => "dict",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Unsupported { type_name } => type_name,
        }
    }

    /// Convert into a JSON value for use as a figment layer.
    ///
    /// Nulls and unsupported values have no JSON form and yield `None`; they
    /// are dropped from enclosing containers.
    pub(crate) fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;
        Some(match self {
            Self::Null | Self::Unsupported { .. } => return None,
            Self::Text(text) => Json::String(text.clone()),
            Self::Integer(int) => Json::from(*int),
            Self::Float(float) => Json::Number(serde_json::Number::from_f64(*float)?),
            Self::Boolean(flag) => Json::Bool(*flag),
            Self::Datetime(datetime) => Json::String(datetime.to_string()),
            Self::Path(path) => Json::String(path.to_string()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .filter_map(|(key, value)| Some((key.clone(), value.to_json()?)))
                    .collect(),
            ),
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => {
                Json::Array(items.iter().filter_map(Self::to_json).collect())
            }
        })
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Datetime> for RawValue {
    fn from(value: Datetime) -> Self {
        Self::Datetime(value)
    }
}

impl From<Utf8PathBuf> for RawValue {
    fn from(value: Utf8PathBuf) -> Self {
        Self::Path(value)
    }
}

impl<V: Into<Self>> From<Option<V>> for RawValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<toml::Value> for RawValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(text) => Self::Text(text),
            toml::Value::Integer(int) => Self::Integer(int),
            toml::Value::Float(float) => Self::Float(float),
            toml::Value::Boolean(flag) => Self::Boolean(flag),
            toml::Value::Datetime(datetime) => Self::Datetime(datetime),
            toml::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            toml::Value::Table(table) => Self::Map(
                table
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// A value guaranteed to be representable in the output document.
#[derive(Clone, Debug, PartialEq)]
pub enum SafeValue {
    /// UTF-8 text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Date, time or date-time.
    Datetime(Datetime),
    /// Nested table.
    Table(SafeTable),
    /// Ordered collection.
    Array(Vec<SafeValue>),
    /// Fixed-size collection; rendered as an array.
    Tuple(Vec<SafeValue>),
    /// Unordered collection; becomes a sorted array once ordered.
    Set(Vec<SafeValue>),
}

impl SafeValue {
    /// Type name used by the scalar sort key and diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "str",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::Boolean(_) => "bool",
            Self::Datetime(_) => "datetime",
            Self::Table(_) => "dict",
            Self::Array(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
        }
    }

    /// Borrow the inner table, if this value is one.
    #[must_use]
    pub const fn as_table(&self) -> Option<&SafeTable> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Borrow the inner text, if this value is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for SafeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SafeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for SafeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for SafeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<toml::Value> for SafeValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(text) => Self::Text(text),
            toml::Value::Integer(int) => Self::Integer(int),
            toml::Value::Float(float) => Self::Float(float),
            toml::Value::Boolean(flag) => Self::Boolean(flag),
            toml::Value::Datetime(datetime) => Self::Datetime(datetime),
            toml::Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            toml::Value::Table(table) => Self::Table(table_from_toml(table)),
        }
    }
}

impl From<SafeValue> for toml::Value {
    fn from(value: SafeValue) -> Self {
        match value {
            SafeValue::Text(text) => Self::String(text),
            SafeValue::Integer(int) => Self::Integer(int),
            SafeValue::Float(float) => Self::Float(float),
            SafeValue::Boolean(flag) => Self::Boolean(flag),
            SafeValue::Datetime(datetime) => Self::Datetime(datetime),
            SafeValue::Table(table) => Self::Table(table_to_toml(table)),
            SafeValue::Array(items) | SafeValue::Tuple(items) | SafeValue::Set(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
        }
    }
}

/// Convert a decoded TOML table into a safe table, keeping key order.
#[must_use]
pub(crate) fn table_from_toml(table: toml::Table) -> SafeTable {
    table
        .into_iter()
        .map(|(key, value)| (key, SafeValue::from(value)))
        .collect()
}

/// Convert a safe table into a TOML table, keeping key order.
#[must_use]
pub(crate) fn table_to_toml(table: SafeTable) -> toml::Table {
    let mut out = toml::Table::new();
    for (key, value) in table {
        out.insert(key, toml::Value::from(value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RawValue::from("a"), "str")]
    #[case(RawValue::from(1_i64), "int")]
    #[case(RawValue::Null, "NoneType")]
    #[case(RawValue::unsupported("function"), "function")]
    fn raw_type_names(#[case] value: RawValue, #[case] expected: &str) {
        assert_eq!(value.type_name(), expected);
    }

    #[test]
    fn tuples_and_sets_render_as_arrays() {
        let value = SafeValue::Tuple(vec![SafeValue::from("a"), SafeValue::Set(vec![1_i64.into()])]);
        let rendered = toml::Value::from(value);
        assert_eq!(
            rendered,
            toml::Value::Array(vec![
                toml::Value::String("a".to_owned()),
                toml::Value::Array(vec![toml::Value::Integer(1)]),
            ])
        );
    }

    #[test]
    fn json_layer_drops_unrepresentable_entries() {
        let raw = RawValue::map([
            ("keep", RawValue::from("x")),
            ("null", RawValue::Null),
            ("object", RawValue::unsupported("object")),
        ]);
        assert_eq!(raw.to_json(), Some(serde_json::json!({"keep": "x"})));
    }
}
