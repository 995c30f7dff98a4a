//! Deterministic ordering of the output document.
//!
//! Tables are key-sorted everywhere. Arrays keep their order unless a fixed
//! rule for their path says otherwise, since for most settings order is
//! meaningful.

use std::cmp::Ordering;
use std::mem;

use crate::value::{SafeTable, SafeValue, table_to_toml};

/// Array of `extra_options`, which holds either names or tables with a `name`.
const EXTRA_OPTIONS: &str = "extra_options";

/// How an array at a known path is sorted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortRule {
    /// Sort tables by the value under this key.
    ByKey(&'static str),
    /// Sort scalars by type name, then value.
    Scalars,
}

/// The sort rule for the array at `path`, if it has one.
///
/// ```
/// use needs_config_writer::{SortRule, sort_rule};
///
/// assert_eq!(sort_rule("statuses"), Some(SortRule::ByKey("name")));
/// assert_eq!(sort_rule("types[]"), None);
/// ```
#[must_use]
pub fn sort_rule(path: &str) -> Option<SortRule> {
    Some(match path {
        "external_needs" => SortRule::ByKey("id_prefix"),
        "extra_links" => SortRule::ByKey("option"),
        "statuses" | "tags" => SortRule::ByKey("name"),
        "types" => SortRule::ByKey("title"),
        "flow_link_types" | "json_exclude_fields" | "variant_options" => SortRule::Scalars,
        _ => return None,
    })
}

/// Order `value` found at `path` (empty for the root of the `needs` table).
#[must_use]
pub fn order_value(value: SafeValue, path: &str) -> SafeValue {
    match value {
        SafeValue::Table(table) => SafeValue::Table(order_table(table, path)),
        SafeValue::Tuple(items) => SafeValue::Tuple(
            items
                .into_iter()
                .map(|item| order_value(item, path))
                .collect(),
        ),
        SafeValue::Set(items) => {
            let items = order_items(items, path);
            SafeValue::Array(sorted_naturally(items, itself))
        }
        SafeValue::Array(items) => {
            let items = order_items(items, path);
            SafeValue::Array(apply_rule(items, path))
        }
        scalar => scalar,
    }
}

/// Sort `table` by key and order each value beneath `path`.
#[must_use]
pub fn order_table(table: SafeTable, path: &str) -> SafeTable {
    let mut entries: Vec<(String, SafeValue)> = table.into_iter().collect();
    entries.sort_by(|(left, _), (right, _)| left.cmp(right));
    entries
        .into_iter()
        .map(|(key, value)| {
            let child = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            (key, order_value(value, &child))
        })
        .collect()
}

/// Build the output document: the ordered `needs` table beside the extra root
/// entries, all root keys sorted.
///
/// Extra entries are only key-sorted; array rules never apply to them.
#[must_use]
pub fn assemble_document(needs: SafeTable, extra: SafeTable) -> toml::Table {
    let mut root = SafeTable::with_capacity(extra.len() + 1);
    for (key, value) in extra {
        root.insert(key, sort_keys(value));
    }
    root.insert("needs".to_owned(), SafeValue::Table(order_table(needs, "")));
    root.sort_keys();
    table_to_toml(root)
}

fn order_items(items: Vec<SafeValue>, path: &str) -> Vec<SafeValue> {
    let element_path = format!("{path}[]");
    items
        .into_iter()
        .map(|item| order_value(item, &element_path))
        .collect()
}

fn apply_rule(items: Vec<SafeValue>, path: &str) -> Vec<SafeValue> {
    if path == EXTRA_OPTIONS {
        return if items.iter().all(|item| item.as_table().is_some()) {
            sorted_naturally(items, |item| field(item, "name"))
        } else if items.iter().all(|item| item.as_str().is_some()) {
            sorted_naturally(items, itself)
        } else {
            items
        };
    }
    match sort_rule(path) {
        Some(SortRule::ByKey(key)) => sorted_naturally(items, |item| field(item, key)),
        Some(SortRule::Scalars) => sorted_by_scalar(items, itself),
        None => items,
    }
}

fn itself(item: &SafeValue) -> Option<&SafeValue> {
    Some(item)
}

fn field<'a>(item: &'a SafeValue, key: &str) -> Option<&'a SafeValue> {
    item.as_table()?.get(key)
}

/// Stable sort by the natural order of the scalar each item selects.
///
/// Booleans, integers and floats compare as numbers; text and datetimes only
/// compare among themselves. Items stay unchanged unless every one selects a
/// scalar and all of them are mutually comparable.
fn sorted_naturally<F>(items: Vec<SafeValue>, select: F) -> Vec<SafeValue>
where
    F: for<'a> Fn(&'a SafeValue) -> Option<&'a SafeValue>,
{
    let Some(keys) = items
        .iter()
        .map(|item| select(item).and_then(NaturalKey::of))
        .collect::<Option<Vec<_>>>()
    else {
        return items;
    };
    let mut kinds = keys.iter().map(mem::discriminant);
    if let Some(first) = kinds.next()
        && !kinds.all(|kind| kind == first)
    {
        return items;
    }
    let order = sort_order(keys, NaturalKey::compare);
    reordered(items, order)
}

/// Stable sort by `(type name, value)` of the scalar each item selects, or
/// the items unchanged when one of them is not a comparable scalar.
fn sorted_by_scalar<F>(items: Vec<SafeValue>, select: F) -> Vec<SafeValue>
where
    F: for<'a> Fn(&'a SafeValue) -> Option<&'a SafeValue>,
{
    let Some(keys) = items
        .iter()
        .map(|item| select(item).and_then(ScalarKey::of))
        .collect::<Option<Vec<_>>>()
    else {
        return items;
    };
    let order = sort_order(keys, |left, right| {
        left.partial_cmp(right).unwrap_or(Ordering::Equal)
    });
    reordered(items, order)
}

/// Indices of `keys` after a stable sort.
fn sort_order<K>(keys: Vec<K>, compare: impl Fn(&K, &K) -> Ordering) -> Vec<usize> {
    let mut indexed: Vec<(K, usize)> = keys.into_iter().zip(0..).collect();
    indexed.sort_by(|(left, _), (right, _)| compare(left, right));
    indexed.into_iter().map(|(_, index)| index).collect()
}

fn reordered(items: Vec<SafeValue>, order: Vec<usize>) -> Vec<SafeValue> {
    let mut slots: Vec<Option<SafeValue>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect()
}

/// Natural sort key. Keys of different variants never compare.
#[derive(Debug)]
enum NaturalKey<'a> {
    Number(Number),
    Datetime(String),
    Text(&'a str),
}

impl<'a> NaturalKey<'a> {
    fn of(value: &'a SafeValue) -> Option<Self> {
        Some(match value {
            SafeValue::Boolean(flag) => Self::Number(Number::Bool(*flag)),
            SafeValue::Integer(int) => Self::Number(Number::Int(*int)),
            SafeValue::Float(float) if float.is_nan() => return None,
            SafeValue::Float(float) => Self::Number(Number::Float(*float)),
            SafeValue::Datetime(datetime) => Self::Datetime(datetime.to_string()),
            SafeValue::Text(text) => Self::Text(text),
            SafeValue::Table(_) | SafeValue::Array(_) | SafeValue::Tuple(_) | SafeValue::Set(_) => {
                return None;
            }
        })
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => left.compare(*right),
            (Self::Datetime(left), Self::Datetime(right)) => left.cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            _ => Ordering::Equal,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Number {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Number {
    /// Numeric comparison; equal values order by type name so that `1` and
    /// `1.0` land the same way whatever their input order.
    fn compare(self, other: Self) -> Ordering {
        let by_value = match (self.as_int(), other.as_int()) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => self.as_float().total_cmp(&other.as_float()),
        };
        by_value.then_with(|| self.rank().cmp(&other.rank()))
    }

    fn as_int(self) -> Option<i64> {
        match self {
            Self::Bool(flag) => Some(i64::from(flag)),
            Self::Int(int) => Some(int),
            Self::Float(_) => None,
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "integers only meet floats here, where float precision applies"
    )]
    fn as_float(self) -> f64 {
        match self {
            Self::Bool(flag) => f64::from(u8::from(flag)),
            Self::Int(int) => int as f64,
            Self::Float(float) => float,
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Float(_) => 1,
            Self::Int(_) => 2,
        }
    }
}

/// Sort key of a scalar. Variants are declared in type-name order so the
/// derived ordering compares type names first.
#[derive(Debug, PartialEq, PartialOrd)]
enum ScalarKey<'a> {
    Bool(bool),
    Datetime(String),
    Float(f64),
    Int(i64),
    Str(&'a str),
}

impl<'a> ScalarKey<'a> {
    fn of(value: &'a SafeValue) -> Option<Self> {
        Some(match value {
            SafeValue::Boolean(flag) => Self::Bool(*flag),
            SafeValue::Datetime(datetime) => Self::Datetime(datetime.to_string()),
            SafeValue::Float(float) if float.is_nan() => return None,
            SafeValue::Float(float) => Self::Float(*float),
            SafeValue::Integer(int) => Self::Int(*int),
            SafeValue::Text(text) => Self::Str(text),
            SafeValue::Table(_) | SafeValue::Array(_) | SafeValue::Tuple(_) | SafeValue::Set(_) => {
                return None;
            }
        })
    }
}

fn sort_keys(value: SafeValue) -> SafeValue {
    match value {
        SafeValue::Table(table) => {
            let mut sorted: SafeTable = table
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            sorted.sort_keys();
            SafeValue::Table(sorted)
        }
        SafeValue::Array(items) => SafeValue::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn table<const N: usize>(entries: [(&str, SafeValue); N]) -> SafeValue {
        SafeValue::Table(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        )
    }

    fn named(key: &str, names: &[&str]) -> SafeValue {
        SafeValue::Array(
            names
                .iter()
                .map(|name| table([(key, SafeValue::from(*name))]))
                .collect(),
        )
    }

    fn texts(items: &[&str]) -> SafeValue {
        SafeValue::Array(items.iter().map(|item| SafeValue::from(*item)).collect())
    }

    #[rstest]
    #[case::statuses("statuses", "name")]
    #[case::tags("tags", "name")]
    #[case::types("types", "title")]
    #[case::extra_links("extra_links", "option")]
    #[case::external_needs("external_needs", "id_prefix")]
    fn rule_keyed_arrays_are_sorted(#[case] path: &str, #[case] key: &str) {
        assert_eq!(
            order_value(named(key, &["open", "closed", "in_progress"]), path),
            named(key, &["closed", "in_progress", "open"])
        );
    }

    #[test]
    fn arrays_without_rule_keep_their_order() {
        let value = texts(&["b", "a"]);
        assert_eq!(order_value(value.clone(), "other"), value);
    }

    #[test]
    fn keyed_sort_requires_key_everywhere() {
        let value = SafeValue::Array(vec![
            table([("name", "b".into())]),
            table([("title", "a".into())]),
        ]);
        assert_eq!(order_value(value.clone(), "statuses"), value);
    }

    #[test]
    fn scalar_rule_sorts_by_type_then_value() {
        let value = SafeValue::Array(vec!["b".into(), 2_i64.into(), "a".into(), 1_i64.into()]);
        assert_eq!(
            order_value(value, "variant_options"),
            SafeValue::Array(vec![1_i64.into(), 2_i64.into(), "a".into(), "b".into()])
        );
    }

    #[test]
    fn scalar_rule_leaves_incomparable_items() {
        let value = SafeValue::Array(vec![SafeValue::Float(f64::NAN), SafeValue::Float(1.0)]);
        let SafeValue::Array(items) = order_value(value, "flow_link_types") else {
            panic!("expected array");
        };
        assert!(matches!(items.first(), Some(SafeValue::Float(f)) if f.is_nan()));
    }

    #[rstest]
    #[case::names(texts(&["b", "a"]), texts(&["a", "b"]))]
    #[case::tables(named("name", &["y", "x"]), named("name", &["x", "y"]))]
    #[case::mixed(
        SafeValue::Array(vec!["b".into(), table([("name", "a".into())])]),
        SafeValue::Array(vec!["b".into(), table([("name", "a".into())])])
    )]
    fn extra_options_are_sorted_by_name(#[case] input: SafeValue, #[case] expected: SafeValue) {
        assert_eq!(order_value(input, "extra_options"), expected);
    }

    #[test]
    fn nested_tables_are_key_sorted_and_rules_do_not_leak_into_elements() {
        let types = SafeValue::Array(vec![
            table([("title", "B".into()), ("directive", "b".into())]),
            table([
                ("title", "A".into()),
                ("tags", texts(&["z", "y"])),
            ]),
        ]);
        let ordered = order_value(types, "types");
        let SafeValue::Array(items) = ordered else {
            panic!("expected array");
        };
        let first = items.first().and_then(SafeValue::as_table);
        assert_eq!(
            first.map(|t| t.keys().cloned().collect::<Vec<_>>()),
            Some(vec!["tags".to_owned(), "title".to_owned()])
        );
        assert_eq!(first.and_then(|t| t.get("tags")), Some(&texts(&["z", "y"])));
    }

    #[test]
    fn sets_become_sorted_arrays() {
        let value = SafeValue::Set(vec!["b".into(), "c".into(), "a".into()]);
        assert_eq!(order_value(value, "anything"), texts(&["a", "b", "c"]));
    }

    #[rstest]
    #[case::numbers(
        vec![2_i64.into(), SafeValue::Float(1.5), 1_i64.into()],
        vec![1_i64.into(), SafeValue::Float(1.5), 2_i64.into()]
    )]
    #[case::flags_and_integers(
        vec![true.into(), 0_i64.into()],
        vec![0_i64.into(), true.into()]
    )]
    #[case::equal_values(
        vec![1_i64.into(), SafeValue::Float(1.0), true.into()],
        vec![true.into(), SafeValue::Float(1.0), 1_i64.into()]
    )]
    fn mixed_number_sets_sort_the_same_in_any_order(
        #[case] items: Vec<SafeValue>,
        #[case] expected: Vec<SafeValue>,
    ) {
        let mut reversed = items.clone();
        reversed.reverse();
        for input in [items, reversed] {
            assert_eq!(
                order_value(SafeValue::Set(input), "flags"),
                SafeValue::Array(expected.clone())
            );
        }
    }

    #[test]
    fn sets_mixing_text_and_numbers_keep_their_order() {
        let items = vec![SafeValue::from("b"), 1_i64.into()];
        assert_eq!(
            order_value(SafeValue::Set(items.clone()), "flags"),
            SafeValue::Array(items)
        );
    }

    #[test]
    fn keyed_sort_compares_mixed_numbers() {
        let ranked = |ranks: Vec<SafeValue>| {
            SafeValue::Array(ranks.into_iter().map(|rank| table([("name", rank)])).collect())
        };
        let value = ranked(vec![3_i64.into(), SafeValue::Float(2.5), 1_i64.into()]);
        assert_eq!(
            order_value(value, "statuses"),
            ranked(vec![1_i64.into(), SafeValue::Float(2.5), 3_i64.into()])
        );
    }

    #[test]
    fn document_root_keys_are_sorted() {
        let mut needs = SafeTable::new();
        needs.insert("statuses".to_owned(), named("name", &["open", "closed"]));
        needs.insert("build_json".to_owned(), true.into());
        let mut extra = SafeTable::new();
        extra.insert("project".to_owned(), table([("z", 1_i64.into()), ("a", 2_i64.into())]));
        extra.insert("alpha".to_owned(), "x".into());

        let document = assemble_document(needs, extra);
        let roots: Vec<&str> = document.keys().map(String::as_str).collect();
        assert_eq!(roots, ["alpha", "needs", "project"]);
        let project: Vec<&str> = document
            .get("project")
            .and_then(toml::Value::as_table)
            .map(|t| t.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(project, ["a", "z"]);
    }

    #[test]
    fn ordering_is_idempotent() {
        let value = table([
            ("types", named("title", &["b", "a"])),
            ("extra_options", texts(&["y", "x"])),
            ("flags", SafeValue::Set(vec![2_i64.into(), 1_i64.into()])),
        ]);
        let once = order_value(value, "");
        assert_eq!(order_value(once.clone(), ""), once);
    }
}
