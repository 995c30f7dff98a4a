//! Selection of the `needs_*` settings that make up the `needs` table.

use crate::events::EventSink;
use crate::namespace::{NEEDS_PREFIX, Namespace};
use crate::options::WriterOptions;
use crate::sanitize::Sanitizer;
use crate::value::SafeTable;

/// Gather the sanitized `needs_*` attributes of `namespace`, keyed by their
/// bare names and in namespace order.
///
/// A key is skipped when it is listed in `exclude_vars`, when it sanitizes to
/// nothing, or when `exclude_defaults` is set and the value equals the
/// registered default. Of the rest, only explicitly set keys are kept unless
/// `write_all` is on.
#[must_use]
pub fn collect_attributes(
    namespace: &Namespace,
    options: &WriterOptions,
    sanitizer: &Sanitizer,
    sink: &mut dyn EventSink,
) -> SafeTable {
    let mut attributes = SafeTable::new();
    for (key, value) in namespace.iter() {
        let Some(bare) = key.strip_prefix(NEEDS_PREFIX) else {
            continue;
        };
        if options.exclude_vars.iter().any(|excluded| excluded == key) {
            continue;
        }
        let Some(safe) = sanitizer.sanitize(value, &format!("needs.{bare}"), sink) else {
            continue;
        };
        if options.exclude_defaults && namespace.default_of(key) == Some(value) {
            continue;
        }
        if options.write_all || namespace.is_explicit(key) {
            attributes.insert(bare.to_owned(), safe);
        }
    }
    attributes
}
