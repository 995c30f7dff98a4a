//! Deterministic writer for Sphinx-Needs configuration documents.
//!
//! The crate turns a snapshot of a host's `needs_*` settings into a
//! reproducible `ubproject.toml`. Values are sanitised into a TOML-safe tree,
//! optionally merged with partial documents from disk, sorted into a
//! canonical order and finally written only when the rendered text differs
//! from what is already on disk.
//!
//! ```rust,no_run
//! use needs_config_writer::{Anchors, ConfigWriter, Namespace, TracingSink, WriterOptions};
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut namespace = Namespace::new();
//! namespace.set("needs_build_json", true);
//!
//! let options = WriterOptions::load(&namespace)?;
//! let anchors = Anchors::new("docs/_build/html", "docs", "docs");
//! let outcome = ConfigWriter::new(options, anchors).write(&namespace, &mut TracingSink)?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

mod collect;
mod error;
mod events;
mod merge;
mod namespace;
mod options;
mod order;
pub mod paths;
mod pipeline;
mod sanitize;
mod value;
mod writer;

pub use collect::collect_attributes;
pub use error::{MergeSourceError, OptionsError, WriteError};
pub use events::{Event, EventSink, INFO_CATEGORY, Level, Subtype, TracingSink, WARNING_CATEGORY};
pub use merge::{MergedTables, load_merge_source, merge_sources};
pub use namespace::{NEEDS_PREFIX, Namespace};
pub use options::{ENV_PREFIX, OPTIONS_PREFIX, RelativePathField, WriterOptions};
pub use order::{SortRule, assemble_document, order_table, order_value, sort_rule};
pub use paths::{Anchors, PathSpec, relativize_path, resolve_path_template};
pub use pipeline::ConfigWriter;
pub use sanitize::Sanitizer;
pub use value::{RawValue, SafeTable, SafeValue};
pub use writer::{
    HEADER, WriteOutcome, WritePolicy, diff_preview, render_document, write_if_changed,
};
