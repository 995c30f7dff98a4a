//! Path handling: output anchors, path templates, relativization rules and
//! the relativizer itself.

mod pattern;
mod relativize;
mod template;

pub use pattern::PathSpec;
pub use relativize::relativize_path;
pub use template::{Anchors, resolve_path_template};

pub(crate) use pattern::compile_rules;
