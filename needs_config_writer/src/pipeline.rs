//! The collect, sanitize, merge, order and write pipeline.

use camino::Utf8PathBuf;

use crate::collect::collect_attributes;
use crate::error::WriteError;
use crate::events::EventSink;
use crate::merge::merge_sources;
use crate::namespace::Namespace;
use crate::options::WriterOptions;
use crate::order::assemble_document;
use crate::paths::{Anchors, resolve_path_template};
use crate::sanitize::Sanitizer;
use crate::writer::{WriteOutcome, WritePolicy, render_document, write_if_changed};

/// Writes the `needs` configuration of a namespace snapshot to disk.
#[derive(Clone, Debug)]
pub struct ConfigWriter {
    options: WriterOptions,
    anchors: Anchors,
}

impl ConfigWriter {
    /// A writer applying `options` with paths resolved against `anchors`.
    #[must_use]
    pub const fn new(options: WriterOptions, anchors: Anchors) -> Self {
        Self { options, anchors }
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Resolved location of the output file.
    #[must_use]
    pub fn output_path(&self) -> Utf8PathBuf {
        resolve_path_template(&self.options.outpath, &self.anchors)
    }

    /// Build the ordered output document for `namespace`.
    pub fn build_document(&self, namespace: &Namespace, sink: &mut dyn EventSink) -> toml::Table {
        let sanitizer =
            Sanitizer::for_output(&self.options.relativize_paths, &self.output_path(), sink);
        let attributes = collect_attributes(namespace, &self.options, &sanitizer, sink);
        let merged = merge_sources(
            attributes,
            &self.options.merge_toml_files,
            &self.anchors,
            sink,
        );
        assemble_document(merged.needs, merged.extra)
    }

    /// Render the file content for `namespace` without touching the target.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Render`] when the document cannot be encoded.
    pub fn render(&self, namespace: &Namespace, sink: &mut dyn EventSink) -> Result<String, WriteError> {
        render_document(&self.build_document(namespace, sink), self.options.add_header)
    }

    /// Render and persist the file for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`] when rendering fails or the target cannot be
    /// read, created or written. Every other problem is reported to `sink`.
    pub fn write(
        &self,
        namespace: &Namespace,
        sink: &mut dyn EventSink,
    ) -> Result<WriteOutcome, WriteError> {
        let content = self.render(namespace, sink)?;
        let policy = WritePolicy {
            warn_on_diff: self.options.warn_on_diff,
            overwrite: self.options.overwrite,
        };
        write_if_changed(&self.output_path(), &content, policy, sink)
    }
}
