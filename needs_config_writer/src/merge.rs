//! Shallow merging of auxiliary TOML documents.

use std::io;

use camino::Utf8Path;

use crate::error::MergeSourceError;
use crate::events::{Event, EventSink, Subtype};
use crate::paths::{Anchors, resolve_path_template};
use crate::value::{SafeTable, SafeValue, table_from_toml};

/// Root key whose table is merged into the collected attributes.
const NEEDS_KEY: &str = "needs";

/// Merge results: the attributes with every source's `needs` entries applied,
/// plus the other root keys the sources contributed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedTables {
    /// Contents of the output `needs` table.
    pub needs: SafeTable,
    /// Root entries other than `needs`; later sources replace earlier ones.
    pub extra: SafeTable,
}

/// Read and decode the merge source at `path`.
///
/// # Errors
///
/// Returns [`MergeSourceError::NotFound`] when nothing exists at `path`,
/// [`MergeSourceError::Read`] for other I/O failures and
/// [`MergeSourceError::Parse`] when the contents are not TOML.
pub fn load_merge_source(path: &Utf8Path) -> Result<toml::Table, MergeSourceError> {
    let data = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => MergeSourceError::NotFound {
            path: path.to_path_buf(),
        },
        _ => MergeSourceError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    toml::from_str(&data).map_err(|source| MergeSourceError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Apply the merge sources named by `templates`, in order, on top of
/// `attributes`.
///
/// Sources that cannot be loaded produce a `merge_failed` warning and are
/// skipped; the remaining sources still apply.
pub fn merge_sources(
    attributes: SafeTable,
    templates: &[String],
    anchors: &Anchors,
    sink: &mut dyn EventSink,
) -> MergedTables {
    let mut merged = MergedTables {
        needs: attributes,
        extra: SafeTable::new(),
    };
    for template in templates {
        let path = resolve_path_template(template, anchors);
        let result = load_merge_source(&path).and_then(|document| merged.apply(&path, document));
        match result {
            Ok(()) => sink.emit(Event::info(format!(
                "Merged TOML configuration from '{path}'"
            ))),
            Err(err) => sink.emit(
                Event::warning(
                    Subtype::MergeFailed,
                    format!("{err} (from template '{template}')"),
                )
                .at(path.as_str()),
            ),
        }
    }
    merged
}

impl MergedTables {
    fn apply(&mut self, path: &Utf8Path, document: toml::Table) -> Result<(), MergeSourceError> {
        if let Some(needs) = document.get(NEEDS_KEY)
            && !needs.is_table()
        {
            return Err(MergeSourceError::NeedsNotTable {
                path: path.to_path_buf(),
                found: needs.type_str(),
            });
        }
        for (key, value) in document {
            match value {
                toml::Value::Table(needs) if key == NEEDS_KEY => {
                    self.needs.extend(table_from_toml(needs));
                }
                value => {
                    self.extra.insert(key, SafeValue::from(value));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use test_helpers::fs::TempProject;

    fn project() -> Result<(TempProject, Anchors)> {
        let project = TempProject::new()?;
        let anchors = Anchors::new(project.path("_build"), project.root(), project.root());
        Ok((project, anchors))
    }

    #[test]
    fn missing_source_is_reported_as_not_found() {
        let err = load_merge_source(Utf8Path::new("/nonexistent/shared.toml"));
        assert!(matches!(err, Err(MergeSourceError::NotFound { .. })));
    }

    #[test]
    fn later_sources_win_and_extra_roots_are_kept() -> Result<()> {
        let (project, anchors) = project()?;
        project.write(
            "a.toml",
            "[needs]\nbuild_json = false\nid_length = 3\n\n[project]\nname = \"a\"\n",
        )?;
        project.write("b.toml", "[needs]\nbuild_json = true\n\n[project]\nname = \"b\"\n")?;
        let mut attributes = SafeTable::new();
        attributes.insert("build_json".to_owned(), SafeValue::Boolean(false));
        attributes.insert("title".to_owned(), SafeValue::from("kept"));

        let mut events = Vec::new();
        let merged = merge_sources(
            attributes,
            &["a.toml".to_owned(), "${srcdir}/b.toml".to_owned()],
            &anchors,
            &mut events,
        );

        ensure!(merged.needs.get("build_json") == Some(&SafeValue::Boolean(true)));
        ensure!(merged.needs.get("id_length") == Some(&SafeValue::Integer(3)));
        ensure!(merged.needs.get("title") == Some(&SafeValue::from("kept")));
        let project = merged.extra.get("project").and_then(SafeValue::as_table);
        ensure!(
            project.and_then(|table| table.get("name")) == Some(&SafeValue::from("b")),
            "got {:?}",
            merged.extra
        );
        ensure!(events.len() == 2 && events.iter().all(|event| !event.is_warning()));
        Ok(())
    }

    #[test]
    fn broken_sources_warn_and_are_skipped() -> Result<()> {
        let (project, anchors) = project()?;
        project.write("bad.toml", "needs = [")?;
        project.write("scalar.toml", "needs = 1\n")?;
        project.mkdir("folder.toml")?;
        let mut events = Vec::new();
        let merged = merge_sources(
            SafeTable::new(),
            &[
                "missing.toml".to_owned(),
                "bad.toml".to_owned(),
                "scalar.toml".to_owned(),
                "folder.toml".to_owned(),
            ],
            &anchors,
            &mut events,
        );
        ensure!(merged == MergedTables::default());
        ensure!(events.len() == 4, "got {events:?}");
        ensure!(
            events
                .iter()
                .all(|event| event.subtype == Some(Subtype::MergeFailed))
        );
        let first = events.first().map(|event| event.message.as_str()).unwrap_or_default();
        ensure!(
            first.starts_with("TOML file to merge not found: '")
                && first.ends_with("(from template 'missing.toml')"),
            "got {first}"
        );
        let last = events.last().map(|event| event.message.as_str()).unwrap_or_default();
        ensure!(last.starts_with("Failed to read TOML file '"), "got {last}");
        Ok(())
    }
}
