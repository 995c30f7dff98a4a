//! Rendering and change-aware persistence of the output document.

use std::fmt;
use std::io;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use similar::TextDiff;

use crate::error::WriteError;
use crate::events::{Event, EventSink, Subtype};

/// Comment block prepended to generated files.
pub const HEADER: &str = "\
# This file is auto-generated by needs-config-writer.
# It is a duplicate of shared and local configs to make tools like ubCode / ubc work.
# Do not manually modify it - changes will be overwritten.

";

/// Longest diff preview included in a `content_diff` warning.
const MAX_DIFF_LINES: usize = 50;

/// What to do when the target already exists.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WritePolicy {
    /// Warn with a diff preview when the content differs.
    pub warn_on_diff: bool,
    /// Replace differing content.
    pub overwrite: bool,
}

/// What [`write_if_changed`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    /// The target did not exist and was written.
    Created,
    /// The target differed and was overwritten.
    Updated,
    /// The target already held exactly this content.
    Unchanged,
    /// The target differed but overwriting is disabled.
    ChangedNotOverwritten,
}

impl WriteOutcome {
    /// Whether the target's content now differs from what was rendered.
    #[must_use]
    pub const fn is_stale(self) -> bool {
        matches!(self, Self::ChangedNotOverwritten)
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::ChangedNotOverwritten => "changed, not overwritten",
        })
    }
}

/// Encode `document` as TOML, optionally behind [`HEADER`].
///
/// # Errors
///
/// Returns [`WriteError::Render`] when the document cannot be encoded.
pub fn render_document(document: &toml::Table, add_header: bool) -> Result<String, WriteError> {
    let body = toml::to_string(document)?;
    Ok(if add_header {
        format!("{HEADER}{body}")
    } else {
        body
    })
}

/// Unified diff from `existing` to `new`, truncated to the first fifty lines.
#[must_use]
pub fn diff_preview(existing: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(existing, new)
        .unified_diff()
        .header("existing", "new")
        .to_string();
    let lines: Vec<&str> = diff.lines().collect();
    let mut preview = lines
        .iter()
        .take(MAX_DIFF_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    if lines.len() > MAX_DIFF_LINES {
        preview.push_str(&format!(
            "\n... ({} more lines)",
            lines.len() - MAX_DIFF_LINES
        ));
    }
    preview
}

/// Persist `content` at `target` unless it is already there.
///
/// Missing parent directories are created. All decisions are reported to
/// `sink`.
///
/// # Errors
///
/// Returns [`WriteError::Io`] when reading the existing file, creating its
/// directory or writing fails, and [`WriteError::NotAFile`] when `target`
/// has no file name.
pub fn write_if_changed(
    target: &Utf8Path,
    content: &str,
    policy: WritePolicy,
    sink: &mut dyn EventSink,
) -> Result<WriteOutcome, WriteError> {
    let file_name = target
        .file_name()
        .ok_or_else(|| WriteError::NotAFile(target.to_path_buf()))?;
    let parent = target
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));

    let Some(existing) = read_existing(parent, file_name)? else {
        let dir = ensure_dir(parent)?;
        dir.write(file_name, content)
            .map_err(|err| WriteError::io(target, err))?;
        sink.emit(Event::info(format!(
            "Needs configuration written to '{target}'"
        )));
        return Ok(WriteOutcome::Created);
    };

    if existing == content {
        sink.emit(Event::info(format!(
            "Needs configuration unchanged - not rewriting '{target}'"
        )));
        return Ok(WriteOutcome::Unchanged);
    }

    if policy.warn_on_diff {
        sink.emit(
            Event::warning(
                Subtype::ContentDiff,
                format!(
                    "Content of existing file '{target}' differs from new configuration:\n{}",
                    diff_preview(&existing, content)
                ),
            )
            .at(target.as_str()),
        );
    }

    if !policy.overwrite {
        sink.emit(Event::info(format!(
            "Needs configuration changed but not overwriting '{target}' (needscfg_overwrite=False)"
        )));
        return Ok(WriteOutcome::ChangedNotOverwritten);
    }

    let dir = ensure_dir(parent)?;
    dir.write(file_name, content)
        .map_err(|err| WriteError::io(target, err))?;
    sink.emit(Event::info(format!(
        "Updated needs configuration written to '{target}'"
    )));
    Ok(WriteOutcome::Updated)
}

/// Current content of `parent/file_name`, `None` when either does not exist.
fn read_existing(parent: &Utf8Path, file_name: &str) -> Result<Option<String>, WriteError> {
    let dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(WriteError::io(parent, err)),
    };
    match dir.read_to_string(file_name) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(WriteError::io(parent.join(file_name), err)),
    }
}

fn ensure_dir(path: &Utf8Path) -> Result<Dir, WriteError> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(dir),
        Err(open_err) if open_err.kind() == io::ErrorKind::NotFound => {
            Dir::create_ambient_dir_all(path, ambient_authority())
                .map_err(|err| WriteError::io(path, err))?;
            Dir::open_ambient_dir(path, ambient_authority()).map_err(|err| WriteError::io(path, err))
        }
        Err(open_err) => Err(WriteError::io(path, open_err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Level;
    use anyhow::{Result, ensure};
    use rstest::rstest;
    use test_helpers::fs::TempProject;

    const OVERWRITE: WritePolicy = WritePolicy {
        warn_on_diff: true,
        overwrite: true,
    };
    const KEEP: WritePolicy = WritePolicy {
        warn_on_diff: true,
        overwrite: false,
    };

    #[test]
    fn header_is_three_comment_lines_and_a_blank_line() -> Result<()> {
        let mut document = toml::Table::new();
        let mut needs = toml::Table::new();
        needs.insert("build_json".to_owned(), toml::Value::Boolean(true));
        document.insert("needs".to_owned(), toml::Value::Table(needs));

        let rendered = render_document(&document, true)?;
        ensure!(rendered == format!("{HEADER}[needs]\nbuild_json = true\n"), "got {rendered}");
        ensure!(HEADER.lines().filter(|line| line.starts_with('#')).count() == 3);
        ensure!(render_document(&document, false)? == "[needs]\nbuild_json = true\n");
        Ok(())
    }

    #[test]
    fn missing_target_and_parents_are_created() -> Result<()> {
        let project = TempProject::new()?;
        let target = project.path("_build/html/ubproject.toml");
        let mut events = Vec::new();
        let outcome = write_if_changed(&target, "a = 1\n", KEEP, &mut events)?;
        ensure!(outcome == WriteOutcome::Created);
        ensure!(std::fs::read_to_string(&target)? == "a = 1\n");
        ensure!(events.len() == 1 && !events.iter().any(Event::is_warning));
        Ok(())
    }

    #[rstest]
    #[case::overwrite(OVERWRITE, WriteOutcome::Updated, "a = 2\n")]
    #[case::keep(KEEP, WriteOutcome::ChangedNotOverwritten, "a = 1\n")]
    fn differing_target_follows_policy(
        #[case] policy: WritePolicy,
        #[case] expected: WriteOutcome,
        #[case] on_disk: &str,
    ) -> Result<()> {
        let project = TempProject::new()?;
        let target = project.write("ubproject.toml", "a = 1\n")?;
        let mut events = Vec::new();
        let outcome = write_if_changed(&target, "a = 2\n", policy, &mut events)?;
        ensure!(outcome == expected, "got {outcome}");
        ensure!(std::fs::read_to_string(&target)? == on_disk);
        let warnings: Vec<&Event> = events.iter().filter(|event| event.is_warning()).collect();
        ensure!(warnings.len() == 1, "got {events:?}");
        ensure!(warnings.iter().all(|event| event.subtype == Some(Subtype::ContentDiff)));
        Ok(())
    }

    #[test]
    fn identical_target_is_left_alone() -> Result<()> {
        let project = TempProject::new()?;
        let target = project.write("ubproject.toml", "a = 1\n")?;
        let before = std::fs::metadata(&target)?.modified()?;
        let mut events = Vec::new();
        let outcome = write_if_changed(&target, "a = 1\n", OVERWRITE, &mut events)?;
        ensure!(outcome == WriteOutcome::Unchanged);
        ensure!(std::fs::metadata(&target)?.modified()? == before);
        ensure!(events.iter().all(|event| event.level == Level::Info));
        Ok(())
    }

    #[test]
    fn diff_without_warning_when_disabled() -> Result<()> {
        let project = TempProject::new()?;
        let target = project.write("ubproject.toml", "a = 1\n")?;
        let policy = WritePolicy {
            warn_on_diff: false,
            overwrite: false,
        };
        let mut events = Vec::new();
        write_if_changed(&target, "a = 2\n", policy, &mut events)?;
        ensure!(!events.iter().any(Event::is_warning));
        Ok(())
    }

    #[test]
    fn diff_preview_is_truncated() {
        let existing: String = (0..100).map(|n| format!("old{n}\n")).collect();
        let new: String = (0..100).map(|n| format!("new{n}\n")).collect();
        let preview = diff_preview(&existing, &new);
        assert!(preview.starts_with("--- existing\n+++ new\n"));
        assert_eq!(preview.lines().count(), MAX_DIFF_LINES + 1);
        assert!(preview.ends_with("... (153 more lines)"));
    }
}
