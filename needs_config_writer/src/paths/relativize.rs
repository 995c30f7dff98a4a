//! Rewrite absolute paths relative to the output file's directory.
//!
//! Build systems such as Bazel materialise outputs inside deep cache trees
//! and expose them through a short symlink next to the workspace. A plain
//! common-ancestor walk would produce `../../../../.cache/...`; probing the
//! base directory's ancestors for such links yields `../bazel-out/...`.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// How many ancestors of the base directory are probed for symlinks.
const MAX_SYMLINK_PROBE_DEPTH: usize = 16;

/// Express `target` relative to the directory `base_dir`.
///
/// Both paths are resolved first: symlinks in their existing prefixes are
/// followed and `.`/`..` components removed. The result is, in order of
/// preference:
///
/// 1. the remainder when `target` lies below `base_dir` (`.` when equal);
/// 2. the shorter of the common-ancestor walk (`../` per level up, then the
///    diverging tail) and the shortest route through a symlink found in
///    `base_dir` or one of its ancestors, the walk winning ties;
/// 3. the resolved `target` unchanged when the two paths share no root.
///
/// ```
/// use camino::Utf8Path;
/// use needs_config_writer::relativize_path;
///
/// # #[cfg(unix)]
/// assert_eq!(
///     relativize_path(Utf8Path::new("/nonexistent/a/sibling/file.txt"), Utf8Path::new("/nonexistent/a/out")),
///     "../sibling/file.txt",
/// );
/// ```
#[must_use]
pub fn relativize_path(target: &Utf8Path, base_dir: &Utf8Path) -> String {
    let target = resolve_lenient(target);
    let base = resolve_lenient(base_dir);

    if let Ok(rest) = target.strip_prefix(&base) {
        return display_relative(rest.to_path_buf());
    }

    let Some(walk) = common_ancestor_walk(&target, &base) else {
        return target.into_string();
    };

    match shortest_symlink_route(&target, &base) {
        Some(route) if route.len() < walk.len() => route,
        _ => walk,
    }
}

fn common_ancestor_walk(target: &Utf8Path, base: &Utf8Path) -> Option<String> {
    let target_parts: Vec<Utf8Component<'_>> = target.components().collect();
    let base_parts: Vec<Utf8Component<'_>> = base.components().collect();
    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(left, right)| left == right)
        .count();
    if common == 0 {
        return None;
    }

    let mut relative = parent_steps(base_parts.len() - common);
    for part in target_parts.iter().skip(common) {
        relative.push(part.as_str());
    }
    Some(display_relative(relative))
}

/// Look for `<ancestor>/<link>` where `<link>` resolves to a directory that
/// contains `target`, returning the shortest route found.
fn shortest_symlink_route(target: &Utf8Path, base: &Utf8Path) -> Option<String> {
    let mut best: Option<String> = None;
    for (levels_up, dir) in base.ancestors().take(MAX_SYMLINK_PROBE_DEPTH + 1).enumerate() {
        for link in symlinks_in(dir) {
            let Some(resolved) = canonicalise(&link) else {
                continue;
            };
            // Links back into our own ancestry only add detours.
            if dir.starts_with(&resolved) {
                continue;
            }
            let (Ok(rest), Some(name)) = (target.strip_prefix(&resolved), link.file_name()) else {
                continue;
            };
            let mut route = parent_steps(levels_up);
            route.push(name);
            if !rest.as_str().is_empty() {
                route.push(rest);
            }
            let route = display_relative(route);
            if best.as_ref().is_none_or(|current| route.len() < current.len()) {
                best = Some(route);
            }
        }
    }
    best
}

/// Symlinks directly inside `dir`, sorted by name. Unreadable directories
/// contribute nothing.
fn symlinks_in(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let Ok(entries) = dir.read_dir_utf8() else {
        return Vec::new();
    };
    let mut links: Vec<Utf8PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_symlink()))
        .map(|entry| entry.path().to_path_buf())
        .collect();
    links.sort();
    links
}

fn parent_steps(levels: usize) -> Utf8PathBuf {
    let mut path = Utf8PathBuf::new();
    for _ in 0..levels {
        path.push("..");
    }
    path
}

fn display_relative(path: Utf8PathBuf) -> String {
    if path.as_str().is_empty() {
        ".".to_owned()
    } else {
        path.into_string()
    }
}

/// Resolve symlinks in the longest existing prefix of `path`, then append the
/// remaining components lexically.
fn resolve_lenient(path: &Utf8Path) -> Utf8PathBuf {
    let mut existing = path;
    let mut tail: Vec<&str> = Vec::new();
    loop {
        if let Some(mut resolved) = canonicalise(existing) {
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return normalise_lexically(&resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                existing = parent;
            }
            _ => return normalise_lexically(path),
        }
    }
}

fn normalise_lexically(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if matches!(
                    out.components().next_back(),
                    None | Some(Utf8Component::ParentDir)
                ) {
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

fn canonicalise(path: &Utf8Path) -> Option<Utf8PathBuf> {
    #[cfg(windows)]
    let resolved = dunce::canonicalize(path).ok()?;
    #[cfg(not(windows))]
    let resolved = std::fs::canonicalize(path).ok()?;
    Utf8PathBuf::from_path_buf(resolved).ok()
}
