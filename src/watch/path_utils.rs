// src/watch/path_utils.rs

//! Path handling for watcher events.

use std::path::Path;

/// `path` relative to `root`, with forward slashes, for glob matching.
///
/// Falls back to comparing canonical forms, since notify may report a
/// different absolute prefix for the same directory (symlinks,
/// `/private/var` on macOS). A path that has already been deleted cannot be
/// canonicalized; its parent is tried instead.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slashed(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    if let Ok(path_canon) = path.canonicalize() {
        return path_canon.strip_prefix(&root_canon).ok().map(slashed);
    }

    let parent = path.parent()?.canonicalize().ok()?;
    let rel = parent.strip_prefix(&root_canon).ok()?;
    Some(slashed(&rel.join(path.file_name()?)))
}

fn slashed(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
