// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::WatchSection;
use crate::fs::{walk_files, FileSystem};
use crate::watch::path_utils::relative_str;

/// Compiled `[watch]` include/exclude patterns.
///
/// Patterns are relative to the source root; the watcher passes relative
/// paths (e.g. `"pkg/Foo.java"`) into `matches`.
#[derive(Clone)]
pub struct SourceFilter {
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
    use_hash: bool,
}

impl fmt::Debug for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFilter")
            .field("include", &self.include_set.len())
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl SourceFilter {
    pub fn new(include: &[String], exclude: &[String], use_hash: bool) -> Result<Self> {
        let include_set = build_globset(include).context("building include globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };
        Ok(Self {
            include_set,
            exclude_set,
            use_hash,
        })
    }

    pub fn from_section(section: &WatchSection) -> Result<Self> {
        Self::new(&section.include, &section.exclude, section.use_hash)
    }

    /// Whether change events are filtered by content hash.
    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// True if a change to `rel_path` should reach the project.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// All files under `root` the filter accepts.
///
/// Used to seed the hash store, so the first save of an untouched file is
/// not reported as a change.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    filter: &SourceFilter,
) -> Result<Vec<PathBuf>> {
    let files = walk_files(fs, root)?
        .into_iter()
        .filter(|path| {
            relative_str(root, path)
                .map(|rel| filter.matches(&rel))
                .unwrap_or(false)
        })
        .collect();
    Ok(files)
}
