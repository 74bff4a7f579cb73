// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::Result;

/// Load a project descriptor from a given path and return the raw
/// `RawProjectFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProjectFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_raw(&contents)
}

pub fn parse_raw(contents: &str) -> Result<RawProjectFile> {
    let raw: RawProjectFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a project descriptor and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks unit names, associations, shared sources and watch patterns.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectFile> {
    let raw = load_from_path(&path)?;
    ProjectFile::try_from(raw)
}

/// Parse and validate descriptor text (no file involved).
pub fn parse_and_validate(contents: &str) -> Result<ProjectFile> {
    ProjectFile::try_from(parse_raw(contents)?)
}

/// `Incbuild.toml` in the current working directory.
pub fn default_project_path() -> PathBuf {
    PathBuf::from("Incbuild.toml")
}

/// Directory the descriptor's relative paths are resolved against.
///
/// A bare file name (`Incbuild.toml`, parent = "") resolves to the current
/// working directory.
pub fn project_root(descriptor: &Path) -> PathBuf {
    match descriptor.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
