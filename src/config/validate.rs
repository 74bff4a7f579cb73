// src/config/validate.rs

use std::collections::HashMap;
use std::path::Path;

use globset::Glob;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::{IncbuildError, Result};

impl TryFrom<RawProjectFile> for ProjectFile {
    type Error = IncbuildError;

    fn try_from(raw: RawProjectFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_project(&raw)?;
        Ok(ProjectFile::new_unchecked(raw))
    }
}

fn validate_raw_project(cfg: &RawProjectFile) -> Result<()> {
    validate_project_section(cfg)?;
    validate_unit_names(cfg)?;
    validate_associations(cfg)?;
    validate_sources(cfg)?;
    validate_watch_patterns(cfg)?;
    Ok(())
}

fn validate_project_section(cfg: &RawProjectFile) -> Result<()> {
    if cfg.project.output_dir.as_os_str().is_empty() {
        return Err(IncbuildError::ConfigError(
            "[project].output_dir must not be empty".to_string(),
        ));
    }
    if cfg.compiler.program.trim().is_empty() {
        return Err(IncbuildError::ConfigError(
            "[compiler].program must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_unit_names(cfg: &RawProjectFile) -> Result<()> {
    for name in cfg.unit.keys() {
        if !is_qualified_name(name) {
            return Err(IncbuildError::ConfigError(format!(
                "unit '{}' is not a valid (qualified) class name",
                name
            )));
        }
    }
    Ok(())
}

fn validate_associations(cfg: &RawProjectFile) -> Result<()> {
    for (name, unit) in cfg.unit.iter() {
        let Some(other) = &unit.association else {
            continue;
        };
        if other == name {
            return Err(IncbuildError::ConfigError(format!(
                "unit '{}' cannot be associated with itself",
                name
            )));
        }
        if !cfg.unit.contains_key(other) {
            return Err(IncbuildError::ConfigError(format!(
                "unit '{}' has unknown association '{}'",
                name, other
            )));
        }
    }
    Ok(())
}

fn validate_sources(cfg: &RawProjectFile) -> Result<()> {
    let mut owners: HashMap<&Path, &str> = HashMap::new();
    for (name, unit) in cfg.unit.iter() {
        let Some(source) = &unit.source else {
            continue;
        };
        if source.as_os_str().is_empty() {
            return Err(IncbuildError::ConfigError(format!(
                "unit '{}' has an empty `source`",
                name
            )));
        }
        if let Some(previous) = owners.insert(source.as_path(), name.as_str()) {
            return Err(IncbuildError::ConfigError(format!(
                "units '{}' and '{}' share the source file {:?}",
                previous, name, source
            )));
        }
    }
    Ok(())
}

fn validate_watch_patterns(cfg: &RawProjectFile) -> Result<()> {
    for pattern in cfg.watch.include.iter().chain(cfg.watch.exclude.iter()) {
        Glob::new(pattern).map_err(|e| {
            IncbuildError::ConfigError(format!("invalid watch pattern '{}': {}", pattern, e))
        })?;
    }
    Ok(())
}

/// Dotted Java identifier such as `Foo` or `pkg.Foo`.
pub fn is_qualified_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
