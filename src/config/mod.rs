// src/config/mod.rs

//! Project descriptor (`Incbuild.toml`): model, loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_project_path, load_and_validate, project_root};
pub use model::{
    CompilerSection, ProjectFile, ProjectSection, RawProjectFile, UnitConfig, WatchSection,
};
