// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{HashStorageMode, UnitRole};

/// Project descriptor as read from TOML, before validation.
///
/// ```toml
/// [project]
/// source_root = "src"
/// output_dir = "classes"
/// classpath = ["lib/junit.jar"]
///
/// [compiler]
/// program = "javac"
/// args = ["-g"]
///
/// [unit.Shape]
/// source = "Shape.java"
///
/// [unit.ShapeTest]
/// source = "ShapeTest.java"
/// role = "unit_test"
/// association = "Shape"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawProjectFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub compiler: CompilerSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// Declared units, keyed by qualified name.
    #[serde(default)]
    pub unit: BTreeMap<String, UnitConfig>,
}

/// Validated project descriptor.
///
/// Only obtainable through `ProjectFile::try_from(RawProjectFile)`.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub project: ProjectSection,
    pub compiler: CompilerSection,
    pub watch: WatchSection,
    pub unit: BTreeMap<String, UnitConfig>,
}

impl ProjectFile {
    pub(crate) fn new_unchecked(raw: RawProjectFile) -> Self {
        Self {
            project: raw.project,
            compiler: raw.compiler,
            watch: raw.watch,
            unit: raw.unit,
        }
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Directory holding the sources, relative to the descriptor.
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Where compiled classes go, relative to the descriptor.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub classpath: Vec<PathBuf>,

    /// Pick up every `*.java` file under `source_root` as a unit, in addition
    /// to the declared ones.
    #[serde(default = "default_true")]
    pub discover: bool,
}

fn default_source_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("classes")
}

fn default_true() -> bool {
    true
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_dir: default_output_dir(),
            classpath: Vec::new(),
            discover: true,
        }
    }
}

/// `[compiler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerSection {
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments, placed before `-d`.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_program() -> String {
    "javac".to_string()
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

/// `[watch]` section, used with `--watch`.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Glob patterns relative to `source_root`.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Ignore events for files whose content hash did not change.
    #[serde(default)]
    pub use_hash: bool,

    #[serde(default)]
    pub hash_storage: HashStorageMode,
}

fn default_include() -> Vec<String> {
    vec!["**/*.java".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: Vec::new(),
            use_hash: false,
            hash_storage: HashStorageMode::default(),
        }
    }
}

/// `[unit.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UnitConfig {
    /// Source file relative to `source_root`. A unit without one is a
    /// library unit: it is never compiled.
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Overrides the role guessed from the source.
    #[serde(default)]
    pub role: Option<UnitRole>,

    /// Associated unit (e.g. the class a test class tests).
    #[serde(default)]
    pub association: Option<String>,

    /// Up-to-date hint. `Some(false)` forces the unit invalid at load;
    /// otherwise freshness comes from comparing class and source files.
    #[serde(default)]
    pub compiled: Option<bool>,
}
