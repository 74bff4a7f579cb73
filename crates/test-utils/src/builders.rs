#![allow(dead_code)]

use std::path::PathBuf;

use incbuild::config::{ProjectFile, RawProjectFile, UnitConfig};
use incbuild::graph::{CompilationUnit, Dependency, DependencyGraph, UnitId};
use incbuild::state::UnitState;
use incbuild::types::{HashStorageMode, UnitRole};

/// Builder for `DependencyGraph` to simplify scheduler and state tests.
///
/// Units get a source `<name>.java` unless added with `library`. Edges are
/// stored without invalidating anything.
pub struct GraphBuilder {
    graph: DependencyGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
        }
    }

    /// A never-compiled unit (`Invalid`).
    pub fn unit(self, name: &str) -> Self {
        self.unit_in(name, UnitState::Invalid)
    }

    /// An up-to-date unit (`Normal`).
    pub fn compiled(self, name: &str) -> Self {
        self.unit_in(name, UnitState::Normal)
    }

    pub fn unit_in(mut self, name: &str, state: UnitState) -> Self {
        let source = PathBuf::from(format!("{}.java", name.replace('.', "/")));
        self.graph
            .add_unit(CompilationUnit::with_source(name, source).initial_state(state))
            .expect("duplicate unit in GraphBuilder");
        self
    }

    pub fn library(mut self, name: &str) -> Self {
        self.graph
            .add_unit(CompilationUnit::library(name))
            .expect("duplicate unit in GraphBuilder");
        self
    }

    pub fn with_role(mut self, name: &str, role: UnitRole) -> Self {
        let id = self.id(name);
        self.graph
            .unit_mut(id)
            .expect("unit vanished")
            .set_role(role);
        self
    }

    /// `from` uses `to`.
    pub fn uses(self, from: &str, to: &str) -> Self {
        self.edge(from, to, Dependency::uses)
    }

    pub fn extends(self, from: &str, to: &str) -> Self {
        self.edge(from, to, Dependency::extends)
    }

    pub fn implements(self, from: &str, to: &str) -> Self {
        self.edge(from, to, Dependency::implements)
    }

    fn edge(mut self, from: &str, to: &str, make: fn(UnitId, UnitId) -> Dependency) -> Self {
        let (a, b) = (self.id(from), self.id(to));
        self.graph
            .add_dependency(make(a, b), false)
            .expect("GraphBuilder edge endpoints must exist");
        self
    }

    pub fn id(&self, name: &str) -> UnitId {
        self.graph
            .find(name)
            .unwrap_or_else(|| panic!("GraphBuilder: unknown unit {name}"))
    }

    pub fn build(self) -> DependencyGraph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ProjectFile` to simplify descriptor and bootstrap tests.
pub struct ProjectFileBuilder {
    raw: RawProjectFile,
}

impl ProjectFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawProjectFile::default(),
        }
    }

    pub fn source_root(mut self, dir: &str) -> Self {
        self.raw.project.source_root = PathBuf::from(dir);
        self
    }

    pub fn output_dir(mut self, dir: &str) -> Self {
        self.raw.project.output_dir = PathBuf::from(dir);
        self
    }

    pub fn classpath(mut self, entry: &str) -> Self {
        self.raw.project.classpath.push(PathBuf::from(entry));
        self
    }

    pub fn discover(mut self, on: bool) -> Self {
        self.raw.project.discover = on;
        self
    }

    pub fn compiler(mut self, program: &str, args: &[&str]) -> Self {
        self.raw.compiler.program = program.to_string();
        self.raw.compiler.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Declare a unit with a source path relative to the source root.
    pub fn unit(self, name: &str, source: &str) -> Self {
        self.unit_config(
            name,
            UnitConfig {
                source: Some(PathBuf::from(source)),
                ..UnitConfig::default()
            },
        )
    }

    pub fn library(self, name: &str) -> Self {
        self.unit_config(name, UnitConfig::default())
    }

    pub fn unit_config(mut self, name: &str, cfg: UnitConfig) -> Self {
        self.raw.unit.insert(name.to_string(), cfg);
        self
    }

    pub fn role(mut self, name: &str, role: UnitRole) -> Self {
        self.raw.unit.entry(name.to_string()).or_default().role = Some(role);
        self
    }

    pub fn association(mut self, name: &str, other: &str) -> Self {
        self.raw.unit.entry(name.to_string()).or_default().association = Some(other.to_string());
        self
    }

    pub fn compiled_hint(mut self, name: &str, compiled: bool) -> Self {
        self.raw.unit.entry(name.to_string()).or_default().compiled = Some(compiled);
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.raw.watch.include.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.raw.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn use_hash(mut self, storage: HashStorageMode) -> Self {
        self.raw.watch.use_hash = true;
        self.raw.watch.hash_storage = storage;
        self
    }

    pub fn build_raw(self) -> RawProjectFile {
        self.raw
    }

    pub fn build(self) -> ProjectFile {
        ProjectFile::try_from(self.raw).expect("Failed to build valid project from builder")
    }
}

impl Default for ProjectFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
