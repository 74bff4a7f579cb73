// src/engine/bootstrap.rs

//! Building a [`ProjectCore`] from a project descriptor.
//!
//! Loading does four things:
//! - creates the declared units, plus discovered `*.java` files
//! - picks each unit's initial state from class file freshness
//! - derives edges from a parse of every source, without invalidating
//! - propagates load-time staleness to compiled dependents, transitively

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::validate::is_qualified_name;
use crate::config::ProjectFile;
use crate::engine::core::{CompileSettings, ProjectCore};
use crate::engine::{ProjectContext, RuntimeOptions};
use crate::errors::Result;
use crate::fs::{walk_files, FileSystem};
use crate::graph::{CompilationUnit, DependencyGraph, UnitId, UnitName};
use crate::state::{StateMachine, UnitState};

impl ProjectCore {
    /// Load a project rooted at `root` (the descriptor's directory).
    pub fn load(
        project: &ProjectFile,
        root: &Path,
        fs: &dyn FileSystem,
        ctx: ProjectContext,
        options: RuntimeOptions,
    ) -> Result<Self> {
        let settings = CompileSettings {
            source_root: clean_join(root, &project.project.source_root),
            output_dir: clean_join(root, &project.project.output_dir),
            classpath: project
                .project
                .classpath
                .iter()
                .map(|p| clean_join(root, p))
                .collect(),
            discover: project.project.discover,
        };

        let mut graph = DependencyGraph::new();
        let mut pinned: HashSet<UnitId> = HashSet::new();

        for (name, cfg) in project.unit.iter() {
            let mut unit = match &cfg.source {
                Some(rel) => {
                    let source = clean_join(&settings.source_root, rel);
                    let state =
                        initial_state(fs, name, &source, &settings.output_dir, cfg.compiled);
                    CompilationUnit::with_source(name.clone(), source).initial_state(state)
                }
                None => CompilationUnit::library(name.clone()),
            };
            if let Some(role) = cfg.role {
                unit = unit.role_of(role);
            }
            if let Some(other) = &cfg.association {
                unit = unit.associated_with(other.clone());
            }
            let id = graph.add_unit(unit)?;
            if cfg.role.is_some() {
                pinned.insert(id);
            }
        }

        if settings.discover {
            for (name, source) in discover_sources(fs, &settings.source_root)? {
                if graph.find(&name).is_some() || graph.find_by_source(&source).is_some() {
                    continue;
                }
                let state = initial_state(fs, &name, &source, &settings.output_dir, None);
                graph.add_unit(CompilationUnit::with_source(name, source).initial_state(state))?;
            }
        }

        derive_all_edges(&mut graph, &ctx, &pinned);

        let stale = StateMachine::new(&mut graph).propagate_stale_on_load();
        let invalid = graph.units().filter(|(_, u)| u.is_invalid()).count();
        info!(
            units = graph.len(),
            edges = graph.edge_count(),
            invalid,
            stale_dependents = stale.len(),
            "project loaded"
        );

        let mut core = ProjectCore::new(graph, ctx, settings, options);
        for id in pinned {
            core.pin_role(id);
        }
        Ok(core)
    }
}

fn derive_all_edges(graph: &mut DependencyGraph, ctx: &ProjectContext, pinned: &HashSet<UnitId>) {
    let known: Vec<String> = graph.names().map(str::to_string).collect();
    let ids: Vec<UnitId> = graph.unit_ids().collect();

    for id in ids {
        let Some(source) = graph
            .unit(id)
            .and_then(|u| u.source())
            .map(Path::to_path_buf)
        else {
            continue;
        };

        match ctx.parser.parse(&source, &known) {
            Ok(parse) => {
                graph.derive_dependencies(id, &parse, false);
                if let (Some(role), false) = (parse.role, pinned.contains(&id)) {
                    if let Some(unit) = graph.unit_mut(id) {
                        unit.set_role(role);
                    }
                }
            }
            Err(err) => {
                warn!(source = %source.display(), error = %err, "could not parse source at load");
                StateMachine::new(graph).force_invalid(id);
            }
        }
    }
}

/// `Normal` only if the class file exists and is not older than the source,
/// and the descriptor does not say otherwise.
fn initial_state(
    fs: &dyn FileSystem,
    name: &str,
    source: &Path,
    output_dir: &Path,
    compiled_hint: Option<bool>,
) -> UnitState {
    if compiled_hint == Some(false) {
        return UnitState::Invalid;
    }
    let class_file = class_file_for(output_dir, name);
    match (fs.modified(source), fs.modified(&class_file)) {
        (Ok(src), Ok(class)) if class >= src => UnitState::Normal,
        (Ok(_), Ok(_)) => {
            debug!(unit = name, "class file older than source");
            UnitState::Invalid
        }
        _ => UnitState::Invalid,
    }
}

/// `<output_dir>/pkg/Foo.class` for `pkg.Foo`.
pub fn class_file_for(output_dir: &Path, name: &str) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    for part in name.split('.') {
        path.push(part);
    }
    path.set_extension("class");
    path
}

/// Unit name for a source path relative to the source root:
/// `pkg/Foo.java` becomes `pkg.Foo`.
pub fn unit_name_for(relative: &Path) -> Option<UnitName> {
    if relative.extension().and_then(|e| e.to_str()) != Some("java") {
        return None;
    }
    let stem = relative.with_extension("");
    let mut parts = Vec::new();
    for component in stem.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    let name = parts.join(".");
    is_qualified_name(&name).then_some(name)
}

/// Every `*.java` file under `source_root` that maps to a valid unit name.
fn discover_sources(fs: &dyn FileSystem, source_root: &Path) -> Result<Vec<(UnitName, PathBuf)>> {
    if !fs.is_dir(source_root) {
        warn!(root = %source_root.display(), "source root is not a directory; nothing discovered");
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for path in walk_files(fs, source_root)? {
        let Some(relative) = relative_to(source_root, &path) else {
            continue;
        };
        if let Some(name) = unit_name_for(relative) {
            found.push((name, path));
        }
    }
    debug!(count = found.len(), "sources discovered");
    Ok(found)
}

/// `path` relative to `root`; a root of `.` leaves relative paths as they are.
pub(crate) fn relative_to<'p>(root: &Path, path: &'p Path) -> Option<&'p Path> {
    if root == Path::new(".") && path.is_relative() {
        return Some(path);
    }
    path.strip_prefix(root).ok()
}

/// `base.join(rel)` without `.` components, so the same file always maps to
/// the same key.
fn clean_join(base: &Path, rel: &Path) -> PathBuf {
    let joined: PathBuf = base
        .join(rel)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if joined.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        joined
    }
}
