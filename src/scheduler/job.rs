// src/scheduler/job.rs

use std::path::{Path, PathBuf};

use crate::graph::{DependencyGraph, UnitId, UnitName};

/// One strongly connected component of invalid units, compiled in a single
/// compiler invocation.
///
/// Members are listed in the order the scheduler discovered them; a job is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJob {
    members: Vec<UnitId>,
    names: Vec<UnitName>,
    sources: Vec<PathBuf>,
}

impl CompileJob {
    /// Build a job from member ids, pulling names and sources from `graph`.
    ///
    /// Members without a source are skipped; the scheduler never puts one in
    /// a job.
    pub(crate) fn from_members(graph: &DependencyGraph, members: Vec<UnitId>) -> Self {
        let mut kept = Vec::with_capacity(members.len());
        let mut names = Vec::with_capacity(members.len());
        let mut sources = Vec::with_capacity(members.len());
        for id in members {
            let Some(unit) = graph.unit(id) else { continue };
            let Some(src) = unit.source() else { continue };
            kept.push(id);
            names.push(unit.name().to_string());
            sources.push(src.to_path_buf());
        }
        Self {
            members: kept,
            names,
            sources,
        }
    }

    pub fn members(&self) -> &[UnitId] {
        &self.members
    }

    pub fn names(&self) -> &[UnitName] {
        &self.names
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.members.contains(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn contains_source(&self, path: &Path) -> bool {
        self.sources.iter().any(|p| p == path)
    }
}
