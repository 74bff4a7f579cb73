// src/graph/unit.rs

use std::fmt;
use std::path::{Path, PathBuf};

use crate::graph::dependency::EdgeId;
use crate::graph::UnitName;
use crate::state::UnitState;
use crate::types::UnitRole;

/// Stable index of a unit inside its [`DependencyGraph`](super::DependencyGraph).
///
/// Ids are never reused while the graph lives, so a stale id simply resolves
/// to nothing after the unit is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One class inside the project, plus its build state.
///
/// The adjacency lists hold edge ids into the owning graph; the graph is the
/// only owner of the edges themselves.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    name: UnitName,
    /// `None` for library / class-only units. Those never get compiled and
    /// stop the scheduler's walk.
    source: Option<PathBuf>,
    role: UnitRole,
    association: Option<UnitName>,

    pub(crate) state: UnitState,
    /// Claimed by a compile job that has not completed yet.
    pub(crate) queued: bool,
    /// Re-entrancy latch for source analysis.
    pub(crate) analysing: bool,

    /// Outgoing extends/implements edges.
    pub(crate) parents: Vec<EdgeId>,
    /// Incoming extends/implements edges.
    pub(crate) children: Vec<EdgeId>,
    pub(crate) uses_out: Vec<EdgeId>,
    pub(crate) uses_in: Vec<EdgeId>,
}

impl CompilationUnit {
    /// A freshly created unit starts `Invalid`: nothing has been compiled yet.
    pub fn new(name: impl Into<UnitName>, source: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source,
            role: UnitRole::default(),
            association: None,
            state: UnitState::Invalid,
            queued: false,
            analysing: false,
            parents: Vec::new(),
            children: Vec::new(),
            uses_out: Vec::new(),
            uses_in: Vec::new(),
        }
    }

    /// A unit with a source file.
    pub fn with_source(name: impl Into<UnitName>, source: impl Into<PathBuf>) -> Self {
        Self::new(name, Some(source.into()))
    }

    /// A library unit: known to the project, but without a source to compile.
    pub fn library(name: impl Into<UnitName>) -> Self {
        let mut unit = Self::new(name, None);
        unit.state = UnitState::Normal;
        unit
    }

    pub fn initial_state(mut self, state: UnitState) -> Self {
        // Loading never yields Compiling; treat it as Invalid.
        self.state = match state {
            UnitState::Compiling => UnitState::Invalid,
            other => other,
        };
        self
    }

    pub fn role_of(mut self, role: UnitRole) -> Self {
        self.role = role;
        self
    }

    pub fn associated_with(mut self, other: impl Into<UnitName>) -> Self {
        self.association = Some(other.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unqualified class name (`"Foo"` for `"pkg.Foo"`).
    pub fn base_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn is_invalid(&self) -> bool {
        self.state == UnitState::Invalid
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    pub fn role(&self) -> UnitRole {
        self.role
    }

    pub fn set_role(&mut self, role: UnitRole) {
        self.role = role;
    }

    pub fn association(&self) -> Option<&str> {
        self.association.as_deref()
    }

    pub fn set_association(&mut self, other: Option<UnitName>) {
        self.association = other;
    }

    pub fn is_analysing(&self) -> bool {
        self.analysing
    }

    /// Take the analysis latch. Returns `false` if it was already held.
    pub fn begin_analysis(&mut self) -> bool {
        if self.analysing {
            return false;
        }
        self.analysing = true;
        true
    }

    pub fn end_analysis(&mut self) {
        self.analysing = false;
    }

    pub fn parents(&self) -> &[EdgeId] {
        &self.parents
    }

    pub fn children(&self) -> &[EdgeId] {
        &self.children
    }

    pub fn uses_out(&self) -> &[EdgeId] {
        &self.uses_out
    }

    pub fn uses_in(&self) -> &[EdgeId] {
        &self.uses_in
    }

    /// Total number of edges touching this unit.
    pub fn degree(&self) -> usize {
        self.parents.len() + self.children.len() + self.uses_out.len() + self.uses_in.len()
    }
}
