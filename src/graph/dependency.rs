// src/graph/dependency.rs

use std::fmt;

use crate::graph::unit::UnitId;

/// Kind of a dependency edge.
///
/// `Extends` and `Implements` are stored together as "inheritance" edges on
/// the units, but stay distinct edges in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Uses,
    Extends,
    Implements,
}

impl DependencyKind {
    pub fn is_inheritance(self) -> bool {
        matches!(self, DependencyKind::Extends | DependencyKind::Implements)
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyKind::Uses => "uses",
            DependencyKind::Extends => "extends",
            DependencyKind::Implements => "implements",
        };
        f.write_str(s)
    }
}

/// Slot of an edge inside the graph's edge arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

/// Directed edge `from -> to`: `from` needs `to` to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    from: UnitId,
    to: UnitId,
    kind: DependencyKind,
    /// Only meaningful for uses-edges during re-analysis.
    pub(crate) confirmed: bool,
}

impl Dependency {
    pub fn new(from: UnitId, to: UnitId, kind: DependencyKind) -> Self {
        Self {
            from,
            to,
            kind,
            confirmed: true,
        }
    }

    pub fn uses(from: UnitId, to: UnitId) -> Self {
        Self::new(from, to, DependencyKind::Uses)
    }

    pub fn extends(from: UnitId, to: UnitId) -> Self {
        Self::new(from, to, DependencyKind::Extends)
    }

    pub fn implements(from: UnitId, to: UnitId) -> Self {
        Self::new(from, to, DependencyKind::Implements)
    }

    pub fn from(&self) -> UnitId {
        self.from
    }

    pub fn to(&self) -> UnitId {
        self.to
    }

    pub fn kind(&self) -> DependencyKind {
        self.kind
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Same endpoints and kind; the `confirmed` flag is ignored.
    pub fn same_edge(&self, other: &Dependency) -> bool {
        self.from == other.from && self.to == other.to && self.kind == other.kind
    }
}
