// src/graph/mod.rs

//! Dependency graph between compilation units.
//!
//! - [`unit`] holds the per-class node type and its adjacency lists.
//! - [`dependency`] defines typed edges (uses / extends / implements).
//! - [`dependency_graph`] is the arena that owns every unit and edge.
//! - [`resync`] re-derives a unit's outgoing edges from a fresh parse.

pub mod dependency;
pub mod dependency_graph;
pub mod resync;
pub mod unit;

/// Canonical unit name type (qualified class name, e.g. `"pkg.Foo"`).
pub type UnitName = String;

pub use dependency::{Dependency, DependencyKind, EdgeId};
pub use dependency_graph::{DependencyGraph, EdgeInsert};
pub use resync::ResyncOutcome;
pub use unit::{CompilationUnit, UnitId};
