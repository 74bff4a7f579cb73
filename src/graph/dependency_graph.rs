// src/graph/dependency_graph.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{IncbuildError, Result};
use crate::graph::dependency::{Dependency, DependencyKind, EdgeId};
use crate::graph::unit::{CompilationUnit, UnitId};
use crate::graph::UnitName;
use crate::state::UnitState;

/// Result of [`DependencyGraph::add_dependency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// A new edge was stored.
    Inserted(EdgeId),
    /// An equal edge already existed (and, for uses-edges, was re-confirmed).
    Existing(EdgeId),
}

impl EdgeInsert {
    pub fn id(self) -> EdgeId {
        match self {
            EdgeInsert::Inserted(id) | EdgeInsert::Existing(id) => id,
        }
    }
}

/// Arena of compilation units and the typed edges between them.
///
/// Units and edges live in slot vectors and are addressed by integer ids;
/// each unit keeps the ids of its incident edges for cheap traversal.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    units: Vec<Option<CompilationUnit>>,
    by_name: HashMap<UnitName, UnitId>,
    by_source: HashMap<PathBuf, UnitId>,
    edges: Vec<Option<Dependency>>,
    free_edges: Vec<usize>,
    edge_count: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- units ---------------------------------------------------------

    /// Add a unit. Names and source paths must be unique within the project.
    pub fn add_unit(&mut self, unit: CompilationUnit) -> Result<UnitId> {
        if self.by_name.contains_key(unit.name()) {
            return Err(IncbuildError::DuplicateUnit(unit.name().to_string()));
        }
        if let Some(src) = unit.source() {
            if let Some(&owner) = self.by_source.get(src) {
                let owner_name = self.name_of(owner).unwrap_or("?").to_string();
                return Err(IncbuildError::DuplicateUnit(format!(
                    "{} (source {:?} already belongs to {})",
                    unit.name(),
                    src,
                    owner_name
                )));
            }
        }

        let id = UnitId(self.units.len());
        self.by_name.insert(unit.name().to_string(), id);
        if let Some(src) = unit.source() {
            self.by_source.insert(src.to_path_buf(), id);
        }
        debug!(unit = %unit.name(), %id, state = ?unit.state(), "unit added");
        self.units.push(Some(unit));
        Ok(id)
    }

    /// Remove a unit together with every edge it is an endpoint of.
    ///
    /// Units that depended on the removed one lose a dependency target and
    /// are marked `Invalid`.
    pub fn remove_unit(&mut self, id: UnitId) -> Option<CompilationUnit> {
        let (incoming, outgoing) = {
            let unit = self.unit(id)?;
            let incoming: Vec<EdgeId> =
                unit.children.iter().chain(unit.uses_in.iter()).copied().collect();
            let outgoing: Vec<EdgeId> =
                unit.parents.iter().chain(unit.uses_out.iter()).copied().collect();
            (incoming, outgoing)
        };

        for edge in incoming {
            self.remove_dependency(edge, true);
        }
        for edge in outgoing {
            self.remove_dependency(edge, false);
        }

        let unit = self.units.get_mut(id.0)?.take()?;
        self.by_name.remove(unit.name());
        if let Some(src) = unit.source() {
            self.by_source.remove(src);
        }
        debug!(unit = %unit.name(), %id, "unit removed");
        Some(unit)
    }

    pub fn unit(&self, id: UnitId) -> Option<&CompilationUnit> {
        self.units.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut CompilationUnit> {
        self.units.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn find(&self, name: &str) -> Option<UnitId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&CompilationUnit> {
        self.find(name).and_then(|id| self.unit(id))
    }

    pub fn find_by_source(&self, path: &Path) -> Option<UnitId> {
        self.by_source.get(path).copied()
    }

    pub fn name_of(&self, id: UnitId) -> Option<&str> {
        self.unit(id).map(|u| u.name())
    }

    /// Resolve a name coming out of a parse to a project unit.
    ///
    /// Exact qualified names win; otherwise an unqualified name resolves if
    /// exactly one unit has that base name. Anything else (library classes,
    /// ambiguous names) resolves to nothing.
    pub fn resolve(&self, name: &str) -> Option<UnitId> {
        if let Some(id) = self.find(name) {
            return Some(id);
        }
        if name.contains('.') {
            return None;
        }
        let mut hits = self.units().filter(|(_, u)| u.base_name() == name);
        match (hits.next(), hits.next()) {
            (Some((id, _)), None) => Some(id),
            _ => None,
        }
    }

    /// Ids of all live units, in insertion order.
    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| UnitId(i))
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &CompilationUnit)> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|u| (UnitId(i), u)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.units().map(|(_, u)| u.name())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Upper bound (exclusive) of `UnitId::index()` values handed out so far.
    pub fn id_bound(&self) -> usize {
        self.units.len()
    }

    pub(crate) fn set_state(&mut self, id: UnitId, state: UnitState) -> Option<UnitState> {
        let unit = self.unit_mut(id)?;
        let previous = unit.state;
        unit.state = state;
        Some(previous)
    }

    pub(crate) fn set_queued(&mut self, id: UnitId, queued: bool) {
        if let Some(unit) = self.unit_mut(id) {
            unit.queued = queued;
        }
    }

    // ---- edges ---------------------------------------------------------

    /// Store an edge.
    ///
    /// An existing uses-edge with the same endpoints is re-confirmed instead
    /// of duplicated; inheritance edges are deduplicated per kind. When
    /// `recompute` is set and a new edge is stored, the source unit becomes
    /// `Invalid`.
    ///
    /// Returns `None` if either endpoint is unknown.
    pub fn add_dependency(&mut self, dep: Dependency, recompute: bool) -> Option<EdgeInsert> {
        if self.unit(dep.from()).is_none() || self.unit(dep.to()).is_none() {
            warn!(from = %dep.from(), to = %dep.to(), "dependency with unknown endpoint ignored");
            return None;
        }

        if let Some(existing) = self.find_dependency(dep.from(), dep.to(), dep.kind()) {
            if dep.kind() == DependencyKind::Uses {
                if let Some(edge) = self.edge_mut(existing) {
                    edge.confirmed = true;
                }
            }
            return Some(EdgeInsert::Existing(existing));
        }

        let (from, to, kind) = (dep.from(), dep.to(), dep.kind());
        let id = self.store_edge(dep);

        if let Some(unit) = self.unit_mut(from) {
            if kind.is_inheritance() {
                unit.parents.push(id);
            } else {
                unit.uses_out.push(id);
            }
        }
        if let Some(unit) = self.unit_mut(to) {
            if kind.is_inheritance() {
                unit.children.push(id);
            } else {
                unit.uses_in.push(id);
            }
        }

        debug!(
            from = %self.name_of(from).unwrap_or("?"),
            to = %self.name_of(to).unwrap_or("?"),
            %kind,
            "dependency added"
        );

        if recompute {
            self.set_state(from, UnitState::Invalid);
        }

        Some(EdgeInsert::Inserted(id))
    }

    /// Remove an edge from the graph and from both endpoints.
    ///
    /// With `recompute`, the source unit becomes `Invalid`.
    pub fn remove_dependency(&mut self, id: EdgeId, recompute: bool) -> Option<Dependency> {
        let dep = self.edges.get_mut(id.0)?.take()?;
        self.free_edges.push(id.0);
        self.edge_count -= 1;

        if let Some(unit) = self.unit_mut(dep.from()) {
            if dep.kind().is_inheritance() {
                unit.parents.retain(|e| *e != id);
            } else {
                unit.uses_out.retain(|e| *e != id);
            }
        }
        if let Some(unit) = self.unit_mut(dep.to()) {
            if dep.kind().is_inheritance() {
                unit.children.retain(|e| *e != id);
            } else {
                unit.uses_in.retain(|e| *e != id);
            }
        }

        debug!(
            from = %self.name_of(dep.from()).unwrap_or("?"),
            to = %self.name_of(dep.to()).unwrap_or("?"),
            kind = %dep.kind(),
            "dependency removed"
        );

        if recompute {
            self.set_state(dep.from(), UnitState::Invalid);
        }

        Some(dep)
    }

    pub fn find_dependency(&self, from: UnitId, to: UnitId, kind: DependencyKind) -> Option<EdgeId> {
        let unit = self.unit(from)?;
        let list = if kind.is_inheritance() {
            &unit.parents
        } else {
            &unit.uses_out
        };
        list.iter().copied().find(|e| {
            self.edge(*e)
                .map(|d| d.to() == to && d.kind() == kind)
                .unwrap_or(false)
        })
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Dependency> {
        self.edges.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Dependency> {
        self.edges.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub(crate) fn set_confirmed(&mut self, id: EdgeId, confirmed: bool) {
        if let Some(edge) = self.edge_mut(id) {
            edge.confirmed = confirmed;
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Dependency)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|d| (EdgeId(i), d)))
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Outgoing edges of `id`: inheritance first, then uses. Order carries
    /// no meaning.
    pub fn dependencies_of(&self, id: UnitId) -> impl Iterator<Item = (EdgeId, &Dependency)> + '_ {
        self.unit(id)
            .into_iter()
            .flat_map(|u| u.parents.iter().chain(u.uses_out.iter()))
            .filter_map(move |e| self.edge(*e).map(|d| (*e, d)))
    }

    /// Incoming edges of `id`: inheritance first, then uses.
    pub fn dependents_of(&self, id: UnitId) -> impl Iterator<Item = (EdgeId, &Dependency)> + '_ {
        self.unit(id)
            .into_iter()
            .flat_map(|u| u.children.iter().chain(u.uses_in.iter()))
            .filter_map(move |e| self.edge(*e).map(|d| (*e, d)))
    }

    /// Uses-edges out of `id` that the last re-analysis did not confirm.
    pub fn unconfirmed_uses(&self, id: UnitId) -> Vec<EdgeId> {
        self.unit(id)
            .map(|u| {
                u.uses_out
                    .iter()
                    .copied()
                    .filter(|e| self.edge(*e).map(|d| !d.is_confirmed()).unwrap_or(false))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn store_edge(&mut self, dep: Dependency) -> EdgeId {
        self.edge_count += 1;
        match self.free_edges.pop() {
            Some(slot) => {
                self.edges[slot] = Some(dep);
                EdgeId(slot)
            }
            None => {
                self.edges.push(Some(dep));
                EdgeId(self.edges.len() - 1)
            }
        }
    }
}
