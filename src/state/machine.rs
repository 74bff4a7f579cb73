// src/state/machine.rs

//! State transitions for compilation units.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::graph::{DependencyGraph, UnitId};
use crate::state::UnitState;

/// Applies state transitions to the units of a graph.
///
/// Borrowed for the duration of one operation; the graph stays the single
/// owner of every unit.
pub struct StateMachine<'a> {
    graph: &'a mut DependencyGraph,
}

impl<'a> StateMachine<'a> {
    pub fn new(graph: &'a mut DependencyGraph) -> Self {
        Self { graph }
    }

    /// Mark `unit` as modified, and mark every unit that depends on it
    /// directly (one edge away) as well.
    ///
    /// Propagation stops after one hop. Returns the units whose state
    /// actually changed, `unit` first.
    pub fn invalidate(&mut self, unit: UnitId) -> Vec<UnitId> {
        let mut changed = Vec::new();
        if self.set_invalid(unit) {
            changed.push(unit);
        }

        let dependents: Vec<UnitId> = self
            .graph
            .dependents_of(unit)
            .map(|(_, dep)| dep.from())
            .collect();

        for dependent in dependents {
            if dependent != unit && self.set_invalid(dependent) && !changed.contains(&dependent) {
                changed.push(dependent);
            }
        }

        debug!(
            unit = %self.graph.name_of(unit).unwrap_or("?"),
            changed = changed.len(),
            "invalidated unit and direct dependents"
        );
        changed
    }

    /// Set a single unit `Invalid` without touching its dependents.
    ///
    /// Returns `true` if the state changed.
    pub fn force_invalid(&mut self, unit: UnitId) -> bool {
        self.set_invalid(unit)
    }

    /// Every unit with a source becomes `Invalid`, whatever its state.
    ///
    /// Returns how many units were touched.
    pub fn force_all_invalid(&mut self) -> usize {
        let ids: Vec<UnitId> = self
            .graph
            .units()
            .filter(|(_, u)| u.has_source())
            .map(|(id, _)| id)
            .collect();
        for id in &ids {
            self.graph.set_state(*id, UnitState::Invalid);
        }
        debug!(count = ids.len(), "forced all units invalid");
        ids.len()
    }

    /// Members of a dispatched job move from `Invalid` to `Compiling`.
    ///
    /// `queued` is expected to be set already (the scheduler claims units
    /// when it visits them) and is set again here in case the caller built
    /// the job by hand. A `Normal` member is left alone.
    pub fn mark_compiling(&mut self, members: &[UnitId]) {
        for &id in members {
            let Some(unit) = self.graph.unit(id) else {
                continue;
            };
            let state = unit.state();
            if state == UnitState::Compiling {
                continue;
            }
            if !state.can_transition_to(UnitState::Compiling) {
                warn!(unit = %unit.name(), %state, "not dispatching a unit that is not invalid");
                continue;
            }
            self.graph.set_state(id, UnitState::Compiling);
            self.graph.set_queued(id, true);
        }
    }

    /// Apply the outcome of a completed job to all of its members.
    ///
    /// Success makes members that are still `Compiling` `Normal`. A member
    /// invalidated while its job ran was compiled from older text and stays
    /// `Invalid`. Failure rolls every member back to `Invalid`. Either way the
    /// members are released (`queued = false`).
    ///
    /// Returns the members that ended up `Normal`.
    pub fn complete_job(&mut self, members: &[UnitId], success: bool) -> Vec<UnitId> {
        let mut compiled = Vec::new();
        for &id in members {
            let Some(previous) = self.graph.unit(id).map(|u| u.state()) else {
                continue;
            };
            let next = if success && previous.can_transition_to(UnitState::Normal) {
                UnitState::Normal
            } else {
                UnitState::Invalid
            };
            if success && next == UnitState::Invalid {
                debug!(
                    unit = %self.graph.name_of(id).unwrap_or("?"),
                    %previous,
                    "unit changed while compiling; stays invalid"
                );
            }
            self.graph.set_state(id, next);
            self.graph.set_queued(id, false);
            if next == UnitState::Normal {
                compiled.push(id);
            }
        }
        compiled
    }

    /// Drop the `queued` claim on units whose job never got dispatched.
    pub fn release(&mut self, members: &[UnitId]) {
        for &id in members {
            self.graph.set_queued(id, false);
        }
    }

    /// Load-time staleness: starting from every unit that is `Invalid`,
    /// invalidate `Normal` dependents transitively.
    ///
    /// Only used while loading a project, where compiled output on disk may
    /// be older than a changed dependency. Returns the newly invalidated
    /// units.
    pub fn propagate_stale_on_load(&mut self) -> Vec<UnitId> {
        let mut work: VecDeque<UnitId> = self
            .graph
            .units()
            .filter(|(_, u)| u.has_source() && u.is_invalid())
            .map(|(id, _)| id)
            .collect();
        let mut seen: HashSet<UnitId> = work.iter().copied().collect();
        let mut newly = Vec::new();

        while let Some(id) = work.pop_front() {
            let dependents: Vec<UnitId> = self
                .graph
                .dependents_of(id)
                .map(|(_, dep)| dep.from())
                .collect();
            for dependent in dependents {
                if !seen.insert(dependent) {
                    continue;
                }
                let is_normal = self
                    .graph
                    .unit(dependent)
                    .map(|u| u.has_source() && u.state() == UnitState::Normal)
                    .unwrap_or(false);
                if is_normal {
                    self.graph.set_state(dependent, UnitState::Invalid);
                    newly.push(dependent);
                    work.push_back(dependent);
                }
            }
        }

        if !newly.is_empty() {
            debug!(count = newly.len(), "stale dependencies invalidated dependents at load");
        }
        newly
    }

    fn set_invalid(&mut self, id: UnitId) -> bool {
        match self.graph.unit(id) {
            Some(u) if u.has_source() => {}
            _ => return false,
        }
        let previous = self.graph.set_state(id, UnitState::Invalid);
        previous.is_some_and(|p| p != UnitState::Invalid)
    }
}
