// src/graph/resync.rs

//! Re-derivation of a unit's outgoing edges after a successful parse.

use tracing::{debug, info};

use crate::graph::dependency::{Dependency, DependencyKind, EdgeId};
use crate::graph::dependency_graph::{DependencyGraph, EdgeInsert};
use crate::graph::unit::UnitId;
use crate::parse::ParseResult;

/// What a resynchronization changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResyncOutcome {
    /// Edges that did not exist before this pass.
    pub added: Vec<EdgeId>,
    /// Uses-edges the parse no longer mentions. They are kept, not removed.
    pub unconfirmed: Vec<EdgeId>,
}

impl ResyncOutcome {
    pub fn is_consistent(&self) -> bool {
        self.unconfirmed.is_empty()
    }
}

impl DependencyGraph {
    /// Bring `unit`'s outgoing edges in line with a fresh parse.
    ///
    /// Inheritance edges are rebuilt from scratch. Uses-edges are re-confirmed
    /// or added (marking the unit `Invalid` when one is added); a uses-edge
    /// the parse no longer mentions stays in the graph, unconfirmed, and is
    /// reported in the outcome.
    pub fn resynchronize(&mut self, unit: UnitId, parse: &ParseResult) -> ResyncOutcome {
        self.derive_dependencies(unit, parse, true)
    }

    /// Shared body of [`resynchronize`](Self::resynchronize).
    ///
    /// Project loading passes `recompute = false` so that deriving edges does
    /// not invalidate units whose compiled output is known to be current.
    pub(crate) fn derive_dependencies(
        &mut self,
        unit: UnitId,
        parse: &ParseResult,
        recompute: bool,
    ) -> ResyncOutcome {
        let mut outcome = ResyncOutcome::default();

        let (parents, uses_out, own_name, association) = match self.unit(unit) {
            Some(u) => (
                u.parents.clone(),
                u.uses_out.clone(),
                u.name().to_string(),
                u.association().map(str::to_string),
            ),
            None => return outcome,
        };

        let mut previous = Vec::with_capacity(parents.len());
        for edge in parents {
            if let Some(dep) = self.remove_dependency(edge, false) {
                previous.push((dep.to(), dep.kind()));
            }
        }
        for edge in &uses_out {
            self.set_confirmed(*edge, false);
        }

        let supertypes = parse
            .superclass
            .iter()
            .map(|name| (name, DependencyKind::Extends))
            .chain(parse.implements.iter().map(|name| (name, DependencyKind::Implements)));

        let mut inheritance = Vec::new();
        for (name, kind) in supertypes {
            match self.resolve(name) {
                Some(target) if target != unit => inheritance.push(Dependency::new(unit, target, kind)),
                _ => debug!(unit = %own_name, name = %name, %kind, "supertype outside project; ignored"),
            }
        }
        for dep in inheritance {
            let seen_before = previous.contains(&(dep.to(), dep.kind()));
            if let Some(EdgeInsert::Inserted(id)) = self.add_dependency(dep, false) {
                if !seen_before {
                    outcome.added.push(id);
                }
            }
        }

        for name in &parse.used {
            let Some(target) = self.resolve(name) else {
                continue;
            };
            if target == unit {
                continue;
            }
            let associated = {
                let target_unit = self.unit(target);
                let target_name = target_unit.map(|u| u.name()).unwrap_or_default();
                association.as_deref() == Some(target_name)
                    || target_unit.and_then(|u| u.association()) == Some(own_name.as_str())
            };
            if associated {
                continue;
            }
            if let Some(EdgeInsert::Inserted(id)) =
                self.add_dependency(Dependency::uses(unit, target), recompute)
            {
                outcome.added.push(id);
            }
        }

        outcome.unconfirmed = self.unconfirmed_uses(unit);
        if !outcome.unconfirmed.is_empty() {
            info!(
                unit = %own_name,
                stale = outcome.unconfirmed.len(),
                "uses dependencies no longer found in source; keeping them"
            );
        }
        outcome
    }
}
