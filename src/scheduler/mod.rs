// src/scheduler/mod.rs

//! Partitioning of invalid units into compile jobs.
//!
//! - [`job`] defines [`CompileJob`], one strongly connected component.
//! - [`tarjan`] holds the iterative SCC walk.
//!
//! Jobs come out in emission order: a component is emitted before any
//! component that depends on it, so submitting them in order to a serial
//! compiler respects dependencies as far as the graph knows them.

pub mod job;
mod tarjan;

pub use job::CompileJob;

use tracing::debug;

use crate::graph::{DependencyGraph, UnitId};
use tarjan::TarjanWalk;

/// Stateless entry points into the SCC scheduler.
///
/// Scheduling claims every emitted unit by setting its `queued` flag. It does
/// not change unit states; moving members to `Compiling` is the caller's job
/// once it actually dispatches them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    /// Schedule every unit that is invalid, has a source and is not queued.
    pub fn schedule_all(graph: &mut DependencyGraph) -> Vec<CompileJob> {
        let roots: Vec<UnitId> = graph.unit_ids().collect();
        Self::schedule_from(graph, &roots)
    }

    /// Start the walk only from `roots` (in order). Invalid units reachable
    /// from them are scheduled too; anything else is left alone.
    pub fn schedule_from(graph: &mut DependencyGraph, roots: &[UnitId]) -> Vec<CompileJob> {
        let mut walk = TarjanWalk::new(graph);
        for &root in roots {
            walk.visit(root);
        }
        let jobs = walk.finish();
        debug!(
            jobs = jobs.len(),
            units = jobs.iter().map(CompileJob::len).sum::<usize>(),
            "scheduling pass complete"
        );
        jobs
    }

    /// Compute what [`schedule_all`](Self::schedule_all) would emit without
    /// claiming anything in `graph`.
    pub fn plan(graph: &DependencyGraph) -> Vec<CompileJob> {
        let mut scratch = graph.clone();
        Self::schedule_all(&mut scratch)
    }
}
