// src/scheduler/tarjan.rs

//! Tarjan's strongly connected components over the invalid part of the graph.
//!
//! The walk uses an explicit frame stack instead of recursion, and per-unit
//! bookkeeping lives in vectors indexed by `UnitId::index()`.

use tracing::{debug, trace};

use crate::graph::{DependencyGraph, UnitId};
use crate::scheduler::job::CompileJob;

const UNVISITED: u32 = 0;

/// One suspended "recursive call": the unit being explored, its dependency
/// targets, and how many of them have been looked at.
struct Frame {
    unit: UnitId,
    targets: Vec<UnitId>,
    next: usize,
}

pub(crate) struct TarjanWalk<'g> {
    graph: &'g mut DependencyGraph,
    dfn: Vec<u32>,
    link: Vec<u32>,
    on_stack: Vec<bool>,
    stack: Vec<UnitId>,
    counter: u32,
    jobs: Vec<CompileJob>,
}

impl<'g> TarjanWalk<'g> {
    pub(crate) fn new(graph: &'g mut DependencyGraph) -> Self {
        let bound = graph.id_bound();
        Self {
            graph,
            dfn: vec![UNVISITED; bound],
            link: vec![UNVISITED; bound],
            on_stack: vec![false; bound],
            stack: Vec::new(),
            counter: 0,
            jobs: Vec::new(),
        }
    }

    /// A unit the walk may enter: it has a source, is invalid, is not claimed
    /// by a pending job and was not visited in this walk.
    pub(crate) fn is_candidate(&self, id: UnitId) -> bool {
        if self.dfn.get(id.index()).copied() != Some(UNVISITED) {
            return false;
        }
        self.graph
            .unit(id)
            .is_some_and(|u| u.has_source() && u.is_invalid() && !u.is_queued())
    }

    /// Explore from `root` (if it is a candidate), emitting every component
    /// completed on the way.
    pub(crate) fn visit(&mut self, root: UnitId) {
        if !self.is_candidate(root) {
            return;
        }

        let mut frames = vec![self.enter(root)];

        while let Some(top) = frames.last_mut() {
            if let Some(&target) = top.targets.get(top.next) {
                top.next += 1;
                let unit = top.unit;

                if self.on_stack[target.index()] {
                    // Back edge into the current exploration: a cycle.
                    let i = unit.index();
                    self.link[i] = self.link[i].min(self.dfn[target.index()]);
                } else if self.is_candidate(target) {
                    let frame = self.enter(target);
                    frames.push(frame);
                } else {
                    trace!(%unit, %target, "dependency not recursed into");
                }
                continue;
            }

            let Some(done) = frames.pop() else { break };
            let i = done.unit.index();
            if self.link[i] == self.dfn[i] {
                self.emit(done.unit);
            }
            if let Some(parent) = frames.last() {
                let p = parent.unit.index();
                self.link[p] = self.link[p].min(self.link[i]);
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<CompileJob> {
        self.jobs
    }

    fn enter(&mut self, id: UnitId) -> Frame {
        self.counter += 1;
        let i = id.index();
        self.dfn[i] = self.counter;
        self.link[i] = self.counter;
        self.on_stack[i] = true;
        self.stack.push(id);
        // Claimed now, so another path cannot schedule it a second time.
        self.graph.set_queued(id, true);

        let targets = self
            .graph
            .dependencies_of(id)
            .map(|(_, dep)| dep.to())
            .filter(|to| to.index() < self.dfn.len())
            .collect();

        Frame {
            unit: id,
            targets,
            next: 0,
        }
    }

    fn emit(&mut self, root: UnitId) {
        let mut members = Vec::new();
        while let Some(id) = self.stack.pop() {
            self.on_stack[id.index()] = false;
            members.push(id);
            if id == root {
                break;
            }
        }
        members.reverse();

        let job = CompileJob::from_members(&*self.graph, members);
        debug!(
            members = ?job.names(),
            "strongly connected component closed"
        );
        self.jobs.push(job);
    }
}
