// tests/property/scheduler.rs

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use proptest::prelude::*;

use incbuild::graph::{CompilationUnit, Dependency, DependencyGraph, UnitId};
use incbuild::scheduler::Scheduler;
use incbuild::state::UnitState;

#[derive(Debug, Clone, Copy)]
enum Kind {
    Compiled,
    Stale,
    Library,
}

fn kind_strategy() -> impl Strategy<Value = Kind> {
    prop_oneof![
        3 => Just(Kind::Stale),
        2 => Just(Kind::Compiled),
        1 => Just(Kind::Library),
    ]
}

// Units plus (from, to, kind) triples; endpoints are taken modulo the unit
// count and self-edges dropped.
fn project_strategy(max_units: usize) -> impl Strategy<Value = (Vec<Kind>, Vec<(usize, usize, u8)>)> {
    (1..=max_units).prop_flat_map(|n| {
        (
            proptest::collection::vec(kind_strategy(), n),
            proptest::collection::vec((0..n, 0..n, 0u8..3), 0..n * 3),
        )
    })
}

fn build_graph(kinds: &[Kind], edges: &[(usize, usize, u8)]) -> (DependencyGraph, Vec<UnitId>) {
    let mut graph = DependencyGraph::new();
    let mut ids = Vec::new();
    for (i, kind) in kinds.iter().enumerate() {
        let name = format!("U{i}");
        let unit = match kind {
            Kind::Library => CompilationUnit::library(name),
            Kind::Compiled => CompilationUnit::with_source(name.clone(), PathBuf::from(format!("{name}.java")))
                .initial_state(UnitState::Normal),
            Kind::Stale => CompilationUnit::with_source(name.clone(), PathBuf::from(format!("{name}.java")))
                .initial_state(UnitState::Invalid),
        };
        ids.push(graph.add_unit(unit).unwrap());
    }
    for &(from, to, kind) in edges {
        if from == to {
            continue;
        }
        let dep = match kind {
            0 => Dependency::uses(ids[from], ids[to]),
            1 => Dependency::extends(ids[from], ids[to]),
            _ => Dependency::implements(ids[from], ids[to]),
        };
        graph.add_dependency(dep, false);
    }
    (graph, ids)
}

fn candidates(graph: &DependencyGraph) -> BTreeSet<UnitId> {
    graph
        .units()
        .filter(|(_, u)| u.has_source() && u.state() == UnitState::Invalid && !u.is_queued())
        .map(|(id, _)| id)
        .collect()
}

/// Components of the subgraph induced by the candidate units.
fn oracle_components(graph: &DependencyGraph, cands: &BTreeSet<UnitId>) -> BTreeSet<BTreeSet<UnitId>> {
    let mut pg: DiGraph<UnitId, ()> = DiGraph::new();
    let mut nodes: HashMap<UnitId, NodeIndex> = HashMap::new();
    for &id in cands {
        nodes.insert(id, pg.add_node(id));
    }
    for (_, dep) in graph.edges() {
        if let (Some(&a), Some(&b)) = (nodes.get(&dep.from()), nodes.get(&dep.to())) {
            pg.add_edge(a, b, ());
        }
    }
    tarjan_scc(&pg)
        .into_iter()
        .map(|scc| scc.into_iter().map(|n| pg[n]).collect())
        .collect()
}

proptest! {
    #[test]
    fn jobs_match_strongly_connected_components((kinds, edges) in project_strategy(12)) {
        let (mut graph, _) = build_graph(&kinds, &edges);
        let cands = candidates(&graph);
        let expected = oracle_components(&graph, &cands);

        let jobs = Scheduler::schedule_all(&mut graph);

        let got: BTreeSet<BTreeSet<UnitId>> = jobs
            .iter()
            .map(|j| j.members().iter().copied().collect())
            .collect();
        prop_assert_eq!(&got, &expected);

        // Every candidate appears in exactly one job.
        let total: usize = jobs.iter().map(|j| j.len()).sum();
        prop_assert_eq!(total, cands.len());

        // Claimed units are marked queued; states are untouched.
        for &id in &cands {
            let unit = graph.unit(id).unwrap();
            prop_assert!(unit.is_queued());
            prop_assert_eq!(unit.state(), UnitState::Invalid);
        }
    }

    #[test]
    fn dependencies_are_emitted_first((kinds, edges) in project_strategy(12)) {
        let (mut graph, _) = build_graph(&kinds, &edges);
        let jobs = Scheduler::schedule_all(&mut graph);

        let mut job_of: HashMap<UnitId, usize> = HashMap::new();
        for (index, job) in jobs.iter().enumerate() {
            for &member in job.members() {
                job_of.insert(member, index);
            }
        }

        for (_, dep) in graph.edges() {
            if let (Some(&dependent), Some(&dependency)) =
                (job_of.get(&dep.from()), job_of.get(&dep.to()))
            {
                prop_assert!(
                    dependency <= dependent,
                    "{:?} scheduled after its dependent",
                    dep
                );
            }
        }
    }

    #[test]
    fn plan_matches_schedule_and_claims_nothing((kinds, edges) in project_strategy(10)) {
        let (mut graph, _) = build_graph(&kinds, &edges);

        let planned: Vec<Vec<String>> = Scheduler::plan(&graph)
            .iter()
            .map(|j| j.names().to_vec())
            .collect();
        prop_assert!(graph.units().all(|(_, u)| !u.is_queued()));

        let scheduled: Vec<Vec<String>> = Scheduler::schedule_all(&mut graph)
            .iter()
            .map(|j| j.names().to_vec())
            .collect();
        prop_assert_eq!(planned, scheduled);

        // A second pass finds nothing left to claim.
        prop_assert!(Scheduler::schedule_all(&mut graph).is_empty());
    }
}
