mod common;

use std::path::{Path, PathBuf};

use common::{core_with, plain_core, request_names};
use incbuild::engine::core::DEBUGGER_BUSY_MESSAGE;
use incbuild::engine::{
    Analysis, CoreCommand, Diagnostic, ProjectEvent, RuntimeOptions,
};
use incbuild::graph::{CompilationUnit, DependencyGraph};
use incbuild::parse::ParseResult;
use incbuild::state::UnitState;
use incbuild::types::UnitRole;
use incbuild_test_utils::{
    init_tracing, GraphBuilder, RecordingDocs, RecordingEditor, ScriptedDebugger, StaticParser,
};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn chain() -> DependencyGraph {
    // A needs B
    GraphBuilder::new().unit("A").unit("B").uses("A", "B").build()
}

#[test]
fn compile_all_dispatches_jobs_in_dependency_order() {
    init_tracing();
    let editor = RecordingEditor::new();
    let debugger = ScriptedDebugger::new(true);
    let mut core = core_with(
        chain(),
        &StaticParser::new(),
        &editor,
        &debugger,
        RuntimeOptions::default(),
    );

    let requests = core.compile_all();

    assert_eq!(request_names(&requests), vec![names(&["B"]), names(&["A"])]);
    assert_eq!(requests[0].sources, vec![PathBuf::from("B.java")]);
    assert_eq!(requests[0].output_dir, PathBuf::from("classes"));
    assert_ne!(requests[0].job_id, requests[1].job_id);
    assert_eq!(core.query_state("A").unwrap(), UnitState::Compiling);
    assert_eq!(core.query_state("B").unwrap(), UnitState::Compiling);
    assert_eq!(core.in_flight_jobs(), 2);

    assert_eq!(editor.log().lock().unwrap().saved, names(&["B", "A"]));
    assert_eq!(*debugger.cleared().lock().unwrap(), names(&["B", "A"]));
}

#[test]
fn busy_debugger_rejects_compile_requests() {
    let editor = RecordingEditor::new();
    let debugger = ScriptedDebugger::new(false);
    let mut core = core_with(
        chain(),
        &StaticParser::new(),
        &editor,
        &debugger,
        RuntimeOptions::default(),
    );

    assert!(core.compile_all().is_empty());
    assert!(core.compile_one("A").unwrap().is_empty());
    assert!(core.rebuild().is_empty());

    let a = core.graph().get("A").unwrap();
    assert_eq!(a.state(), UnitState::Invalid);
    assert!(!a.is_queued());
    let log = editor.log();
    let log = log.lock().unwrap();
    assert_eq!(log.messages.len(), 3);
    assert!(log.messages.iter().all(|m| m == DEBUGGER_BUSY_MESSAGE));

    // Once the program stops, compiling works again.
    drop(log);
    debugger
        .idle_switch()
        .store(true, std::sync::atomic::Ordering::SeqCst);
    assert_eq!(core.compile_all().len(), 2);
}

#[test]
fn only_the_first_error_of_a_job_reaches_the_editor() {
    let editor = RecordingEditor::new();
    let mut core = core_with(
        GraphBuilder::new().unit("A").build(),
        &StaticParser::new(),
        &editor,
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );
    let job = core.compile_all()[0].job_id;

    let first = Diagnostic::error(Some("A.java".into()), Some(3), "cannot find symbol");
    core.job_diagnostic(job, Diagnostic::warning(Some("A.java".into()), Some(1), "unchecked"));
    core.job_diagnostic(job, first.clone());
    core.job_diagnostic(job, Diagnostic::error(Some("A.java".into()), Some(9), "';' expected"));

    assert_eq!(editor.log().lock().unwrap().errors, vec![first]);
}

#[test]
fn finished_jobs_update_state_editor_and_docs() {
    let editor = RecordingEditor::new();
    let docs = RecordingDocs::new();
    let mut core = core_with(
        chain(),
        &StaticParser::new(),
        &editor,
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );
    core.context_mut().docs = Box::new(docs.clone());

    let requests = core.compile_all();
    core.job_finished(requests[0].job_id, true);
    core.job_finished(requests[1].job_id, false);

    assert_eq!(core.query_state("B").unwrap(), UnitState::Normal);
    assert_eq!(core.query_state("A").unwrap(), UnitState::Invalid);
    assert!(!core.graph().get("A").unwrap().is_queued());
    assert!(core.is_idle());
    assert_eq!(
        editor.log().lock().unwrap().compiled,
        vec![("B".to_string(), true)]
    );
    assert_eq!(*docs.extracted().lock().unwrap(), names(&["B"]));
}

#[test]
fn member_edited_while_compiling_stays_invalid_after_success() {
    let editor = RecordingEditor::new();
    let docs = RecordingDocs::new();
    let mut core = core_with(
        GraphBuilder::new().unit("A").unit("B").build(),
        &StaticParser::new(),
        &editor,
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );
    core.context_mut().docs = Box::new(docs.clone());
    let requests = core.compile_all();
    assert_eq!(core.query_state("A").unwrap(), UnitState::Compiling);

    core.source_modified(Path::new("A.java"));
    assert_eq!(core.query_state("A").unwrap(), UnitState::Invalid);

    for request in &requests {
        core.job_finished(request.job_id, true);
    }

    // A's job compiled the text from before the edit.
    let a = core.graph().get("A").unwrap();
    assert_eq!(a.state(), UnitState::Invalid);
    assert!(!a.is_queued());
    assert_eq!(core.query_state("B").unwrap(), UnitState::Normal);
    assert_eq!(
        editor.log().lock().unwrap().compiled,
        vec![("B".to_string(), true)]
    );
    assert_eq!(*docs.extracted().lock().unwrap(), names(&["B"]));

    // The edited unit is picked up by the next build.
    assert_eq!(request_names(&core.compile_all()), vec![names(&["A"])]);
}

#[test]
fn failed_job_sends_no_compiled_flag() {
    let editor = RecordingEditor::new();
    let mut core = core_with(
        GraphBuilder::new().unit("A").build(),
        &StaticParser::new(),
        &editor,
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );

    let job = core.compile_all()[0].job_id;
    core.job_finished(job, false);

    assert_eq!(core.query_state("A").unwrap(), UnitState::Invalid);
    assert!(editor.log().lock().unwrap().compiled.is_empty());
}

#[test]
fn unknown_job_feedback_is_ignored() {
    let mut core = plain_core(GraphBuilder::new().unit("A").build());
    core.compile_all();

    core.job_diagnostic(99, Diagnostic::error(None, None, "stray"));
    core.job_finished(99, true);

    assert_eq!(core.in_flight_jobs(), 1);
    assert_eq!(core.query_state("A").unwrap(), UnitState::Compiling);
}

#[test]
fn compile_one_forces_the_unit_and_pulls_in_invalid_dependencies() {
    let graph = GraphBuilder::new()
        .compiled("A")
        .unit("B")
        .unit("Elsewhere")
        .uses("A", "B")
        .build();
    let mut core = plain_core(graph);

    let requests = core.compile_one("A").unwrap();

    assert_eq!(request_names(&requests), vec![names(&["B"]), names(&["A"])]);
    assert_eq!(core.query_state("Elsewhere").unwrap(), UnitState::Invalid);
    assert!(!core.graph().get("Elsewhere").unwrap().is_queued());
}

#[test]
fn compile_one_also_compiles_the_association_quietly() {
    let mut graph = DependencyGraph::new();
    graph
        .add_unit(
            CompilationUnit::with_source("Shape", "Shape.java")
                .initial_state(UnitState::Normal)
                .associated_with("ShapeTest"),
        )
        .unwrap();
    graph
        .add_unit(
            CompilationUnit::with_source("ShapeTest", "ShapeTest.java")
                .initial_state(UnitState::Normal),
        )
        .unwrap();
    let editor = RecordingEditor::new();
    let mut core = core_with(
        graph,
        &StaticParser::new(),
        &editor,
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );

    let requests = core.compile_one("Shape").unwrap();
    assert_eq!(
        request_names(&requests),
        vec![names(&["Shape"]), names(&["ShapeTest"])]
    );

    core.job_diagnostic(requests[1].job_id, Diagnostic::error(None, None, "test broken"));
    assert!(editor.log().lock().unwrap().errors.is_empty());

    core.job_diagnostic(requests[0].job_id, Diagnostic::error(None, None, "shape broken"));
    assert_eq!(editor.log().lock().unwrap().errors.len(), 1);
}

#[test]
fn compile_one_skips_units_already_queued() {
    let mut core = plain_core(GraphBuilder::new().unit("A").build());
    assert_eq!(core.compile_all().len(), 1);

    assert!(core.compile_one("A").unwrap().is_empty());
    assert_eq!(core.in_flight_jobs(), 1);
}

#[test]
fn compile_one_for_an_unknown_unit_tells_the_user() {
    let editor = RecordingEditor::new();
    let mut core = core_with(
        chain(),
        &StaticParser::new(),
        &editor,
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );

    assert!(core.compile_one("Nope").is_err());

    let step = core.step(ProjectEvent::CompileOne {
        unit: "Nope".to_string(),
    });
    assert_eq!(step.dispatched().count(), 0);
    assert!(step.keep_running);
    let log = editor.log();
    let log = log.lock().unwrap();
    assert_eq!(log.messages.len(), 1);
    assert!(log.messages[0].contains("Nope"));
}

#[test]
fn failed_save_aborts_the_batch_and_releases_units() {
    let editor = RecordingEditor::new().fail_save("B");
    let mut core = core_with(
        chain(),
        &StaticParser::new(),
        &editor,
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );

    assert!(core.compile_all().is_empty());

    for name in ["A", "B"] {
        let unit = core.graph().get(name).unwrap();
        assert_eq!(unit.state(), UnitState::Invalid);
        assert!(!unit.is_queued());
    }
    assert!(core.is_idle());
    assert!(editor.log().lock().unwrap().messages[0].contains("Could not save B"));
}

#[test]
fn rebuild_reanalyses_and_recompiles_everything() {
    let parser = StaticParser::new().with("A.java", ParseResult::new().using("B"));
    let mut core = core_with(
        GraphBuilder::new().compiled("A").compiled("B").build(),
        &parser,
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );

    let requests = core.rebuild();

    assert_eq!(parser.calls().len(), 2);
    assert_eq!(request_names(&requests), vec![names(&["B"]), names(&["A"])]);
}

#[test]
fn analysis_in_progress_is_not_reentered() {
    let parser = StaticParser::new();
    let mut core = core_with(
        GraphBuilder::new().compiled("A").build(),
        &parser,
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );
    let a = core.graph().find("A").unwrap();
    assert!(core.graph_mut().unit_mut(a).unwrap().begin_analysis());

    assert_eq!(core.analyse_source(a), Analysis::Skipped);
    assert!(parser.calls().is_empty());

    core.graph_mut().unit_mut(a).unwrap().end_analysis();
    assert!(matches!(core.analyse_source(a), Analysis::Analysed { .. }));
}

#[test]
fn unparsable_source_keeps_edges_and_invalidates_the_unit() {
    let parser = StaticParser::new();
    parser.fail("A.java");
    let mut core = core_with(
        GraphBuilder::new()
            .compiled("A")
            .compiled("B")
            .uses("A", "B")
            .build(),
        &parser,
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );
    let a = core.graph().find("A").unwrap();

    assert_eq!(core.analyse_source(a), Analysis::ParseFailed);
    assert_eq!(core.graph().edge_count(), 1);
    assert_eq!(core.query_state("A").unwrap(), UnitState::Invalid);
}

#[test]
fn stale_uses_edges_are_reported_as_status() {
    let editor = RecordingEditor::new();
    let mut core = core_with(
        GraphBuilder::new()
            .compiled("A")
            .compiled("Helper")
            .uses("A", "Helper")
            .build(),
        &StaticParser::new(),
        &editor,
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );
    let a = core.graph().find("A").unwrap();

    let Analysis::Analysed { added, unconfirmed } = core.analyse_source(a) else {
        panic!("expected a successful analysis");
    };

    assert!(added.is_empty());
    assert_eq!(unconfirmed.len(), 1);
    assert_eq!(core.graph().edge_count(), 1);
    assert_eq!(
        editor.log().lock().unwrap().statuses,
        vec!["A: dependency on Helper is no longer used in the source".to_string()]
    );
}

#[test]
fn parsed_roles_apply_unless_pinned() {
    let parser = StaticParser::new()
        .with("Shape.java", ParseResult::new().with_role(UnitRole::Interface))
        .with("ShapeTest.java", ParseResult::new().with_role(UnitRole::Standard));
    let graph = GraphBuilder::new()
        .compiled("Shape")
        .compiled("ShapeTest")
        .with_role("ShapeTest", UnitRole::UnitTest)
        .build();
    let mut core = core_with(
        graph,
        &parser,
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );
    let shape = core.graph().find("Shape").unwrap();
    let test = core.graph().find("ShapeTest").unwrap();
    core.pin_role(test);

    core.analyse_source(shape);
    core.analyse_source(test);

    assert_eq!(core.units_with_role(UnitRole::Interface), vec!["Shape"]);
    assert_eq!(core.units_with_role(UnitRole::UnitTest), vec!["ShapeTest"]);
}

#[test]
fn changed_source_invalidates_one_hop_and_reanalyses() {
    let parser = StaticParser::new();
    let graph = GraphBuilder::new()
        .compiled("Top")
        .compiled("Mid")
        .compiled("Leaf")
        .uses("Top", "Mid")
        .uses("Mid", "Leaf")
        .build();
    let mut core = core_with(
        graph,
        &parser,
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    );

    let step = core.step(ProjectEvent::SourceChanged {
        path: PathBuf::from("Leaf.java"),
    });

    assert_eq!(step.dispatched().count(), 0);
    assert_eq!(parser.calls(), vec![PathBuf::from("Leaf.java")]);
    assert_eq!(core.query_state("Leaf").unwrap(), UnitState::Invalid);
    assert_eq!(core.query_state("Mid").unwrap(), UnitState::Invalid);
    assert_eq!(core.query_state("Top").unwrap(), UnitState::Normal);
}

#[test]
fn changed_source_compiles_when_asked_to() {
    let options = RuntimeOptions {
        exit_when_idle: false,
        compile_on_change: true,
    };
    let mut core = core_with(
        GraphBuilder::new().compiled("A").compiled("B").uses("B", "A").build(),
        &StaticParser::new(),
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        options,
    );

    let requests = core.source_modified(Path::new("A.java"));

    assert_eq!(request_names(&requests), vec![names(&["A"]), names(&["B"])]);
}

#[test]
fn new_source_files_become_units() {
    let mut core = plain_core(GraphBuilder::new().compiled("A").build());

    core.source_modified(Path::new("pkg/Fresh.java"));
    core.source_modified(Path::new("not-a-class.java"));

    let fresh = core.graph().get("pkg.Fresh").unwrap();
    assert_eq!(fresh.state(), UnitState::Invalid);
    assert_eq!(fresh.source(), Some(Path::new("pkg/Fresh.java")));
    assert_eq!(core.graph().len(), 2);
}

#[test]
fn removed_source_drops_the_unit_and_invalidates_dependents() {
    let mut core = plain_core(
        GraphBuilder::new()
            .compiled("A")
            .compiled("B")
            .uses("A", "B")
            .build(),
    );

    core.step(ProjectEvent::SourceRemoved {
        path: PathBuf::from("B.java"),
    });

    assert!(core.graph().find("B").is_none());
    assert_eq!(core.query_state("A").unwrap(), UnitState::Invalid);
    assert!(!core.source_removed(Path::new("B.java")));
}

#[test]
fn add_and_remove_units_by_name() {
    let mut core = plain_core(GraphBuilder::new().compiled("A").build());

    core.add_unit(CompilationUnit::with_source("B", "B.java")).unwrap();
    assert!(core.add_unit(CompilationUnit::with_source("B", "B2.java")).is_err());

    let removed = core.remove_unit("B").unwrap();
    assert_eq!(removed.name(), "B");
    assert!(core.remove_unit("B").is_err());
}

#[test]
fn invalidate_event_is_single_hop() {
    let mut core = plain_core(
        GraphBuilder::new()
            .compiled("Top")
            .compiled("Mid")
            .compiled("Leaf")
            .uses("Top", "Mid")
            .uses("Mid", "Leaf")
            .build(),
    );

    core.step(ProjectEvent::Invalidate {
        unit: "Leaf".to_string(),
    });

    assert_eq!(core.query_state("Mid").unwrap(), UnitState::Invalid);
    assert_eq!(core.query_state("Top").unwrap(), UnitState::Normal);
}

#[test]
fn one_shot_mode_exits_once_the_last_job_finishes() {
    let options = RuntimeOptions {
        exit_when_idle: true,
        compile_on_change: false,
    };
    let mut core = core_with(
        chain(),
        &StaticParser::new(),
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        options,
    );

    let step = core.step(ProjectEvent::CompileAll);
    let jobs: Vec<u64> = step.dispatched().map(|r| r.job_id).collect();
    assert_eq!(jobs.len(), 2);
    assert!(step.keep_running);

    let step = core.step(ProjectEvent::CompileFinished {
        job_id: jobs[0],
        success: true,
    });
    assert!(step.keep_running);

    let step = core.step(ProjectEvent::CompileFinished {
        job_id: jobs[1],
        success: true,
    });
    assert!(!step.keep_running);
    assert!(matches!(step.commands.as_slice(), [CoreCommand::RequestExit]));
}

#[test]
fn one_shot_mode_with_nothing_to_do_exits_immediately() {
    let options = RuntimeOptions {
        exit_when_idle: true,
        compile_on_change: false,
    };
    let mut core = core_with(
        GraphBuilder::new().compiled("A").build(),
        &StaticParser::new(),
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        options,
    );

    let step = core.step(ProjectEvent::CompileAll);

    assert!(!step.keep_running);
    assert_eq!(step.dispatched().count(), 0);
}

#[test]
fn shutdown_stops_the_loop() {
    let mut core = plain_core(chain());
    let step = core.step(ProjectEvent::ShutdownRequested);
    assert!(!step.keep_running);
    assert!(step.commands.is_empty());
}
