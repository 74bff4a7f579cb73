// tests/integration/runtime_fake_backend.rs

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use incbuild::engine::core::CompileSettings;
use incbuild::engine::{ProjectContext, ProjectCore, ProjectEvent, Runtime, RuntimeOptions};
use incbuild::graph::DependencyGraph;
use incbuild::state::UnitState;
use incbuild_test_utils::{
    init_tracing, with_timeout, FakeCompilerBackend, GraphBuilder, RecordingEditor,
    ScriptedDebugger, StaticParser,
};

fn one_shot() -> RuntimeOptions {
    RuntimeOptions {
        exit_when_idle: true,
        compile_on_change: false,
    }
}

fn core_for(graph: DependencyGraph, editor: &RecordingEditor, options: RuntimeOptions) -> ProjectCore {
    let ctx = ProjectContext::headless(Box::new(StaticParser::new()))
        .with_editor(Box::new(editor.clone()))
        .with_debugger(Box::new(ScriptedDebugger::new(true)));
    ProjectCore::new(graph, ctx, CompileSettings::default(), options)
}

#[tokio::test]
async fn runtime_compiles_dependencies_first_and_exits() {
    init_tracing();

    let graph = GraphBuilder::new()
        .unit("A")
        .unit("B")
        .unit("C")
        .uses("A", "B")
        .extends("B", "C")
        .build();
    let editor = RecordingEditor::new();
    let core = core_for(graph, &editor, one_shot());

    let (tx, rx) = mpsc::channel::<ProjectEvent>(64);
    let backend = FakeCompilerBackend::new(tx.clone());
    let submitted = backend.submitted();

    tx.send(ProjectEvent::CompileAll).await.unwrap();
    let core = with_timeout(Runtime::new(core, rx, backend).run())
        .await
        .unwrap();

    let order: Vec<Vec<String>> = submitted
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.names.clone())
        .collect();
    assert_eq!(
        order,
        vec![
            vec!["C".to_string()],
            vec!["B".to_string()],
            vec!["A".to_string()]
        ]
    );

    for name in ["A", "B", "C"] {
        assert_eq!(core.query_state(name).unwrap(), UnitState::Normal, "{name}");
    }
    assert!(core.is_idle());
    assert!(editor.log().lock().unwrap().errors.is_empty());
}

#[tokio::test]
async fn failing_job_leaves_members_invalid_and_reports_error() {
    init_tracing();

    let graph = GraphBuilder::new()
        .unit("Lib")
        .unit("Cycle1")
        .unit("Cycle2")
        .uses("Cycle1", "Cycle2")
        .uses("Cycle2", "Cycle1")
        .uses("Cycle1", "Lib")
        .build();
    let editor = RecordingEditor::new();
    let core = core_for(graph, &editor, one_shot());

    let (tx, rx) = mpsc::channel::<ProjectEvent>(64);
    let backend = FakeCompilerBackend::new(tx.clone()).fail_unit("Cycle2");

    tx.send(ProjectEvent::CompileAll).await.unwrap();
    let core = with_timeout(Runtime::new(core, rx, backend).run())
        .await
        .unwrap();

    assert_eq!(core.query_state("Lib").unwrap(), UnitState::Normal);
    // The whole cycle shares the outcome.
    assert_eq!(core.query_state("Cycle1").unwrap(), UnitState::Invalid);
    assert_eq!(core.query_state("Cycle2").unwrap(), UnitState::Invalid);

    let log = editor.log();
    let log = log.lock().unwrap();
    assert_eq!(log.errors.len(), 1);
    assert_eq!(log.errors[0].message, "cannot find symbol");
    // Failed members never get a compiled flag.
    assert_eq!(log.compiled, vec![("Lib".to_string(), true)]);
}

#[tokio::test]
async fn nothing_to_compile_exits_immediately() {
    init_tracing();

    let graph = GraphBuilder::new().compiled("A").library("Ext").build();
    let editor = RecordingEditor::new();
    let core = core_for(graph, &editor, one_shot());

    let (tx, rx) = mpsc::channel::<ProjectEvent>(8);
    let backend = FakeCompilerBackend::new(tx.clone());
    let submitted = backend.submitted();

    tx.send(ProjectEvent::CompileAll).await.unwrap();
    let core = with_timeout(Runtime::new(core, rx, backend).run())
        .await
        .unwrap();

    assert!(submitted.lock().unwrap().is_empty());
    assert_eq!(core.query_state("A").unwrap(), UnitState::Normal);
}

#[tokio::test]
async fn watch_mode_compiles_on_change_until_shutdown() {
    init_tracing();

    let graph = GraphBuilder::new()
        .compiled("A")
        .compiled("B")
        .uses("B", "A")
        .build();
    let editor = RecordingEditor::new();
    let core = core_for(
        graph,
        &editor,
        RuntimeOptions {
            exit_when_idle: false,
            compile_on_change: true,
        },
    );

    let (tx, rx) = mpsc::channel::<ProjectEvent>(64);
    let backend = FakeCompilerBackend::new(tx.clone());
    let submitted = backend.submitted();
    let handle = tokio::spawn(Runtime::new(core, rx, backend).run());

    tx.send(ProjectEvent::SourceChanged {
        path: PathBuf::from("A.java"),
    })
    .await
    .unwrap();

    // Both jobs are reported back before shutting down.
    let log = editor.log();
    with_timeout(async {
        while log.lock().unwrap().compiled.len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    tx.send(ProjectEvent::ShutdownRequested).await.unwrap();
    let core = with_timeout(handle).await.unwrap().unwrap();

    let order: Vec<Vec<String>> = submitted
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.names.clone())
        .collect();
    assert_eq!(order, vec![vec!["A".to_string()], vec!["B".to_string()]]);
    assert_eq!(core.query_state("A").unwrap(), UnitState::Normal);
    assert_eq!(core.query_state("B").unwrap(), UnitState::Normal);
}
