#![allow(dead_code)]

use incbuild::engine::{
    CompileRequest, ProjectContext, ProjectCore, RuntimeOptions,
};
use incbuild::engine::core::CompileSettings;
use incbuild::graph::DependencyGraph;
use incbuild::scheduler::CompileJob;
use incbuild_test_utils::{RecordingEditor, ScriptedDebugger, StaticParser};

/// Core over `graph` with recording fakes and default settings.
pub fn core_with(
    graph: DependencyGraph,
    parser: &StaticParser,
    editor: &RecordingEditor,
    debugger: &ScriptedDebugger,
    options: RuntimeOptions,
) -> ProjectCore {
    let ctx = ProjectContext::headless(Box::new(parser.clone()))
        .with_editor(Box::new(editor.clone()))
        .with_debugger(Box::new(debugger.clone()));
    ProjectCore::new(graph, ctx, CompileSettings::default(), options)
}

/// Core with headless collaborators and an empty parser.
pub fn plain_core(graph: DependencyGraph) -> ProjectCore {
    core_with(
        graph,
        &StaticParser::new(),
        &RecordingEditor::new(),
        &ScriptedDebugger::new(true),
        RuntimeOptions::default(),
    )
}

pub fn job_names(jobs: &[CompileJob]) -> Vec<Vec<String>> {
    jobs.iter().map(|j| j.names().to_vec()).collect()
}

pub fn request_names(requests: &[CompileRequest]) -> Vec<Vec<String>> {
    requests.iter().map(|r| r.names.clone()).collect()
}

/// Names in a job, sorted, for comparisons that ignore member order.
pub fn sorted(names: &[String]) -> Vec<String> {
    let mut v = names.to_vec();
    v.sort();
    v
}
