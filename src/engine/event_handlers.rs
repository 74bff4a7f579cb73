// src/engine/event_handlers.rs

//! Event handling logic for the project core.

use std::path::Path;

use tracing::{debug, warn};

use crate::engine::core::ProjectCore;
use crate::engine::{CompileRequest, JobId};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Submit this job to the compiler backend.
    DispatchJob(CompileRequest),
    /// Request that the process exits (one-shot mode, nothing in flight).
    RequestExit,
}

/// Decision returned by the core after handling a single `ProjectEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    /// Jobs this step dispatches.
    pub fn dispatched(&self) -> impl Iterator<Item = &CompileRequest> + '_ {
        self.commands.iter().filter_map(|c| match c {
            CoreCommand::DispatchJob(req) => Some(req),
            CoreCommand::RequestExit => None,
        })
    }
}

/// Handle `CompileAll`.
pub fn handle_compile_all(core: &mut ProjectCore) -> CoreStep {
    let requests = core.compile_all();
    dispatch_and_maybe_exit(core, requests)
}

/// Handle `CompileOne`. An unknown unit is reported to the user, not
/// returned as an error.
pub fn handle_compile_one(core: &mut ProjectCore, unit: &str) -> CoreStep {
    let requests = match core.compile_one(unit) {
        Ok(requests) => requests,
        Err(err) => {
            warn!(unit, error = %err, "compile request for unknown unit");
            core.context_mut().editor.show_message(&err.to_string());
            Vec::new()
        }
    };
    dispatch_and_maybe_exit(core, requests)
}

/// Handle `Rebuild`.
pub fn handle_rebuild(core: &mut ProjectCore) -> CoreStep {
    let requests = core.rebuild();
    dispatch_and_maybe_exit(core, requests)
}

/// Handle `Invalidate`.
pub fn handle_invalidate(core: &mut ProjectCore, unit: &str) -> CoreStep {
    match core.invalidate(unit) {
        Ok(changed) => debug!(unit, changed = changed.len(), "unit invalidated"),
        Err(err) => warn!(unit, error = %err, "cannot invalidate unknown unit"),
    }
    CoreStep::continue_with(Vec::new())
}

/// Handle `SourceChanged` (watch mode).
pub fn handle_source_changed(core: &mut ProjectCore, path: &Path) -> CoreStep {
    let requests = core.source_modified(path);
    CoreStep::continue_with(into_commands(requests))
}

/// Handle `SourceRemoved` (watch mode).
pub fn handle_source_removed(core: &mut ProjectCore, path: &Path) -> CoreStep {
    if !core.source_removed(path) {
        debug!(path = %path.display(), "removed file did not belong to a unit");
    }
    CoreStep::continue_with(Vec::new())
}

/// Handle `CompileFinished`.
///
/// In one-shot mode, this is where the runtime learns that the last job is
/// done and it may exit.
pub fn handle_compile_finished(core: &mut ProjectCore, job_id: JobId, success: bool) -> CoreStep {
    core.job_finished(job_id, success);
    dispatch_and_maybe_exit(core, Vec::new())
}

fn into_commands(requests: Vec<CompileRequest>) -> Vec<CoreCommand> {
    requests.into_iter().map(CoreCommand::DispatchJob).collect()
}

/// Turn requests into commands; in `exit_when_idle` mode, also exit when
/// nothing is left in flight.
fn dispatch_and_maybe_exit(core: &ProjectCore, requests: Vec<CompileRequest>) -> CoreStep {
    let mut commands = into_commands(requests);

    let mut keep_running = true;
    if core.options().exit_when_idle && core.is_idle() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
