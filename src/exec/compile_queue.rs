// src/exec/compile_queue.rs

//! Serial compile queue.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::{CompileRequest, ProjectEvent};
use crate::exec::compiler_runner::{run_compile, CompilerCommand};
use crate::exec::diagnostics::DiagnosticParser;

/// Spawn the background compile loop.
///
/// The returned sender is what [`ProcessCompilerBackend`](super::ProcessCompilerBackend)
/// submits to. Jobs run strictly one after another, in submission order:
/// a job's compiler process has exited and its `CompileFinished` event has
/// been sent before the next job starts.
///
/// The queue is unbounded: the runtime may enqueue a whole build while the
/// loop is itself waiting to deliver events back to the runtime.
pub fn spawn_compile_queue(
    command: CompilerCommand,
    parser: DiagnosticParser,
    runtime_tx: mpsc::Sender<ProjectEvent>,
) -> mpsc::UnboundedSender<CompileRequest> {
    let (tx, mut rx) = mpsc::unbounded_channel::<CompileRequest>();

    tokio::spawn(async move {
        info!(program = %command.program, "compile queue started");

        while let Some(request) = rx.recv().await {
            debug!(job_id = request.job_id, members = ?request.names, "compile job dequeued");
            run_compile(&command, &parser, request, &runtime_tx).await;
        }

        info!("compile queue finished (channel closed)");
    });

    tx
}
