// src/exec/backend.rs

//! Pluggable compiler backend abstraction.
//!
//! The runtime talks to a `CompilerBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake compiler in tests while keeping the
//! process-backed implementation in [`compile_queue`](super::compile_queue).
//!
//! - `ProcessCompilerBackend` is the default implementation. It forwards
//!   requests to the serial compile queue.
//! - Tests can provide their own backend that, for example, records which
//!   jobs were submitted and directly emits `CompileFinished` events.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::engine::{CompileRequest, ProjectEvent};
use crate::errors::{Error, IncbuildError, Result};
use crate::exec::compile_queue::spawn_compile_queue;
use crate::exec::compiler_runner::CompilerCommand;
use crate::exec::diagnostics::DiagnosticParser;

/// Trait abstracting how compile jobs are executed.
///
/// Implementations must run jobs one at a time, in submission order, and
/// report each job's progress back as `ProjectEvent`s.
pub trait CompilerBackend: Send {
    /// Queue one job. Returning does not mean the job ran.
    fn submit(
        &mut self,
        request: CompileRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Backend that runs the configured compiler as a child process.
pub struct ProcessCompilerBackend {
    tx: mpsc::UnboundedSender<CompileRequest>,
}

impl ProcessCompilerBackend {
    /// Create the backend, wiring it to the given runtime event sender.
    ///
    /// This spawns the background compile queue immediately, so it must be
    /// called from within a Tokio runtime.
    pub fn new(command: CompilerCommand, runtime_tx: mpsc::Sender<ProjectEvent>) -> Result<Self> {
        let parser = DiagnosticParser::new()?;
        let tx = spawn_compile_queue(command, parser, runtime_tx);
        Ok(Self { tx })
    }
}

impl CompilerBackend for ProcessCompilerBackend {
    fn submit(
        &mut self,
        request: CompileRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let sent = self
            .tx
            .send(request)
            .map_err(|e| IncbuildError::Other(Error::from(e)));
        Box::pin(async move { sent })
    }
}
