// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::CompilerBackend;

use super::core::ProjectCore;
use super::{CompileRequest, CoreCommand, ProjectEvent};

/// Drives the project core in response to `ProjectEvent`s,
/// and delegates actual compilation to a `CompilerBackend`.
///
/// This is a pure IO shell around `ProjectCore`, which contains all the
/// project semantics. This struct handles async IO: reading events from
/// channels and handing compile jobs to the backend.
pub struct Runtime<B: CompilerBackend> {
    core: ProjectCore,
    event_rx: mpsc::Receiver<ProjectEvent>,
    backend: B,
}

impl<B: CompilerBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: CompilerBackend> Runtime<B> {
    pub fn new(core: ProjectCore, event_rx: mpsc::Receiver<ProjectEvent>, backend: B) -> Self {
        Self {
            core,
            event_rx,
            backend,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `ProjectEvent`s from `event_rx`.
    /// - Feeds them into the core.
    /// - Executes commands returned by the core (dispatch jobs, exit).
    ///
    /// Returns the core so callers can inspect the final project state.
    pub async fn run(mut self) -> Result<ProjectCore> {
        info!("incbuild runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(self.core)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchJob(request) => self.submit(request).await?,
            CoreCommand::RequestExit => {
                // keep_running=false already ends the loop.
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn submit(&mut self, request: CompileRequest) -> Result<()> {
        debug!(
            job_id = request.job_id,
            members = ?request.names,
            "submitting compile job"
        );
        self.backend.submit(request).await
    }
}
