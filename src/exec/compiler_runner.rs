// src/exec/compiler_runner.rs

//! Runs one compiler invocation for one compile job.

use std::ffi::OsString;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::{CompileRequest, Diagnostic, ProjectEvent};
use crate::exec::diagnostics::DiagnosticParser;

/// Program and fixed arguments of the compiler.
#[derive(Debug, Clone)]
pub struct CompilerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CompilerCommand {
    fn default() -> Self {
        Self {
            program: "javac".to_string(),
            args: Vec::new(),
        }
    }
}

impl CompilerCommand {
    /// `<args..> -d <output_dir> [-cp <classpath>] <sources..>`
    pub fn arguments_for(&self, request: &CompileRequest) -> Vec<OsString> {
        let mut out: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        out.push("-d".into());
        out.push(request.output_dir.clone().into_os_string());
        if !request.classpath.is_empty() {
            out.push("-cp".into());
            // join_paths only fails on entries containing the separator.
            let joined = std::env::join_paths(&request.classpath).unwrap_or_else(|_| {
                request
                    .classpath
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join(":")
                    .into()
            });
            out.push(joined);
        }
        out.extend(request.sources.iter().map(|s| s.clone().into_os_string()));
        out
    }
}

/// Run the compiler for `request` and report back through `runtime_tx`.
///
/// Always ends with exactly one `CompileFinished` event for the job, unless
/// the runtime is gone. A compiler that cannot be started counts as a
/// failed job with a path-less error.
pub async fn run_compile(
    command: &CompilerCommand,
    parser: &DiagnosticParser,
    request: CompileRequest,
    runtime_tx: &mpsc::Sender<ProjectEvent>,
) {
    let job_id = request.job_id;
    let _ = runtime_tx.send(ProjectEvent::CompileStarted { job_id }).await;

    let success = match run_compile_inner(command, parser, &request, runtime_tx).await {
        Ok(success) => success,
        Err(err) => {
            error!(job_id, error = %err, "compiler invocation failed");
            let diagnostic = Diagnostic::error(None, None, format!("{err:#}"));
            let _ = runtime_tx
                .send(ProjectEvent::CompileDiagnostic { job_id, diagnostic })
                .await;
            false
        }
    };

    let _ = runtime_tx
        .send(ProjectEvent::CompileFinished { job_id, success })
        .await;
}

async fn run_compile_inner(
    command: &CompilerCommand,
    parser: &DiagnosticParser,
    request: &CompileRequest,
    runtime_tx: &mpsc::Sender<ProjectEvent>,
) -> Result<bool> {
    let job_id = request.job_id;
    info!(
        job_id,
        program = %command.program,
        sources = request.sources.len(),
        "starting compiler"
    );

    let mut cmd = Command::new(&command.program);
    cmd.args(command.arguments_for(request))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning compiler '{}'", command.program))?;

    // stdout is rarely used by javac; drain it so the pipe never fills.
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(job_id, "compiler stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let mut lines = BufReader::new(stderr).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("reading compiler output")?
        {
            match parser.parse_line(&line) {
                Some(diagnostic) => {
                    runtime_tx
                        .send(ProjectEvent::CompileDiagnostic { job_id, diagnostic })
                        .await
                        .context("sending CompileDiagnostic event to runtime")?;
                }
                None => debug!(job_id, "compiler: {}", line),
            }
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for compiler of job {job_id}"))?;

    info!(
        job_id,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "compiler exited"
    );
    Ok(status.success())
}
