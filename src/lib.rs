// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod graph;
pub mod logging;
pub mod parse;
pub mod scheduler;
pub mod state;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, project_root};
use crate::engine::{ProjectContext, ProjectCore, ProjectEvent, Runtime, RuntimeOptions};
use crate::exec::{CompilerCommand, ProcessCompilerBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::parse::JavaSourceScanner;
use crate::scheduler::CompileJob;
use crate::state::UnitState;
use crate::watch::{SourceFilter, WatchTarget};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - descriptor loading and project bootstrap
/// - the project core / runtime
/// - the compiler backend
/// - (optional) file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let descriptor = PathBuf::from(&args.project);
    let project = load_and_validate(&descriptor)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    // Absolute root, so watcher paths and unit sources use the same keys.
    let root = project_root(&descriptor);
    let root = fs.canonicalize(&root).unwrap_or(root);

    let parser = JavaSourceScanner::new(fs.clone())?;
    let options = RuntimeOptions {
        exit_when_idle: !args.watch,
        compile_on_change: args.watch,
    };
    let core = ProjectCore::load(
        &project,
        &root,
        fs.as_ref(),
        ProjectContext::headless(Box::new(parser)),
        options,
    )?;

    if args.dry_run {
        print_dry_run(&core);
        return Ok(());
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<ProjectEvent>(64);

    let command = CompilerCommand {
        program: project.compiler.program.clone(),
        args: project.compiler.args.clone(),
    };
    let backend = ProcessCompilerBackend::new(command, rt_tx.clone())?;

    let _watcher_handle = if args.watch {
        let target = WatchTarget {
            source_root: core.settings().source_root.clone(),
            project_root: root.clone(),
            hash_storage: project.watch.hash_storage,
        };
        let filter = SourceFilter::from_section(&project.watch)?;
        Some(crate::watch::spawn_watcher(target, filter, rt_tx.clone())?)
    } else {
        None
    };

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(ProjectEvent::ShutdownRequested).await;
        });
    }

    let initial = match (&args.unit, args.rebuild) {
        (Some(unit), _) => ProjectEvent::CompileOne { unit: unit.clone() },
        (None, true) => ProjectEvent::Rebuild,
        (None, false) => ProjectEvent::CompileAll,
    };
    info!(?initial, "initial build request");
    rt_tx.send(initial).await?;

    let runtime = Runtime::new(core, rt_rx, backend);
    let core = runtime.run().await?;

    print_summary(&core);
    Ok(())
}

/// Print the compile jobs a full build would submit, in order.
fn print_dry_run(core: &ProjectCore) {
    let jobs = core.plan();

    println!("incbuild dry-run");
    println!("  source_root = {}", core.settings().source_root.display());
    println!("  output_dir  = {}", core.settings().output_dir.display());
    println!("  units       = {}", core.graph().len());
    println!();

    println!("jobs ({}):", jobs.len());
    for (index, job) in jobs.iter().enumerate() {
        print_job(index + 1, job);
    }

    debug!("dry-run complete (no compilation)");
}

fn print_job(number: usize, job: &CompileJob) {
    let marker = if job.is_singleton() { "" } else { " (cycle)" };
    println!("  {number}. {}{marker}", job.names().join(", "));
    for source in job.sources() {
        println!("      {}", source.display());
    }
}

fn print_summary(core: &ProjectCore) {
    let mut normal = 0usize;
    let mut invalid = Vec::new();
    for (_, unit) in core.graph().units() {
        if !unit.has_source() {
            continue;
        }
        match unit.state() {
            UnitState::Normal => normal += 1,
            _ => invalid.push(unit.name().to_string()),
        }
    }
    invalid.sort();

    println!("{normal} unit(s) up to date, {} out of date", invalid.len());
    for name in invalid {
        println!("  - {name}");
    }
}
