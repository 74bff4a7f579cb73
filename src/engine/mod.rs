// src/engine/mod.rs

//! Project orchestration.
//!
//! This module ties together:
//! - the dependency graph and unit states
//! - the SCC scheduler
//! - the external collaborators (parser, editor, debugger, docs)
//! - the event loop that reacts to:
//!   - compile requests from the CLI or UI
//!   - source file changes from the watcher
//!   - compile progress from the compiler backend
//!   - shutdown signals
//!
//! The pure, synchronous orchestrator lives in [`core`]; the async/IO shell
//! is implemented in [`runtime`].

use std::fmt;
use std::path::PathBuf;

use crate::graph::{UnitId, UnitName};

pub mod bootstrap;
pub mod collaborators;
pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::{Analysis, ProjectCore};
pub use collaborators::{
    DebugRuntime, DocExtractor, EditorHost, HeadlessEditor, IdleDebugger, NoDocs, ProjectContext,
};
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;

/// Identifier of one dispatched compile job, unique within a project session.
pub type JobId = u64;

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once no compile job is in flight after a compile request or a
    /// job completion (one-shot CLI mode).
    pub exit_when_idle: bool,
    /// In watch mode, follow every analysed source change with `compile_all`.
    pub compile_on_change: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One message reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// `None` when the failure is not tied to a file (e.g. the compiler
    /// could not be started).
    pub path: Option<PathBuf>,
    pub line: Option<u32>,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(path: Option<PathBuf>, line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            path,
            line,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(path: Option<PathBuf>, line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            path,
            line,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(p), Some(l)) => write!(f, "{}:{}: ", p.display(), l)?,
            (Some(p), None) => write!(f, "{}: ", p.display())?,
            _ => {}
        }
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// A compile job as handed to the compiler backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub job_id: JobId,
    pub members: Vec<UnitId>,
    pub names: Vec<UnitName>,
    /// Source files, in job member order.
    pub sources: Vec<PathBuf>,
    pub classpath: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

/// Events flowing into the runtime from the CLI, the watcher and the
/// compiler backend.
#[derive(Debug, Clone)]
pub enum ProjectEvent {
    CompileAll,
    CompileOne {
        unit: UnitName,
    },
    Rebuild,
    Invalidate {
        unit: UnitName,
    },
    /// A source file was created or modified.
    SourceChanged {
        path: PathBuf,
    },
    SourceRemoved {
        path: PathBuf,
    },
    CompileStarted {
        job_id: JobId,
    },
    CompileDiagnostic {
        job_id: JobId,
        diagnostic: Diagnostic,
    },
    CompileFinished {
        job_id: JobId,
        success: bool,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}
