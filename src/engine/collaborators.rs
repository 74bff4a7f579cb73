// src/engine/collaborators.rs

//! External collaborators the orchestrator talks to.
//!
//! They are passed in explicitly through [`ProjectContext`] and live as long
//! as the project does. The CLI uses the headless implementations defined
//! here; tests use the recording fakes from the test-utils crate.

use std::fmt::Debug;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::engine::Diagnostic;
use crate::errors::Result;
use crate::parse::SourceParser;

/// Editor / UI side of the project.
pub trait EditorHost: Send + Debug {
    /// Flush unsaved edits of `unit` to disk before it is compiled.
    ///
    /// An error aborts the compile request that needed the save.
    fn save(&mut self, unit: &str) -> Result<()>;

    /// The unit's compiled output was just replaced (`true`) or the compile
    /// that included it failed (`false`).
    fn set_compiled(&mut self, unit: &str, compiled: bool);

    /// Show a compiler error at its position.
    fn show_error(&mut self, diagnostic: &Diagnostic);

    /// Non-fatal status line (e.g. an inconsistent dependency).
    fn show_status(&mut self, message: &str);

    /// User-facing message (e.g. a compile request was rejected).
    fn show_message(&mut self, message: &str);
}

/// Debug / execution runtime of the program under development.
pub trait DebugRuntime: Send + Debug {
    /// `false` while a program is running or suspended at a breakpoint.
    fn is_idle(&self) -> bool;

    /// Drop breakpoints bound to `unit`'s compiled code.
    fn clear_breakpoints(&mut self, unit: &str);
}

/// Re-extracts documentation metadata after a successful compile.
pub trait DocExtractor: Send + Debug {
    fn extract(&mut self, unit: &str, source: &Path);
}

/// Everything the orchestrator needs from outside, owned by the project.
#[derive(Debug)]
pub struct ProjectContext {
    pub parser: Box<dyn SourceParser>,
    pub editor: Box<dyn EditorHost>,
    pub debugger: Box<dyn DebugRuntime>,
    pub docs: Box<dyn DocExtractor>,
}

impl ProjectContext {
    /// Context for running without an IDE around: nothing to save, the
    /// debugger is always idle, messages go to the log.
    pub fn headless(parser: Box<dyn SourceParser>) -> Self {
        Self {
            parser,
            editor: Box::new(HeadlessEditor),
            debugger: Box::new(IdleDebugger),
            docs: Box::new(NoDocs),
        }
    }

    pub fn with_editor(mut self, editor: Box<dyn EditorHost>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_debugger(mut self, debugger: Box<dyn DebugRuntime>) -> Self {
        self.debugger = debugger;
        self
    }

    pub fn with_docs(mut self, docs: Box<dyn DocExtractor>) -> Self {
        self.docs = docs;
        self
    }
}

/// Editor stand-in that logs instead of showing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessEditor;

impl EditorHost for HeadlessEditor {
    fn save(&mut self, _unit: &str) -> Result<()> {
        Ok(())
    }

    fn set_compiled(&mut self, unit: &str, compiled: bool) {
        debug!(unit, compiled, "compiled flag updated");
    }

    fn show_error(&mut self, diagnostic: &Diagnostic) {
        error!("{diagnostic}");
    }

    fn show_status(&mut self, message: &str) {
        info!("{message}");
    }

    fn show_message(&mut self, message: &str) {
        warn!("{message}");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdleDebugger;

impl DebugRuntime for IdleDebugger {
    fn is_idle(&self) -> bool {
        true
    }

    fn clear_breakpoints(&mut self, _unit: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoDocs;

impl DocExtractor for NoDocs {
    fn extract(&mut self, _unit: &str, _source: &Path) {}
}
