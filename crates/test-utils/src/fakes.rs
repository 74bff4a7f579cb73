#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use incbuild::engine::{
    CompileRequest, DebugRuntime, Diagnostic, DocExtractor, EditorHost, ProjectEvent,
};
use incbuild::errors::{IncbuildError, Result};
use incbuild::exec::CompilerBackend;
use incbuild::parse::{ParseResult, SourceParser};

/// A fake compiler backend that:
/// - records every submitted request
/// - immediately reports `CompileStarted`, then `CompileFinished`.
///
/// A job fails if any of its members was registered with `fail_unit`; the
/// failure comes with one error diagnostic on the job's first source.
pub struct FakeCompilerBackend {
    runtime_tx: mpsc::Sender<ProjectEvent>,
    submitted: Arc<Mutex<Vec<CompileRequest>>>,
    failing: HashSet<String>,
}

impl FakeCompilerBackend {
    pub fn new(runtime_tx: mpsc::Sender<ProjectEvent>) -> Self {
        Self {
            runtime_tx,
            submitted: Arc::new(Mutex::new(Vec::new())),
            failing: HashSet::new(),
        }
    }

    pub fn fail_unit(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Shared view of the submitted requests, usable after the backend has
    /// moved into the runtime.
    pub fn submitted(&self) -> Arc<Mutex<Vec<CompileRequest>>> {
        Arc::clone(&self.submitted)
    }
}

impl CompilerBackend for FakeCompilerBackend {
    fn submit(
        &mut self,
        request: CompileRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let submitted = Arc::clone(&self.submitted);
        let fails = request.names.iter().any(|n| self.failing.contains(n));

        Box::pin(async move {
            let job_id = request.job_id;
            let first_source = request.sources.first().cloned();
            submitted.lock().unwrap().push(request);

            tx.send(ProjectEvent::CompileStarted { job_id })
                .await
                .map_err(anyhow::Error::from)?;
            if fails {
                let diagnostic = Diagnostic::error(first_source, Some(1), "cannot find symbol");
                tx.send(ProjectEvent::CompileDiagnostic { job_id, diagnostic })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            tx.send(ProjectEvent::CompileFinished {
                job_id,
                success: !fails,
            })
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}

/// Everything a `RecordingEditor` was asked to do.
#[derive(Debug, Default, Clone)]
pub struct EditorLog {
    pub saved: Vec<String>,
    pub compiled: Vec<(String, bool)>,
    pub errors: Vec<Diagnostic>,
    pub statuses: Vec<String>,
    pub messages: Vec<String>,
}

/// Editor that records calls; saves of units in `fail_save` fail.
#[derive(Debug, Default, Clone)]
pub struct RecordingEditor {
    log: Arc<Mutex<EditorLog>>,
    fail_save: HashSet<String>,
}

impl RecordingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_save(mut self, unit: &str) -> Self {
        self.fail_save.insert(unit.to_string());
        self
    }

    pub fn log(&self) -> Arc<Mutex<EditorLog>> {
        Arc::clone(&self.log)
    }
}

impl EditorHost for RecordingEditor {
    fn save(&mut self, unit: &str) -> Result<()> {
        if self.fail_save.contains(unit) {
            return Err(IncbuildError::Other(anyhow::anyhow!("disk full while saving {unit}")));
        }
        self.log.lock().unwrap().saved.push(unit.to_string());
        Ok(())
    }

    fn set_compiled(&mut self, unit: &str, compiled: bool) {
        self.log
            .lock()
            .unwrap()
            .compiled
            .push((unit.to_string(), compiled));
    }

    fn show_error(&mut self, diagnostic: &Diagnostic) {
        self.log.lock().unwrap().errors.push(diagnostic.clone());
    }

    fn show_status(&mut self, message: &str) {
        self.log.lock().unwrap().statuses.push(message.to_string());
    }

    fn show_message(&mut self, message: &str) {
        self.log.lock().unwrap().messages.push(message.to_string());
    }
}

/// Debugger whose idleness tests can flip while the core owns it.
#[derive(Debug, Clone)]
pub struct ScriptedDebugger {
    idle: Arc<AtomicBool>,
    cleared: Arc<Mutex<Vec<String>>>,
}

impl ScriptedDebugger {
    pub fn new(idle: bool) -> Self {
        Self {
            idle: Arc::new(AtomicBool::new(idle)),
            cleared: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn idle_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.idle)
    }

    pub fn cleared(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.cleared)
    }
}

impl DebugRuntime for ScriptedDebugger {
    fn is_idle(&self) -> bool {
        self.idle.load(Ordering::SeqCst)
    }

    fn clear_breakpoints(&mut self, unit: &str) {
        self.cleared.lock().unwrap().push(unit.to_string());
    }
}

/// Records which units had their documentation re-extracted.
#[derive(Debug, Default, Clone)]
pub struct RecordingDocs {
    extracted: Arc<Mutex<Vec<String>>>,
}

impl RecordingDocs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extracted(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.extracted)
    }
}

impl DocExtractor for RecordingDocs {
    fn extract(&mut self, unit: &str, _source: &Path) {
        self.extracted.lock().unwrap().push(unit.to_string());
    }
}

#[derive(Debug, Default)]
struct ParserScript {
    results: HashMap<PathBuf, ParseResult>,
    failing: HashSet<PathBuf>,
    calls: Vec<PathBuf>,
}

/// Parser answering from a table keyed by source path.
///
/// Unknown paths parse to an empty result. Clones share the table, so tests
/// can change answers after the core took ownership of one clone.
#[derive(Debug, Default, Clone)]
pub struct StaticParser {
    script: Arc<Mutex<ParserScript>>,
}

impl StaticParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, source: impl Into<PathBuf>, result: ParseResult) -> Self {
        self.set(source, result);
        self
    }

    pub fn set(&self, source: impl Into<PathBuf>, result: ParseResult) {
        let source = source.into();
        let mut script = self.script.lock().unwrap();
        script.failing.remove(&source);
        script.results.insert(source, result);
    }

    pub fn fail(&self, source: impl Into<PathBuf>) {
        self.script.lock().unwrap().failing.insert(source.into());
    }

    /// Paths parsed so far, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.script.lock().unwrap().calls.clone()
    }
}

impl SourceParser for StaticParser {
    fn parse(&self, source: &Path, _known: &[String]) -> Result<ParseResult> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(source.to_path_buf());
        if script.failing.contains(source) {
            return Err(IncbuildError::ParseFailed {
                path: source.to_path_buf(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(script.results.get(source).cloned().unwrap_or_default())
    }
}
