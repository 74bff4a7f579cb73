// src/engine/core.rs

//! Pure project orchestrator.
//!
//! [`ProjectCore`] owns the dependency graph and the collaborators, and turns
//! compile requests and compiler feedback into unit state changes plus
//! [`CompileRequest`]s for the IO shell to submit.
//!
//! The core is synchronous and deterministic: no Tokio, no channels, no
//! processes. Everything it needs from outside goes through
//! [`ProjectContext`], so it can be exercised entirely with fakes.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::engine::bootstrap::{relative_to, unit_name_for};
use crate::engine::event_handlers::{self, CoreStep};
use crate::engine::{
    CompileRequest, Diagnostic, JobId, ProjectContext, ProjectEvent, RuntimeOptions,
};
use crate::errors::{IncbuildError, Result};
use crate::graph::{CompilationUnit, DependencyGraph, EdgeId, UnitId, UnitName};
use crate::scheduler::{CompileJob, Scheduler};
use crate::state::{StateMachine, UnitState};
use crate::types::UnitRole;

/// Shown when a compile is requested while the debugger is not idle.
pub const DEBUGGER_BUSY_MESSAGE: &str =
    "Cannot compile while a program is running or stopped in the debugger.";

/// Result of [`ProjectCore::analyse_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    /// Edges were re-derived from a fresh parse.
    Analysed {
        added: Vec<EdgeId>,
        /// Uses-edges the parse no longer mentions; kept in the graph.
        unconfirmed: Vec<EdgeId>,
    },
    /// The source could not be parsed; edges were left as they were.
    ParseFailed,
    /// An analysis of this unit is already running, or the unit has no
    /// source.
    Skipped,
}

/// Where compiled output goes and how the project finds its sources.
#[derive(Debug, Clone)]
pub struct CompileSettings {
    pub source_root: PathBuf,
    pub output_dir: PathBuf,
    pub classpath: Vec<PathBuf>,
    /// Unknown `*.java` files under `source_root` become units when they
    /// change.
    pub discover: bool,
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            output_dir: PathBuf::from("classes"),
            classpath: Vec::new(),
            discover: true,
        }
    }
}

#[derive(Debug)]
struct InFlightJob {
    members: Vec<UnitId>,
    /// Quiet jobs never put errors in front of the user.
    quiet: bool,
    error_shown: bool,
}

/// Project orchestrator state.
///
/// This owns:
/// - the dependency graph (and with it every unit's state)
/// - the external collaborators
/// - the compile jobs that were dispatched and have not finished yet
#[derive(Debug)]
pub struct ProjectCore {
    graph: DependencyGraph,
    ctx: ProjectContext,
    settings: CompileSettings,
    options: RuntimeOptions,
    /// Units whose role came from the descriptor; parses do not override it.
    pinned_roles: HashSet<UnitId>,
    next_job: JobId,
    in_flight: BTreeMap<JobId, InFlightJob>,
}

impl ProjectCore {
    pub fn new(
        graph: DependencyGraph,
        ctx: ProjectContext,
        settings: CompileSettings,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            graph,
            ctx,
            settings,
            options,
            pinned_roles: HashSet::new(),
            next_job: 1,
            in_flight: BTreeMap::new(),
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut DependencyGraph {
        &mut self.graph
    }

    pub fn context_mut(&mut self) -> &mut ProjectContext {
        &mut self.ctx
    }

    pub fn settings(&self) -> &CompileSettings {
        &self.settings
    }

    pub fn options(&self) -> RuntimeOptions {
        self.options
    }

    /// Keep `unit`'s current role even when a parse suggests another one.
    pub fn pin_role(&mut self, unit: UnitId) {
        self.pinned_roles.insert(unit);
    }

    /// No compile job is in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn in_flight_jobs(&self) -> usize {
        self.in_flight.len()
    }

    // ---- queries -------------------------------------------------------

    /// Find a unit by qualified name, or by unique simple name.
    pub fn lookup(&self, name: &str) -> Result<UnitId> {
        self.graph
            .resolve(name)
            .ok_or_else(|| IncbuildError::UnitNotFound(name.to_string()))
    }

    pub fn query_state(&self, name: &str) -> Result<UnitState> {
        let id = self.lookup(name)?;
        self.graph
            .unit(id)
            .map(CompilationUnit::state)
            .ok_or_else(|| IncbuildError::UnitNotFound(name.to_string()))
    }

    pub fn units_with_role(&self, role: UnitRole) -> Vec<&str> {
        self.graph
            .units()
            .filter(|(_, u)| u.role() == role)
            .map(|(_, u)| u.name())
            .collect()
    }

    /// Jobs `compile_all` would dispatch right now, without claiming anything.
    pub fn plan(&self) -> Vec<CompileJob> {
        Scheduler::plan(&self.graph)
    }

    // ---- compile requests ---------------------------------------------

    /// Compile every invalid unit.
    pub fn compile_all(&mut self) -> Vec<CompileRequest> {
        if !self.debugger_idle() {
            return Vec::new();
        }
        let jobs = Scheduler::schedule_all(&mut self.graph);
        self.dispatch(jobs, false)
    }

    /// Compile `name` (even if it looks up to date) plus whatever invalid
    /// units it needs. Its associated unit, if any, is forced too and
    /// compiled quietly in a separate pass.
    pub fn compile_one(&mut self, name: &str) -> Result<Vec<CompileRequest>> {
        let id = self.lookup(name)?;
        if !self.debugger_idle() {
            return Ok(Vec::new());
        }

        let association = self
            .graph
            .unit(id)
            .and_then(|u| u.association())
            .and_then(|a| self.graph.find(a))
            .filter(|a| self.graph.unit(*a).is_some_and(CompilationUnit::has_source));

        let mut requests = Vec::new();
        if self.force_for_compile(id) {
            let jobs = Scheduler::schedule_from(&mut self.graph, &[id]);
            requests.extend(self.dispatch(jobs, false));
        }
        if let Some(assoc) = association {
            if self.force_for_compile(assoc) {
                let jobs = Scheduler::schedule_from(&mut self.graph, &[assoc]);
                requests.extend(self.dispatch(jobs, true));
            }
        }
        Ok(requests)
    }

    /// Force every unit invalid, re-derive all edges, then compile
    /// everything.
    pub fn rebuild(&mut self) -> Vec<CompileRequest> {
        if !self.debugger_idle() {
            return Vec::new();
        }

        let forced = StateMachine::new(&mut self.graph).force_all_invalid();
        info!(units = forced, "rebuilding project");

        let ids: Vec<UnitId> = self
            .graph
            .units()
            .filter(|(_, u)| u.has_source())
            .map(|(id, _)| id)
            .collect();
        for id in ids {
            self.analyse_source(id);
        }

        let jobs = Scheduler::schedule_all(&mut self.graph);
        self.dispatch(jobs, false)
    }

    /// Mark `name` modified; its direct dependents become invalid too.
    pub fn invalidate(&mut self, name: &str) -> Result<Vec<UnitId>> {
        let id = self.lookup(name)?;
        Ok(StateMachine::new(&mut self.graph).invalidate(id))
    }

    // ---- source analysis ----------------------------------------------

    /// Re-parse a unit's source and bring its outgoing edges in line.
    ///
    /// A nested call for a unit whose analysis is still running is skipped.
    pub fn analyse_source(&mut self, id: UnitId) -> Analysis {
        let Some(unit) = self.graph.unit_mut(id) else {
            return Analysis::Skipped;
        };
        if !unit.begin_analysis() {
            debug!(unit = %unit.name(), "analysis already in progress; skipped");
            return Analysis::Skipped;
        }

        let analysis = self.analyse_latched(id);

        if let Some(unit) = self.graph.unit_mut(id) {
            unit.end_analysis();
        }
        analysis
    }

    fn analyse_latched(&mut self, id: UnitId) -> Analysis {
        let Some((name, source)) = self.graph.unit(id).and_then(|u| {
            u.source()
                .map(|s| (u.name().to_string(), s.to_path_buf()))
        }) else {
            return Analysis::Skipped;
        };

        let known: Vec<String> = self.graph.names().map(str::to_string).collect();
        let parse = match self.ctx.parser.parse(&source, &known) {
            Ok(parse) => parse,
            Err(err) => {
                debug!(unit = %name, error = %err, "source not parsable; keeping edges");
                StateMachine::new(&mut self.graph).force_invalid(id);
                return Analysis::ParseFailed;
            }
        };

        if let Some(role) = parse.role {
            if !self.pinned_roles.contains(&id) {
                if let Some(unit) = self.graph.unit_mut(id) {
                    unit.set_role(role);
                }
            }
        }

        let outcome = self.graph.resynchronize(id, &parse);
        for edge in &outcome.unconfirmed {
            let target = self
                .graph
                .edge(*edge)
                .and_then(|d| self.graph.name_of(d.to()));
            if let Some(target) = target {
                let message =
                    format!("{name}: dependency on {target} is no longer used in the source");
                self.ctx.editor.show_status(&message);
            }
        }

        Analysis::Analysed {
            added: outcome.added,
            unconfirmed: outcome.unconfirmed,
        }
    }

    /// A source file was created or modified.
    ///
    /// The owning unit (discovered on the fly if needed) is invalidated
    /// together with its direct dependents and re-analysed. With
    /// `compile_on_change`, a `compile_all` follows.
    pub fn source_modified(&mut self, path: &Path) -> Vec<CompileRequest> {
        let path = self.absolute(path);
        let id = match self.graph.find_by_source(&path) {
            Some(id) => id,
            None => match self.discover_unit(&path) {
                Some(id) => id,
                None => {
                    debug!(path = %path.display(), "change outside any unit; ignored");
                    return Vec::new();
                }
            },
        };

        let changed = StateMachine::new(&mut self.graph).invalidate(id);
        debug!(path = %path.display(), invalidated = changed.len(), "source modified");
        self.analyse_source(id);

        if self.options.compile_on_change {
            self.compile_all()
        } else {
            Vec::new()
        }
    }

    /// A source file disappeared: drop its unit. Former dependents become
    /// invalid.
    pub fn source_removed(&mut self, path: &Path) -> bool {
        let path = self.absolute(path);
        let Some(id) = self.graph.find_by_source(&path) else {
            return false;
        };
        self.pinned_roles.remove(&id);
        match self.graph.remove_unit(id) {
            Some(unit) => {
                info!(unit = %unit.name(), "source removed; unit dropped");
                true
            }
            None => false,
        }
    }

    pub fn add_unit(&mut self, unit: CompilationUnit) -> Result<UnitId> {
        self.graph.add_unit(unit)
    }

    pub fn remove_unit(&mut self, name: &str) -> Result<CompilationUnit> {
        let id = self
            .graph
            .find(name)
            .ok_or_else(|| IncbuildError::UnitNotFound(name.to_string()))?;
        self.pinned_roles.remove(&id);
        self.graph
            .remove_unit(id)
            .ok_or_else(|| IncbuildError::UnitNotFound(name.to_string()))
    }

    // ---- compiler feedback --------------------------------------------

    pub fn job_started(&mut self, job_id: JobId) {
        match self.in_flight.get(&job_id) {
            Some(job) => debug!(job_id, members = job.members.len(), "compile job started"),
            None => warn!(job_id, "start reported for unknown compile job"),
        }
    }

    /// Only the first error of a non-quiet job reaches the editor.
    pub fn job_diagnostic(&mut self, job_id: JobId, diagnostic: Diagnostic) {
        let Some(job) = self.in_flight.get_mut(&job_id) else {
            warn!(job_id, %diagnostic, "diagnostic for unknown compile job");
            return;
        };
        if !diagnostic.is_error() {
            debug!(job_id, %diagnostic, "compiler warning");
            return;
        }
        if job.quiet || job.error_shown {
            info!(job_id, %diagnostic, "compiler error");
            return;
        }
        job.error_shown = true;
        self.ctx.editor.show_error(&diagnostic);
    }

    /// Apply a job's outcome to all of its members.
    pub fn job_finished(&mut self, job_id: JobId, success: bool) {
        let Some(job) = self.in_flight.remove(&job_id) else {
            warn!(job_id, success, "completion reported for unknown compile job");
            return;
        };

        let compiled = StateMachine::new(&mut self.graph).complete_job(&job.members, success);

        // Only members whose output now matches their source reach the
        // editor and the doc extractor.
        for &id in &compiled {
            let Some(unit) = self.graph.unit(id) else {
                continue;
            };
            if let Some(source) = unit.source() {
                self.ctx.docs.extract(unit.name(), source);
            }
            self.ctx.editor.set_compiled(unit.name(), true);
        }

        info!(
            job_id,
            success,
            members = job.members.len(),
            compiled = compiled.len(),
            remaining = self.in_flight.len(),
            "compile job finished"
        );
    }

    /// Handle a single event, updating state and returning the commands for
    /// the IO shell.
    pub fn step(&mut self, event: ProjectEvent) -> CoreStep {
        match event {
            ProjectEvent::CompileAll => event_handlers::handle_compile_all(self),
            ProjectEvent::CompileOne { unit } => event_handlers::handle_compile_one(self, &unit),
            ProjectEvent::Rebuild => event_handlers::handle_rebuild(self),
            ProjectEvent::Invalidate { unit } => event_handlers::handle_invalidate(self, &unit),
            ProjectEvent::SourceChanged { path } => {
                event_handlers::handle_source_changed(self, &path)
            }
            ProjectEvent::SourceRemoved { path } => {
                event_handlers::handle_source_removed(self, &path)
            }
            ProjectEvent::CompileStarted { job_id } => {
                self.job_started(job_id);
                CoreStep::continue_with(Vec::new())
            }
            ProjectEvent::CompileDiagnostic { job_id, diagnostic } => {
                self.job_diagnostic(job_id, diagnostic);
                CoreStep::continue_with(Vec::new())
            }
            ProjectEvent::CompileFinished { job_id, success } => {
                event_handlers::handle_compile_finished(self, job_id, success)
            }
            ProjectEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    // ---- internals ------------------------------------------------------

    fn debugger_idle(&mut self) -> bool {
        if self.ctx.debugger.is_idle() {
            return true;
        }
        warn!("compile request rejected: debugger busy");
        self.ctx.editor.show_message(DEBUGGER_BUSY_MESSAGE);
        false
    }

    /// Force a unit invalid so the next scheduling pass picks it up.
    /// Units already claimed by a pending job are left alone.
    fn force_for_compile(&mut self, id: UnitId) -> bool {
        let Some(unit) = self.graph.unit(id) else {
            return false;
        };
        if !unit.has_source() {
            debug!(unit = %unit.name(), "library unit; nothing to compile");
            return false;
        }
        if unit.is_queued() {
            debug!(unit = %unit.name(), "unit already queued for compilation");
            return false;
        }
        StateMachine::new(&mut self.graph).force_invalid(id);
        true
    }

    /// Save every member, then move the jobs to `Compiling` and hand out
    /// requests. A failed save aborts the whole batch and releases its
    /// units.
    fn dispatch(&mut self, jobs: Vec<CompileJob>, quiet: bool) -> Vec<CompileRequest> {
        if jobs.is_empty() {
            debug!("nothing to compile");
            return Vec::new();
        }

        let claimed: Vec<UnitId> = jobs
            .iter()
            .flat_map(|j| j.members().iter().copied())
            .collect();

        for name in jobs.iter().flat_map(|j| j.names().iter()) {
            if let Err(err) = self.ctx.editor.save(name) {
                warn!(unit = %name, error = %err, "save before compile failed; compile aborted");
                self.ctx
                    .editor
                    .show_message(&format!("Could not save {name} before compiling: {err}"));
                StateMachine::new(&mut self.graph).release(&claimed);
                return Vec::new();
            }
        }

        let mut requests = Vec::with_capacity(jobs.len());
        for job in jobs {
            StateMachine::new(&mut self.graph).mark_compiling(job.members());
            for name in job.names() {
                self.ctx.debugger.clear_breakpoints(name);
            }

            let job_id = self.next_job;
            self.next_job += 1;
            info!(job_id, members = ?job.names(), quiet, "dispatching compile job");

            self.in_flight.insert(
                job_id,
                InFlightJob {
                    members: job.members().to_vec(),
                    quiet,
                    error_shown: false,
                },
            );
            requests.push(CompileRequest {
                job_id,
                members: job.members().to_vec(),
                names: job.names().to_vec(),
                sources: job.sources().to_vec(),
                classpath: self.settings.classpath.clone(),
                output_dir: self.settings.output_dir.clone(),
            });
        }
        requests
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        let root = &self.settings.source_root;
        if path.is_absolute() || root == Path::new(".") || path.starts_with(root) {
            path.to_path_buf()
        } else {
            self.settings.source_root.join(path)
        }
    }

    fn discover_unit(&mut self, path: &Path) -> Option<UnitId> {
        if !self.settings.discover {
            return None;
        }
        let relative = relative_to(&self.settings.source_root, path)?;
        let name: UnitName = unit_name_for(relative)?;
        match self
            .graph
            .add_unit(CompilationUnit::with_source(name.clone(), path))
        {
            Ok(id) => {
                info!(unit = %name, "new source discovered");
                Some(id)
            }
            Err(err) => {
                warn!(unit = %name, error = %err, "could not add discovered unit");
                None
            }
        }
    }
}
