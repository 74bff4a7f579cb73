// src/exec/mod.rs

//! Compiler execution layer.
//!
//! This module runs the external compiler for each compile job, using
//! `tokio::process::Command`, and reports back to the runtime via
//! `ProjectEvent`s.
//!
//! - [`compile_queue`] owns the serial loop; one compiler process at a time.
//! - [`compiler_runner`] handles a single compiler invocation.
//! - [`diagnostics`] turns compiler output lines into `Diagnostic`s.
//! - [`backend`] provides the `CompilerBackend` trait and the process-backed
//!   `ProcessCompilerBackend` used in production, which tests replace with
//!   a fake implementation.

pub mod backend;
pub mod compile_queue;
pub mod compiler_runner;
pub mod diagnostics;

pub use backend::{CompilerBackend, ProcessCompilerBackend};
pub use compiler_runner::CompilerCommand;
pub use diagnostics::DiagnosticParser;
