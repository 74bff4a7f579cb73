// src/parse/mod.rs

//! Source analysis: what a unit extends, implements and uses.
//!
//! The graph only consumes [`ParseResult`]s; anything that implements
//! [`SourceParser`] can feed it. [`scanner::JavaSourceScanner`] is the
//! lightweight regex-based implementation used by the CLI.

pub mod scanner;

use std::fmt::Debug;
use std::path::Path;

use crate::errors::Result;
use crate::types::UnitRole;

pub use scanner::JavaSourceScanner;

/// Outcome of parsing one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    /// Qualified name of the first type declared in the file, if found.
    pub name: Option<String>,
    /// Role suggested by the declaration (interface, abstract class, ...).
    pub role: Option<UnitRole>,
    pub superclass: Option<String>,
    pub implements: Vec<String>,
    /// Other project types the source refers to, first occurrence first.
    pub used: Vec<String>,
}

impl ParseResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extending(mut self, name: impl Into<String>) -> Self {
        self.superclass = Some(name.into());
        self
    }

    pub fn implementing(mut self, name: impl Into<String>) -> Self {
        self.implements.push(name.into());
        self
    }

    pub fn using(mut self, name: impl Into<String>) -> Self {
        self.used.push(name.into());
        self
    }

    pub fn with_role(mut self, role: UnitRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Anything able to turn a source file into a [`ParseResult`].
///
/// `known` holds the qualified names of every unit in the project; names the
/// parser reports that are not among them are dropped later by the graph.
/// A failure (`IncbuildError::ParseFailed`) leaves the unit's edges as they
/// were.
pub trait SourceParser: Send + Sync + Debug {
    fn parse(&self, source: &Path, known: &[String]) -> Result<ParseResult>;
}
