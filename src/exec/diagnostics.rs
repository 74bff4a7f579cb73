// src/exec/diagnostics.rs

//! Recognising compiler messages in `javac`-style output.

use std::path::PathBuf;

use regex::Regex;

use crate::engine::Diagnostic;
use crate::errors::{IncbuildError, Result};

/// Parses lines of the form `path:line: error: message` (or `warning:`).
///
/// Continuation lines (source excerpts, carets, "N errors") are not
/// diagnostics and yield `None`.
#[derive(Debug, Clone)]
pub struct DiagnosticParser {
    line: Regex,
}

impl DiagnosticParser {
    pub fn new() -> Result<Self> {
        let line = Regex::new(r"^(?P<path>.+?):(?P<line>\d+): (?P<kind>error|warning): (?P<msg>.*)$")
            .map_err(|e| IncbuildError::Other(anyhow::anyhow!("invalid diagnostic pattern: {e}")))?;
        Ok(Self { line })
    }

    pub fn parse_line(&self, text: &str) -> Option<Diagnostic> {
        let caps = self.line.captures(text.trim_end())?;
        let path = PathBuf::from(caps.name("path")?.as_str());
        let line = caps.name("line")?.as_str().parse::<u32>().ok();
        let message = caps.name("msg")?.as_str().trim().to_string();
        match caps.name("kind")?.as_str() {
            "error" => Some(Diagnostic::error(Some(path), line, message)),
            _ => Some(Diagnostic::warning(Some(path), line, message)),
        }
    }
}
