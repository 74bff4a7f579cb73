// src/parse/scanner.rs

//! Regex-based Java source scanner.
//!
//! Not a parser: it strips comments and literals, reads the first type
//! declaration header, and collects identifiers that name project units.
//! Good enough to keep the dependency graph honest between real compiles.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::errors::{IncbuildError, Result};
use crate::fs::FileSystem;
use crate::parse::{ParseResult, SourceParser};
use crate::types::UnitRole;

/// Superclasses that make a class a unit test.
const TEST_BASE_CLASSES: &[&str] = &["TestCase", "junit.framework.TestCase"];

#[derive(Debug)]
pub struct JavaSourceScanner {
    fs: Arc<dyn FileSystem>,
    noise: Regex,
    package: Regex,
    declaration: Regex,
    generics: Regex,
    identifier: Regex,
}

impl JavaSourceScanner {
    pub fn new(fs: Arc<dyn FileSystem>) -> Result<Self> {
        Ok(Self {
            fs,
            noise: compile(r#"(?s)//[^\n]*|/\*.*?\*/|"(?:\\.|[^"\\\n])*"|'(?:\\.|[^'\\\n])*'"#)?,
            package: compile(r"\bpackage\s+([A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*)\s*;")?,
            declaration: compile(
                r"(?:^|[\s;}])((?:(?:public|protected|private|abstract|final|static|sealed|non-sealed|strictfp)\s+)*)(class|interface|enum|record|@\s*interface)\s+([A-Za-z_$][\w$]*)",
            )?,
            generics: compile(r"<[^<>]*>")?,
            identifier: compile(r"[A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*")?,
        })
    }

    /// Scan already-loaded text. `path` only labels errors.
    pub fn scan_text(&self, path: &Path, text: &str, known: &[String]) -> Result<ParseResult> {
        let code = self.noise.replace_all(text, " ");
        let names = KnownNames::new(known);

        let package = self
            .package
            .captures(&code)
            .and_then(|c| c.get(1))
            .map(|m| squeeze(m.as_str()));

        let decl = self
            .declaration
            .captures(&code)
            .ok_or_else(|| IncbuildError::ParseFailed {
                path: path.to_path_buf(),
                reason: "no type declaration found".to_string(),
            })?;
        let modifiers = decl.get(1).map_or("", |m| m.as_str());
        let keyword = decl.get(2).map_or("", |m| m.as_str());
        let simple = decl.get(3).map_or("", |m| m.as_str());
        let body_start = decl.get(0).map_or(0, |m| m.end());

        let qualified = match &package {
            Some(pkg) => format!("{pkg}.{simple}"),
            None => simple.to_string(),
        };

        let header_end = code[body_start..]
            .find('{')
            .map_or(code.len(), |i| body_start + i);
        let header = self.strip_generics(&code[body_start..header_end]);

        let is_interface = keyword.starts_with('@') || keyword == "interface";
        let extends = clause(&header, "extends", &["implements", "permits"]);
        let implements = clause(&header, "implements", &["permits"]);

        let mut result = ParseResult {
            name: Some(qualified.clone()),
            ..ParseResult::default()
        };

        if is_interface {
            // An interface "extends" other interfaces.
            for name in extends.into_iter().chain(implements) {
                push_unique(&mut result.implements, names.qualify(&name));
            }
        } else {
            result.superclass = extends.into_iter().next().map(|n| names.qualify(&n));
            for name in implements {
                push_unique(&mut result.implements, names.qualify(&name));
            }
        }

        result.role = Some(role_of(keyword, modifiers, result.superclass.as_deref(), &code));

        let mut excluded: HashSet<&str> = HashSet::new();
        excluded.insert(qualified.as_str());
        excluded.insert(simple);
        if let Some(sup) = &result.superclass {
            excluded.insert(sup.as_str());
        }
        for i in &result.implements {
            excluded.insert(i.as_str());
        }

        let mut used = Vec::new();
        for token in self.identifier.find_iter(&code) {
            let Some(name) = names.lookup(&squeeze(token.as_str())) else {
                continue;
            };
            if !excluded.contains(name) {
                push_unique(&mut used, name.to_string());
            }
        }
        result.used = used;

        debug!(
            path = %path.display(),
            name = %qualified,
            superclass = ?result.superclass,
            implements = result.implements.len(),
            used = result.used.len(),
            "source scanned"
        );
        Ok(result)
    }

    fn strip_generics(&self, header: &str) -> String {
        let mut out = header.to_string();
        loop {
            let next = self.generics.replace_all(&out, " ").into_owned();
            if next == out {
                return out;
            }
            out = next;
        }
    }
}

impl SourceParser for JavaSourceScanner {
    fn parse(&self, source: &Path, known: &[String]) -> Result<ParseResult> {
        let text = self
            .fs
            .read_to_string(source)
            .map_err(|e| IncbuildError::ParseFailed {
                path: source.to_path_buf(),
                reason: format!("{e:#}"),
            })?;
        self.scan_text(source, &text, known)
    }
}

/// Lookup of project names by qualified and by unique simple name.
struct KnownNames<'a> {
    qualified: HashSet<&'a str>,
    by_simple: HashMap<&'a str, Option<&'a str>>,
}

impl<'a> KnownNames<'a> {
    fn new(known: &'a [String]) -> Self {
        let mut qualified = HashSet::new();
        let mut by_simple: HashMap<&str, Option<&str>> = HashMap::new();
        for name in known {
            qualified.insert(name.as_str());
            let simple = name.rsplit('.').next().unwrap_or(name);
            by_simple
                .entry(simple)
                .and_modify(|slot| *slot = None)
                .or_insert(Some(name.as_str()));
        }
        Self {
            qualified,
            by_simple,
        }
    }

    /// Resolve a dotted token from the source (`Foo`, `pkg.Foo`,
    /// `Foo.bar`, `pkg.Foo.CONST`) to a known qualified name.
    fn lookup(&self, token: &str) -> Option<&'a str> {
        let segments: Vec<&str> = token.split('.').collect();
        for end in (1..=segments.len()).rev() {
            let prefix = segments[..end].join(".");
            if let Some(hit) = self.qualified.get(prefix.as_str()) {
                return Some(*hit);
            }
        }
        let first = segments.first()?;
        if first.starts_with(|c: char| c.is_ascii_uppercase()) {
            return self.by_simple.get(first).copied().flatten();
        }
        None
    }

    /// Qualified name if known, the name as written otherwise.
    fn qualify(&self, name: &str) -> String {
        self.lookup(name)
            .map(str::to_string)
            .unwrap_or_else(|| name.to_string())
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| IncbuildError::Other(anyhow::anyhow!("invalid scanner pattern: {e}")))
}

fn squeeze(s: &str) -> String {
    s.split_whitespace().collect()
}

/// Comma-separated names following `keyword` in a declaration header, up to
/// the first of `terminators`.
fn clause(header: &str, keyword: &str, terminators: &[&str]) -> Vec<String> {
    let words: Vec<&str> = header
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect();
    let Some(start) = words.iter().position(|w| *w == keyword) else {
        return Vec::new();
    };
    words[start + 1..]
        .iter()
        .take_while(|w| !terminators.contains(*w))
        .filter(|w| !w.starts_with('@') && !w.starts_with('('))
        .map(|w| w.trim_matches(|c: char| c == '(' || c == ')').to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

fn role_of(keyword: &str, modifiers: &str, superclass: Option<&str>, code: &str) -> UnitRole {
    if keyword.starts_with('@') || keyword == "interface" {
        return UnitRole::Interface;
    }
    if keyword == "enum" {
        return UnitRole::Enum;
    }
    let extends_test_base = superclass.is_some_and(|s| TEST_BASE_CLASSES.contains(&s));
    if extends_test_base || code.contains("@Test") {
        return UnitRole::UnitTest;
    }
    if modifiers.split_whitespace().any(|m| m == "abstract") {
        return UnitRole::Abstract;
    }
    UnitRole::Standard
}

fn push_unique(list: &mut Vec<String>, name: String) {
    if !list.contains(&name) {
        list.push(name);
    }
}
