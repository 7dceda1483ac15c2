//! Findings produced by the checkers and the sinks that receive them.

pub mod output;

use crate::ast::SourceRange;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub use output::{create_writer, DiagnosticWriter, OutputFormat};

/// Where a finding was established.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportContext {
    /// Found by a declaration or code-body scan, without a path.
    Declaration { decl: String },
    /// Found at some point along an explored execution path.
    Path {
        class: String,
        method: String,
        path: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub checker: String,
    pub title: String,
    pub category: String,
    pub message: String,
    pub file: String,
    pub range: SourceRange,
    pub context: ReportContext,
}

impl ReportContext {
    /// The same context with the path id zeroed, so reports found on
    /// different paths through one method compare equal.
    pub fn without_path(&self) -> Self {
        match self {
            Self::Declaration { decl } => Self::Declaration { decl: decl.clone() },
            Self::Path { class, method, .. } => Self::Path {
                class: class.clone(),
                method: method.clone(),
                path: 0,
            },
        }
    }
}

/// Title and category shared by every report of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BugType {
    pub title: &'static str,
    pub category: &'static str,
}

impl Diagnostic {
    /// A finding attached to a declaration rather than to a path.
    pub fn at_declaration(
        checker: &str,
        bug: &BugType,
        file: &str,
        decl: impl Into<String>,
        range: SourceRange,
        message: impl Into<String>,
    ) -> Self {
        Self {
            checker: checker.to_string(),
            title: bug.title.to_string(),
            category: bug.category.to_string(),
            message: message.into(),
            file: file.to_string(),
            range,
            context: ReportContext::Declaration { decl: decl.into() },
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]: {}",
            self.file, self.range.begin, self.title, self.checker, self.message
        )
    }
}

/// Receives findings. Filing a report never fails.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

type CoalesceKey = (String, SourceRange, String, ReportContext);

/// Collects findings, coalescing reports that only differ by the path they
/// were found on.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<CoalesceKey>,
    duplicates: usize,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Reports dropped as equivalent to an earlier one.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let key = (
            diagnostic.checker.clone(),
            diagnostic.range,
            diagnostic.message.clone(),
            diagnostic.context.without_path(),
        );
        if self.seen.insert(key) {
            self.diagnostics.push(diagnostic);
        } else {
            self.duplicates += 1;
        }
    }
}
