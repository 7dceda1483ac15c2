//! Checker registry.
//!
//! Every checker has a dotted name (`memory.DanglingDelegate`) used in the
//! configuration file and on the command line. Syntactic checkers see each
//! method body and declaration once; the path-sensitive dangling delegate
//! checker is driven by the reference engine.

pub mod dangling_delegate;
pub mod dispatch_once;
pub mod double_boolean;
pub mod responds_to_selector;
pub mod walk;

use crate::ast::{
    DeclIndex, FieldDecl, MethodDecl, MethodKind, PropertyDecl, SourceRange, Stmt,
    TranslationUnit, TypeRef, VarDecl,
};
use crate::config::{AnalysisSettings, AnalyzerConfig};
use crate::diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticSink};
use crate::engine::{run_path_checker, AnalysisManager, ExplorationStats};
use serde::Serialize;
use tracing::{debug, debug_span};

pub use dangling_delegate::DanglingDelegateChecker;
pub use dispatch_once::DispatchOnceStorageChecker;
pub use double_boolean::DoubleBooleanArgumentChecker;
pub use responds_to_selector::SuspiciousRespondsToSelectorChecker;

/// Name and one-line description of a registered checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckerInfo {
    pub name: &'static str,
    pub description: &'static str,
}

pub const AVAILABLE: &[CheckerInfo] = &[
    CheckerInfo {
        name: dangling_delegate::NAME,
        description: "Non-owning references to self left behind when a field's object is released",
    },
    CheckerInfo {
        name: double_boolean::NAME,
        description: "Boolean expressions repeating the same variable, e.g. x || x",
    },
    CheckerInfo {
        name: dispatch_once::NAME,
        description: "dispatch_once_t predicates without static storage",
    },
    CheckerInfo {
        name: responds_to_selector::NAME,
        description: "respondsToSelector: checks guarding a possibly misspelled selector",
    },
];

/// A method body handed to syntactic checkers.
#[derive(Debug, Clone, Copy)]
pub struct CodeBody<'a> {
    pub class: &'a str,
    pub method: &'a MethodDecl,
    pub body: &'a Stmt,
}

impl CodeBody<'_> {
    /// `-[Class selector]` / `+[Class selector]`
    pub fn decl_name(&self) -> String {
        let sigil = match self.method.kind {
            MethodKind::Instance => '-',
            MethodKind::Class => '+',
        };
        format!("{sigil}[{} {}]", self.class, self.method.selector)
    }
}

/// A declaration handed to syntactic checkers.
#[derive(Debug, Clone, Copy)]
pub enum DeclRef<'a> {
    /// Global, static or local variable.
    Var(&'a VarDecl),
    Field { class: &'a str, decl: &'a FieldDecl },
    Property { class: &'a str, decl: &'a PropertyDecl },
}

impl DeclRef<'_> {
    pub fn ty(&self) -> &TypeRef {
        match self {
            DeclRef::Var(decl) => &decl.ty,
            DeclRef::Field { decl, .. } => &decl.ty,
            DeclRef::Property { decl, .. } => &decl.ty,
        }
    }

    pub fn range(&self) -> SourceRange {
        match self {
            DeclRef::Var(decl) => decl.range,
            DeclRef::Field { decl, .. } => decl.range,
            DeclRef::Property { decl, .. } => decl.range,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            DeclRef::Var(decl) => decl.name.clone(),
            DeclRef::Field { class, decl } => format!("{class}.{}", decl.name),
            DeclRef::Property { class, decl } => format!("{class}.{}", decl.name),
        }
    }
}

/// A checker that needs no path exploration.
pub trait SyntacticChecker {
    fn name(&self) -> &'static str;

    /// Called once per method body.
    fn check_ast_code_body(
        &self,
        _body: &CodeBody<'_>,
        _manager: &AnalysisManager<'_>,
        _sink: &mut dyn DiagnosticSink,
    ) {
    }

    /// Called once per field, property and variable declaration.
    fn check_ast_decl(
        &self,
        _decl: DeclRef<'_>,
        _manager: &AnalysisManager<'_>,
        _sink: &mut dyn DiagnosticSink,
    ) {
    }
}

/// Findings for one translation unit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSummary {
    pub file: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Reports dropped as equivalent to one already kept.
    pub duplicates: usize,
    pub exploration: ExplorationStats,
}

/// The enabled checkers, ready to run over translation units.
pub struct CheckerRegistry {
    settings: AnalysisSettings,
    dangling_delegate: Option<DanglingDelegateChecker>,
    syntactic: Vec<Box<dyn SyntacticChecker>>,
}

impl CheckerRegistry {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let enablement = config.checkers();
        let dangling_delegate = enablement
            .is_enabled(dangling_delegate::NAME)
            .then(|| DanglingDelegateChecker::new(config.dangling_delegate()));

        let candidates: Vec<Box<dyn SyntacticChecker>> = vec![
            Box::new(DoubleBooleanArgumentChecker),
            Box::new(DispatchOnceStorageChecker),
            Box::new(SuspiciousRespondsToSelectorChecker),
        ];
        let syntactic = candidates
            .into_iter()
            .filter(|checker| enablement.is_enabled(checker.name()))
            .collect();

        Self {
            settings: config.analysis(),
            dangling_delegate,
            syntactic,
        }
    }

    pub fn is_known(name: &str) -> bool {
        AVAILABLE.iter().any(|info| info.name == name)
    }

    pub fn available() -> &'static [CheckerInfo] {
        AVAILABLE
    }

    pub fn enabled_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.syntactic.iter().map(|c| c.name()).collect();
        if self.dangling_delegate.is_some() {
            names.insert(0, dangling_delegate::NAME);
        }
        names
    }

    pub fn run(&self, tu: &TranslationUnit) -> AnalysisSummary {
        let _span = debug_span!("analyze", file = %tu.path).entered();
        let mut collector = DiagnosticCollector::new();
        let mut exploration = ExplorationStats::default();

        if let Some(checker) = &self.dangling_delegate {
            exploration += run_path_checker(checker, tu, &self.settings, &mut collector);
        }

        if !self.syntactic.is_empty() {
            let index = DeclIndex::new(tu);
            let manager = AnalysisManager::new(&index, &self.settings);
            for checker in &self.syntactic {
                let _span = debug_span!("syntactic", checker = checker.name()).entered();
                run_syntactic(checker.as_ref(), tu, &manager, &mut collector);
            }
        }

        debug!(
            file = %tu.path,
            findings = collector.len(),
            duplicates = collector.duplicates(),
            paths = exploration.paths_completed,
            "translation unit analyzed"
        );
        let duplicates = collector.duplicates();
        AnalysisSummary {
            file: tu.path.clone(),
            diagnostics: collector.into_diagnostics(),
            duplicates,
            exploration,
        }
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

/// Hands every declaration and method body of `tu` to `checker`.
fn run_syntactic(
    checker: &dyn SyntacticChecker,
    tu: &TranslationUnit,
    manager: &AnalysisManager<'_>,
    sink: &mut dyn DiagnosticSink,
) {
    for global in &tu.globals {
        checker.check_ast_decl(DeclRef::Var(global), manager, sink);
    }
    for interface in &tu.interfaces {
        let class = interface.name.as_str();
        for decl in &interface.fields {
            checker.check_ast_decl(DeclRef::Field { class, decl }, manager, sink);
        }
        for decl in &interface.properties {
            checker.check_ast_decl(DeclRef::Property { class, decl }, manager, sink);
        }
    }
    for implementation in &tu.implementations {
        let class = implementation.name.as_str();
        for decl in &implementation.fields {
            checker.check_ast_decl(DeclRef::Field { class, decl }, manager, sink);
        }
        for method in &implementation.methods {
            let Some(body) = &method.body else {
                continue;
            };
            for local in walk::local_decls(body) {
                checker.check_ast_decl(DeclRef::Var(local), manager, sink);
            }
            let code = CodeBody {
                class,
                method,
                body,
            };
            checker.check_ast_code_body(&code, manager, sink);
        }
    }
}
