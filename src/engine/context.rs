use super::store::{is_known_null, MemLocation, SVal, Store};
use crate::ast::{
    ClassScope, DeclIndex, Expr, LangOptions, MessageExpr, MethodDecl, SourceRange,
};
use crate::config::AnalysisSettings;
use crate::diagnostics::{Diagnostic, ReportContext};

/// Read-only data shared by every callback of one translation unit.
#[derive(Debug)]
pub struct AnalysisManager<'a> {
    index: &'a DeclIndex<'a>,
    lang: LangOptions,
    settings: AnalysisSettings,
}

impl<'a> AnalysisManager<'a> {
    /// Language options come from the translation unit unless the settings
    /// override them.
    pub fn new(index: &'a DeclIndex<'a>, settings: &AnalysisSettings) -> Self {
        let mut lang = index.translation_unit().lang;
        if let Some(auto_release) = settings.auto_release_fields {
            lang.auto_release_fields = auto_release;
        }
        Self {
            index,
            lang,
            settings: settings.clone(),
        }
    }

    pub fn index(&self) -> &'a DeclIndex<'a> {
        self.index
    }

    pub fn lang(&self) -> LangOptions {
        self.lang
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn file(&self) -> &'a str {
        &self.index.translation_unit().path
    }

    pub fn scope<'s>(&'s self, class: &'s str) -> ClassScope<'s> {
        ClassScope::new(self.index, class)
    }
}

/// A message send as seen after evaluation of its receiver and arguments.
#[derive(Debug, Clone)]
pub struct CallEvent<'a> {
    pub expr: &'a Expr,
    pub message: &'a MessageExpr,
    /// `NonNull` for `super` and class receivers.
    pub receiver: SVal,
    pub args: Vec<SVal>,
    /// Implementation the call dispatches to, when the translation unit has
    /// one for the receiver's static class.
    pub runtime_definition: Option<&'a MethodDecl>,
}

impl CallEvent<'_> {
    pub fn selector(&self) -> &str {
        &self.message.selector
    }

    pub fn arg_sval(&self, index: usize) -> SVal {
        self.args.get(index).copied().unwrap_or(SVal::Unknown)
    }

    /// Whether the analyzer can see an explicit body for the callee.
    pub fn has_known_body(&self) -> bool {
        self.runtime_definition
            .is_some_and(|method| !method.implicit && method.body.is_some())
    }
}

/// Per-callback view of the current path.
///
/// Reports filed here are forwarded to the diagnostic sink by the explorer
/// once the callback returns.
pub struct CheckerContext<'a, S> {
    manager: &'a AnalysisManager<'a>,
    class: &'a str,
    method: &'a MethodDecl,
    checker: &'static str,
    path: usize,
    store: &'a Store,
    state: S,
    reports: Vec<Diagnostic>,
}

impl<'a, S> CheckerContext<'a, S> {
    pub fn new(
        manager: &'a AnalysisManager<'a>,
        class: &'a str,
        method: &'a MethodDecl,
        checker: &'static str,
        path: usize,
        store: &'a Store,
        state: S,
    ) -> Self {
        Self {
            manager,
            class,
            method,
            checker,
            path,
            store,
            state,
            reports: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn set_state(&mut self, state: S) {
        self.state = state;
    }

    pub fn manager(&self) -> &'a AnalysisManager<'a> {
        self.manager
    }

    pub fn index(&self) -> &'a DeclIndex<'a> {
        self.manager.index()
    }

    pub fn lang(&self) -> LangOptions {
        self.manager.lang()
    }

    pub fn scope(&self) -> ClassScope<'a> {
        ClassScope::new(self.manager.index(), self.class)
    }

    /// Class whose method is the top frame of this path.
    pub fn class_name(&self) -> &'a str {
        self.class
    }

    pub fn method(&self) -> &'a MethodDecl {
        self.method
    }

    pub fn path_id(&self) -> usize {
        self.path
    }

    pub fn sval_of(&self, expr: &Expr) -> SVal {
        self.store.value_of(expr)
    }

    /// Value the path holds for a field of `self`.
    pub fn field_sval(&self, field: &str) -> SVal {
        self.store.lookup(&MemLocation::Field(field.to_string()))
    }

    pub fn is_known_null(&self, expr: &Expr) -> bool {
        is_known_null(self.sval_of(expr))
    }

    pub fn emit_report(
        &mut self,
        title: impl Into<String>,
        category: impl Into<String>,
        message: impl Into<String>,
        range: SourceRange,
    ) {
        self.reports.push(Diagnostic {
            checker: self.checker.to_string(),
            title: title.into(),
            category: category.into(),
            message: message.into(),
            file: self.manager.file().to_string(),
            range,
            context: ReportContext::Path {
                class: self.class.to_string(),
                method: self.method.selector.clone(),
                path: self.path,
            },
        });
    }

    pub fn into_parts(self) -> (S, Vec<Diagnostic>) {
        (self.state, self.reports)
    }
}
