//! `dispatch_once` needs a predicate that lives as long as the process.

use super::{DeclRef, SyntacticChecker};
use crate::ast::TypeRef;
use crate::diagnostics::{BugType, Diagnostic, DiagnosticSink};
use crate::engine::AnalysisManager;

pub const NAME: &str = "semantic.DispatchOnceStorage";

pub const NON_STATIC_PREDICATE: BugType = BugType {
    title: "Non-Global/Static variable for dispatch_once_t",
    category: "Semantic error",
};

const MESSAGE: &str = "Using an instance variable or local variable as the predicate passed to \
                       dispatch_once/dispatch_once_f causes undefined behavior. Please use a \
                       statically allocated dispatch_once_t instead";

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOnceStorageChecker;

fn is_dispatch_once_predicate(ty: &TypeRef) -> bool {
    ty.spelling() == "dispatch_once_t"
}

/// Fields and properties never have static storage.
fn lacks_static_storage(decl: &DeclRef<'_>) -> bool {
    match decl {
        DeclRef::Var(var) => !var.has_static_storage(),
        DeclRef::Field { .. } | DeclRef::Property { .. } => true,
    }
}

impl SyntacticChecker for DispatchOnceStorageChecker {
    fn name(&self) -> &'static str {
        NAME
    }

    fn check_ast_decl(
        &self,
        decl: DeclRef<'_>,
        manager: &AnalysisManager<'_>,
        sink: &mut dyn DiagnosticSink,
    ) {
        if is_dispatch_once_predicate(decl.ty()) && lacks_static_storage(&decl) {
            sink.emit(Diagnostic::at_declaration(
                NAME,
                &NON_STATIC_PREDICATE,
                manager.file(),
                decl.display_name(),
                decl.range(),
                MESSAGE,
            ));
        }
    }
}
