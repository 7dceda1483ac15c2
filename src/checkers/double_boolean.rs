//! `x || x`, `x & x` and friends: the same variable on both sides of a
//! logical or bitwise operator is almost always a typo for another name.

use super::walk::walk_exprs;
use super::{CodeBody, SyntacticChecker};
use crate::ast::{Expr, ExprKind};
use crate::diagnostics::{BugType, Diagnostic, DiagnosticSink};
use crate::engine::AnalysisManager;

pub const NAME: &str = "logic.DoubleBooleanArgument";

pub const REPEATED_OPERAND: BugType = BugType {
    title: "Repeated operand in boolean expression",
    category: "API error",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleBooleanArgumentChecker;

fn strip_casts(mut expr: &Expr) -> &Expr {
    while let ExprKind::Cast { inner, .. } = &expr.kind {
        expr = inner;
    }
    expr
}

/// Name of the variable repeated by `expr`, if it is such an operator.
pub fn repeated_variable(expr: &Expr) -> Option<&str> {
    let ExprKind::Binary { op, lhs, rhs } = &expr.kind else {
        return None;
    };
    if !op.is_logical() && !op.is_bitwise() {
        return None;
    }
    match (&strip_casts(lhs).kind, &strip_casts(rhs).kind) {
        (ExprKind::Var { name: left, .. }, ExprKind::Var { name: right, .. }) if left == right => {
            Some(left.as_str())
        }
        _ => None,
    }
}

impl SyntacticChecker for DoubleBooleanArgumentChecker {
    fn name(&self) -> &'static str {
        NAME
    }

    fn check_ast_code_body(
        &self,
        body: &CodeBody<'_>,
        manager: &AnalysisManager<'_>,
        sink: &mut dyn DiagnosticSink,
    ) {
        walk_exprs(body.body, &mut |expr| {
            if let Some(name) = repeated_variable(expr) {
                sink.emit(Diagnostic::at_declaration(
                    NAME,
                    &REPEATED_OPERAND,
                    manager.file(),
                    body.decl_name(),
                    expr.range,
                    format!("Boolean expression contains argument {name} more than once."),
                ));
            }
        });
    }
}
