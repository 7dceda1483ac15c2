//! `if ([x respondsToSelector:@selector(a)]) { [x b]; }` where `b` is not
//! `a` and `x`'s class does not declare `b`: usually one of the two names is
//! misspelled.

use super::walk::walk_stmts;
use super::{CodeBody, SyntacticChecker};
use crate::ast::{ClassScope, Expr, ExprKind, MessageExpr, Stmt};
use crate::diagnostics::{BugType, Diagnostic, DiagnosticSink};
use crate::engine::AnalysisManager;

pub const NAME: &str = "semantic.SuspiciousRespondsToSelector";

pub const SUSPICIOUS_SELECTOR: BugType = BugType {
    title: "Suspicious use of respondsToSelector",
    category: "Semantic issue",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SuspiciousRespondsToSelectorChecker;

/// The checked receiver and selector of a `respondsToSelector:` condition.
struct Guard<'a> {
    receiver: &'a str,
    selector: &'a str,
}

fn var_name(expr: &Expr) -> Option<&str> {
    match &expr.ignore_parens_and_casts().kind {
        ExprKind::Var { name, .. } => Some(name.as_str()),
        _ => None,
    }
}

fn selector_literal(expr: Option<&Expr>) -> Option<&str> {
    match &expr?.ignore_parens_and_casts().kind {
        ExprKind::SelectorLiteral { selector } => Some(selector.as_str()),
        _ => None,
    }
}

fn match_guard(cond: &Expr) -> Option<Guard<'_>> {
    let message = cond.ignore_parens_and_casts().as_message()?;
    if message.selector != "respondsToSelector:" {
        return None;
    }
    Some(Guard {
        receiver: var_name(message.instance_receiver()?)?,
        selector: selector_literal(message.arg(0))?,
    })
}

/// `[x performSelector:@selector(b) ...]` uses `b`.
pub fn normalized_selector(message: &MessageExpr) -> &str {
    let first_piece = message.selector.split(':').next();
    if first_piece == Some("performSelector") {
        if let Some(selector) = selector_literal(message.arg(0)) {
            return selector;
        }
    }
    &message.selector
}

/// First message sent to `receiver` within one top-level statement of the
/// guarded branch, looking only through calls, operators, returns and
/// initializers.
fn first_use_in_stmt<'a>(stmt: &'a Stmt, receiver: &str) -> Option<&'a Expr> {
    match stmt {
        Stmt::Expr { expr } => first_use_in_expr(expr, receiver),
        Stmt::Return { value: Some(value) } => first_use_in_expr(value, receiver),
        Stmt::Decl { decl } => decl
            .init
            .as_ref()
            .and_then(|init| first_use_in_expr(init, receiver)),
        _ => None,
    }
}

fn first_use_in_expr<'a>(expr: &'a Expr, receiver: &str) -> Option<&'a Expr> {
    let expr = expr.ignore_parens_and_casts();
    match &expr.kind {
        ExprKind::Message(message) => message
            .instance_receiver()
            .and_then(var_name)
            .filter(|name| *name == receiver)
            .map(|_| expr),
        ExprKind::Call { args, .. } => args.iter().find_map(|arg| first_use_in_expr(arg, receiver)),
        ExprKind::Unary { operand, .. } => first_use_in_expr(operand, receiver),
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Assign { lhs, rhs } => {
            first_use_in_expr(lhs, receiver).or_else(|| first_use_in_expr(rhs, receiver))
        }
        _ => None,
    }
}

/// Selector used where it was not checked and is not known to exist.
fn suspicious_use<'a>(
    scope: ClassScope<'_>,
    guard: &Guard<'_>,
    then: &'a Stmt,
) -> Option<(&'a Expr, &'a str)> {
    let top_level: Vec<&Stmt> = match then {
        Stmt::Block { stmts } => stmts.iter().collect(),
        other => vec![other],
    };
    let used = top_level
        .into_iter()
        .find_map(|stmt| first_use_in_stmt(stmt, guard.receiver))?;
    let message = used.as_message()?;
    let selector = normalized_selector(message);
    if selector == guard.selector {
        return None;
    }
    let declared = message
        .instance_receiver()
        .and_then(|receiver| scope.static_type(receiver))
        .and_then(|ty| ty.class_name().map(str::to_string))
        .is_some_and(|class| scope.index.declares_instance_method(&class, selector));
    (!declared).then_some((used, selector))
}

impl SyntacticChecker for SuspiciousRespondsToSelectorChecker {
    fn name(&self) -> &'static str {
        NAME
    }

    fn check_ast_code_body(
        &self,
        body: &CodeBody<'_>,
        manager: &AnalysisManager<'_>,
        sink: &mut dyn DiagnosticSink,
    ) {
        let scope = manager.scope(body.class);
        walk_stmts(body.body, &mut |stmt| {
            let Stmt::If { cond, then, .. } = stmt else {
                return;
            };
            let Some(guard) = match_guard(cond) else {
                return;
            };
            if let Some((used, selector)) = suspicious_use(scope, &guard, then) {
                sink.emit(Diagnostic::at_declaration(
                    NAME,
                    &SUSPICIOUS_SELECTOR,
                    manager.file(),
                    body.decl_name(),
                    used.range,
                    format!(
                        "Suspicious use of respondsToSelector. A condition checks if {} responds \
                         to selector {} and subsequently selector {} is used. The selector name \
                         might have been misspelled.",
                        guard.receiver, guard.selector, selector
                    ),
                ));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclIndex, TypeRef};
    use crate::config::AnalysisSettings;
    use crate::testkit::{fixtures, helpers::*};

    fn check(then: crate::ast::Stmt, receiver: crate::ast::Expr) -> Vec<Diagnostic> {
        let guard = msg(receiver, "respondsToSelector:", vec![selector("didFinish:")]);
        let tu = fixtures::delegate_pair(vec![method("notify", vec![if_(guard, then, None)])]);
        let index = DeclIndex::new(&tu);
        let manager = AnalysisManager::new(&index, &AnalysisSettings::default());
        let method = &tu.implementations[0].methods[0];
        let code = CodeBody {
            class: "Foo",
            method,
            body: method.body.as_ref().unwrap(),
        };
        let mut sink: Vec<Diagnostic> = Vec::new();
        SuspiciousRespondsToSelectorChecker.check_ast_code_body(&code, &manager, &mut sink);
        sink
    }

    #[test]
    fn test_misspelled_selector_is_reported() {
        let then = block(vec![stmt(msg(var("d"), "didFinsh:", vec![self_ref()]))]);
        let found = check(then, var("d"));
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains(
            "checks if d responds to selector didFinish: and subsequently selector didFinsh: is used"
        ));
        assert_eq!(found[0].context, crate::diagnostics::ReportContext::Declaration {
            decl: "-[Foo notify]".into()
        });
    }

    #[test]
    fn test_same_selector_passes_including_perform_selector() {
        let direct = stmt(msg(var("d"), "didFinish:", vec![self_ref()]));
        assert!(check(direct, var("d")).is_empty());

        let performed = stmt(msg(
            var("d"),
            "performSelector:withObject:",
            vec![selector("didFinish:"), self_ref()],
        ));
        assert!(check(performed, var("d")).is_empty());
    }

    #[test]
    fn test_declared_selector_passes() {
        let then = stmt(msg(typed_var("d", TypeRef::object("Bar")), "setDelegate:", vec![nil()]));
        assert!(check(then, typed_var("d", TypeRef::object("Bar"))).is_empty());
    }

    #[test]
    fn test_use_nested_in_return_and_call_is_found() {
        let then = block(vec![
            stmt(call("NSLog", vec![var("fmt")])),
            ret(Some(not(call("check", vec![msg(var("d"), "didFinishh:", vec![])])))),
        ]);
        assert_eq!(check(then, var("d")).len(), 1);
    }

    #[test]
    fn test_only_first_use_is_considered() {
        let then = block(vec![
            stmt(msg(var("d"), "didFinish:", vec![self_ref()])),
            stmt(msg(var("d"), "somethingElse", vec![])),
        ]);
        assert!(check(then, var("d")).is_empty());
    }

    #[test]
    fn test_other_receivers_and_nested_blocks_are_ignored() {
        let other = stmt(msg(var("e"), "didFinsh:", vec![]));
        assert!(check(other, var("d")).is_empty());

        let nested = if_(var("ready"), stmt(msg(var("d"), "didFinsh:", vec![])), None);
        assert!(check(nested, var("d")).is_empty());

        let field_receiver = stmt(msg(field("_bar"), "didFinsh:", vec![]));
        assert!(check(field_receiver, field("_bar")).is_empty());
    }
}
