//! Pre-order traversal over method bodies.

use crate::ast::{Expr, Stmt, VarDecl};

/// Calls `visit` on `stmt` and every statement nested in it.
pub fn walk_stmts<'a>(stmt: &'a Stmt, visit: &mut dyn FnMut(&'a Stmt)) {
    visit(stmt);
    for child in stmt.child_stmts() {
        walk_stmts(child, visit);
    }
}

/// Calls `visit` on every expression of `expr`, parents before children.
pub fn walk_expr<'a>(expr: &'a Expr, visit: &mut dyn FnMut(&'a Expr)) {
    visit(expr);
    for child in expr.children() {
        walk_expr(child, visit);
    }
}

/// Calls `visit` on every expression anywhere in `stmt`.
pub fn walk_exprs<'a>(stmt: &'a Stmt, visit: &mut dyn FnMut(&'a Expr)) {
    walk_stmts(stmt, &mut |stmt| {
        for expr in stmt.child_exprs() {
            walk_expr(expr, visit);
        }
    });
}

/// Variables declared anywhere in `stmt`.
pub fn local_decls(stmt: &Stmt) -> Vec<&VarDecl> {
    let mut decls = Vec::new();
    walk_stmts(stmt, &mut |stmt| {
        if let Stmt::Decl { decl } = stmt {
            decls.push(decl);
        }
    });
    decls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, TypeRef};
    use crate::testkit::helpers::*;

    #[test]
    fn test_walk_exprs_reaches_nested_branches_and_arguments() {
        let body = block(vec![
            local("x", TypeRef::Id, Some(msg(var("a"), "b", vec![]))),
            if_(
                var("c"),
                stmt(msg(self_ref(), "d:", vec![msg(var("e"), "f", vec![])])),
                Some(while_(var("g"), ret(Some(nil())))),
            ),
        ]);
        let mut selectors = Vec::new();
        walk_exprs(&body, &mut |expr| {
            if let ExprKind::Message(message) = &expr.kind {
                selectors.push(message.selector.clone());
            }
        });
        assert_eq!(selectors, vec!["b", "d:", "f"]);
    }

    #[test]
    fn test_local_decls_finds_nested_declarations() {
        let body = block(vec![if_(
            var("c"),
            block(vec![local("once", TypeRef::scalar("dispatch_once_t"), None)]),
            None,
        )]);
        let names: Vec<_> = local_decls(&body).into_iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["once"]);
    }
}
