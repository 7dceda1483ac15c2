//! Builders for AST fragments.
//!
//! Front ends normally produce these trees; tests build them by hand with the
//! short functions below so that a method body reads close to its source:
//!
//! ```rust,ignore
//! use delegatecheck::testkit::helpers::*;
//!
//! // -(void)dealloc { self.bar.delegate = nil; }
//! let clear = stmt(setter(getter(self_ref(), "bar"), "delegate", nil()));
//! let dealloc = method("dealloc", vec![clear]);
//! ```

use crate::ast::{
    BinaryOp, Expr, ExprKind, MessageExpr, MethodDecl, MethodKind, Ownership, PropertyDecl,
    Receiver, SourceRange, StorageClass, Stmt, TypeRef, UnaryOp, VarDecl,
};

pub fn self_ref() -> Expr {
    Expr::new(ExprKind::SelfRef)
}

pub fn nil() -> Expr {
    Expr::new(ExprKind::Nil)
}

pub fn int(value: i64) -> Expr {
    Expr::new(ExprKind::IntLiteral { value })
}

/// Untyped reference to a local, parameter or global.
pub fn var(name: &str) -> Expr {
    Expr::new(ExprKind::Var {
        name: name.to_string(),
        ty: None,
    })
}

pub fn typed_var(name: &str, ty: TypeRef) -> Expr {
    Expr::new(ExprKind::Var {
        name: name.to_string(),
        ty: Some(ty),
    })
}

pub fn field(name: &str) -> Expr {
    Expr::new(ExprKind::FieldRef {
        field: name.to_string(),
    })
}

pub fn paren(inner: Expr) -> Expr {
    Expr::new(ExprKind::Paren {
        inner: Box::new(inner),
    })
}

pub fn cast(ty: TypeRef, inner: Expr) -> Expr {
    Expr::new(ExprKind::Cast {
        ty,
        inner: Box::new(inner),
    })
}

pub fn selector(name: &str) -> Expr {
    Expr::new(ExprKind::SelectorLiteral {
        selector: name.to_string(),
    })
}

pub fn call(callee: &str, args: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Call {
        callee: callee.to_string(),
        args,
    })
}

/// `[receiver selector:args...]`
pub fn msg(receiver: Expr, selector: &str, args: Vec<Expr>) -> Expr {
    message(
        Receiver::Instance {
            expr: Box::new(receiver),
        },
        selector,
        args,
    )
}

/// `[ClassName selector]`
pub fn class_msg(class: &str, selector: &str, args: Vec<Expr>) -> Expr {
    message(
        Receiver::Class {
            name: class.to_string(),
        },
        selector,
        args,
    )
}

/// `[super selector]`
pub fn super_msg(selector: &str, args: Vec<Expr>) -> Expr {
    message(Receiver::Super, selector, args)
}

fn message(receiver: Receiver, selector: &str, args: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Message(MessageExpr {
        receiver,
        selector: selector.to_string(),
        args,
    }))
}

/// `receiver.property`
pub fn getter(receiver: Expr, property: &str) -> Expr {
    msg(receiver, property, vec![])
}

/// `receiver.property = value`, already lowered to the setter send.
pub fn setter(receiver: Expr, property: &str, value: Expr) -> Expr {
    let mut chars = property.chars();
    let selector = match chars.next() {
        Some(first) => format!("set{}{}:", first.to_ascii_uppercase(), chars.as_str()),
        None => "set:".to_string(),
    };
    msg(receiver, &selector, vec![value])
}

pub fn assign(lhs: Expr, rhs: Expr) -> Expr {
    Expr::new(ExprKind::Assign {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::new(ExprKind::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinaryOp::Eq, lhs, rhs)
}

pub fn ne(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinaryOp::Ne, lhs, rhs)
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinaryOp::And, lhs, rhs)
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinaryOp::Or, lhs, rhs)
}

pub fn not(operand: Expr) -> Expr {
    Expr::new(ExprKind::Unary {
        op: UnaryOp::Not,
        operand: Box::new(operand),
    })
}

pub fn stmt(expr: Expr) -> Stmt {
    Stmt::expr(expr)
}

pub fn block(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Block { stmts }
}

pub fn if_(cond: Expr, then: Stmt, otherwise: Option<Stmt>) -> Stmt {
    Stmt::If {
        cond,
        then: Box::new(then),
        otherwise: otherwise.map(Box::new),
    }
}

pub fn while_(cond: Expr, body: Stmt) -> Stmt {
    Stmt::While {
        cond,
        body: Box::new(body),
    }
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return { value }
}

pub fn local(name: &str, ty: TypeRef, init: Option<Expr>) -> Stmt {
    Stmt::Decl {
        decl: var_decl(name, ty, StorageClass::Local, init),
    }
}

pub fn var_decl(name: &str, ty: TypeRef, storage: StorageClass, init: Option<Expr>) -> VarDecl {
    VarDecl {
        name: name.to_string(),
        ty,
        storage,
        init,
        range: SourceRange::default(),
    }
}

/// Instance method whose body is a block of `stmts`.
pub fn method(selector: &str, stmts: Vec<Stmt>) -> MethodDecl {
    MethodDecl {
        selector: selector.to_string(),
        kind: MethodKind::Instance,
        params: Vec::new(),
        body: Some(block(stmts)),
        implicit: false,
        range: SourceRange::default(),
    }
}

pub fn property(name: &str, ty: TypeRef, ownership: Ownership) -> PropertyDecl {
    PropertyDecl {
        name: name.to_string(),
        ty,
        ownership,
        backing_field: None,
        range: SourceRange::default(),
    }
}

/// Property synthesized with a backing field named `_<name>`.
pub fn backed_property(name: &str, ty: TypeRef, ownership: Ownership) -> PropertyDecl {
    PropertyDecl {
        backing_field: Some(format!("_{name}")),
        ..property(name, ty, ownership)
    }
}
