//! Side-effect free recognizers for the syntactic shapes the checker cares
//! about. None of them looks at path-sensitive information except
//! [`is_statically_null`], which only reads what the path already proved.

use super::facts::FieldId;
use crate::ast::{ClassScope, Expr, ExprKind, MessageExpr, PropertyDecl, Receiver};
use crate::config::SingletonAccessor;
use crate::engine::{is_known_null, SVal};

/// `[receiver setX:value]` where `x` is a property of the receiver's class.
pub fn match_property_setter_call<'a>(
    scope: ClassScope<'a>,
    message: &MessageExpr,
) -> Option<&'a PropertyDecl> {
    scope.resolve_setter(message)
}

/// `[receiver x]` where `x` is a property of the receiver's class.
pub fn match_property_getter_call<'a>(
    scope: ClassScope<'a>,
    message: &MessageExpr,
) -> Option<&'a PropertyDecl> {
    scope.resolve_getter(message)
}

/// `_x` or `self.x` where `x` is backed by the field `_x`.
pub fn match_field_lvalue(scope: ClassScope<'_>, expr: &Expr) -> Option<FieldId> {
    match &expr.ignore_parens_and_casts().kind {
        ExprKind::FieldRef { field } => Some(FieldId::new(field.as_str())),
        ExprKind::Message(message) => {
            let receiver = message.instance_receiver()?;
            if !is_self_reference(receiver) {
                return None;
            }
            let property = match_property_getter_call(scope, message)?;
            property.backing_field.as_deref().map(FieldId::new)
        }
        _ => None,
    }
}

pub fn is_self_reference(expr: &Expr) -> bool {
    matches!(expr.ignore_parens_and_casts().kind, ExprKind::SelfRef)
}

pub fn first_argument_is_self(message: &MessageExpr) -> bool {
    message.arg(0).is_some_and(is_self_reference)
}

/// `[NSNotificationCenter defaultCenter]` and the other configured shared
/// instance accessors, rendered as `+[Class selector]`.
pub fn match_known_singleton_accessor(
    expr: &Expr,
    accessors: &[SingletonAccessor],
) -> Option<String> {
    let message = expr.ignore_parens_and_casts().as_message()?;
    let Receiver::Class { name } = &message.receiver else {
        return None;
    };
    accessors
        .iter()
        .find(|accessor| &accessor.class == name && accessor.selector == message.selector)
        .map(|accessor| format!("+[{} {}]", accessor.class, accessor.selector))
}

/// Whether the path has proved `value` null. "Maybe null" answers no.
pub fn is_statically_null(value: SVal) -> bool {
    is_known_null(value)
}

/// `[x getter] op self` / `self op [x getter]`: the non-self operand.
pub fn other_operand_of_self<'e>(lhs: &'e Expr, rhs: &'e Expr) -> Option<&'e Expr> {
    if is_self_reference(rhs) {
        Some(lhs)
    } else if is_self_reference(lhs) {
        Some(rhs)
    } else {
        None
    }
}

/// `x == nil` / `nil == x`: the non-null operand.
pub fn other_operand_of_null<'e>(lhs: &'e Expr, rhs: &'e Expr) -> Option<&'e Expr> {
    if rhs.is_null_literal() {
        Some(lhs)
    } else if lhs.is_null_literal() {
        Some(rhs)
    } else {
        None
    }
}
