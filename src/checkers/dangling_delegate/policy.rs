//! The two deliberately unsound heuristics of the checker.
//!
//! Both trade missed findings for fewer false positives and can be switched
//! off in the `[dangling_delegate]` configuration section.

use super::facts::{ClassFacts, FieldId};
use super::matchers::{
    is_statically_null, match_field_lvalue, match_property_getter_call, other_operand_of_null,
    other_operand_of_self,
};
use crate::ast::{BinaryOp, ClassScope, Expr, ExprKind, UnaryOp};
use crate::engine::SVal;

/// What a branch condition lets the checker assume on the taken branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeBranch {
    /// The property no longer references `self`.
    PropertyCleared { field: FieldId, property: String },
    /// The field is empty, so none of its channels can dangle.
    FieldCleared(FieldId),
}

/// Recognizes guards such as `_x.delegate != self`, `_x.delegate == nil`,
/// `self.x == nil` or `!_x`, on the branch where the guard shows the hazard
/// is absent. The rest of the path is trusted to be safe.
pub fn assume_safe_branch(
    scope: ClassScope<'_>,
    facts: &ClassFacts,
    cond: &Expr,
    assumption: bool,
) -> Vec<SafeBranch> {
    let cond = cond.ignore_parens_and_casts();
    match &cond.kind {
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => assume_safe_branch(scope, facts, operand, !assumption),
        ExprKind::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } if assumption => both(scope, facts, lhs, rhs, true),
        ExprKind::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } if !assumption => both(scope, facts, lhs, rhs, false),
        ExprKind::Binary { op, lhs, rhs } if op.is_equality() => {
            let holds_equal = (*op == BinaryOp::Eq) == assumption;
            if holds_equal {
                other_operand_of_null(lhs, rhs)
                    .and_then(|operand| null_operand(scope, facts, operand))
                    .into_iter()
                    .collect()
            } else {
                other_operand_of_self(lhs, rhs)
                    .and_then(|operand| interesting_delegate(scope, facts, operand))
                    .into_iter()
                    .collect()
            }
        }
        // `if (x)` taken as false is `x == nil`
        _ if !assumption => null_operand(scope, facts, cond).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn both(
    scope: ClassScope<'_>,
    facts: &ClassFacts,
    lhs: &Expr,
    rhs: &Expr,
    assumption: bool,
) -> Vec<SafeBranch> {
    let mut outcomes = assume_safe_branch(scope, facts, lhs, assumption);
    outcomes.extend(assume_safe_branch(scope, facts, rhs, assumption));
    outcomes
}

/// The operand compared equal to nil.
fn null_operand(scope: ClassScope<'_>, facts: &ClassFacts, operand: &Expr) -> Option<SafeBranch> {
    if let Some(found) = interesting_delegate(scope, facts, operand) {
        return Some(found);
    }
    match_field_lvalue(scope, operand)
        .filter(|field| facts.is_interesting(field))
        .map(SafeBranch::FieldCleared)
}

/// `[_x delegate]` / `self.x.delegate` for an unsafe property of an
/// interesting field.
fn interesting_delegate(
    scope: ClassScope<'_>,
    facts: &ClassFacts,
    expr: &Expr,
) -> Option<SafeBranch> {
    let message = expr.ignore_parens_and_casts().as_message()?;
    let field = match_field_lvalue(scope, message.instance_receiver()?)?;
    if !facts.is_interesting(&field) {
        return None;
    }
    let property = match_property_getter_call(scope, message)?;
    if !property.ownership.is_unsafe() {
        return None;
    }
    Some(SafeBranch::PropertyCleared {
        field,
        property: property.name.clone(),
    })
}

/// A value the path proved null is being discarded, so there is nothing to
/// verify.
pub fn suppress_if_statically_null(value: SVal) -> bool {
    is_statically_null(value)
}
