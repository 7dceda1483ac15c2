use crate::ast::{Expr, ExprKind};
use serde::Serialize;

/// Abstract value of an expression on one path: only nullness is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SVal {
    Null,
    NonNull,
    Unknown,
}

impl SVal {
    pub fn is_definite(self) -> bool {
        !matches!(self, SVal::Unknown)
    }

    pub fn from_truth(truth: bool) -> Self {
        if truth {
            SVal::NonNull
        } else {
            SVal::Null
        }
    }
}

/// Storage slot whose value the store can remember.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MemLocation {
    Local(String),
    Field(String),
}

impl MemLocation {
    /// Slot denoted by an lvalue expression, if it is one we track.
    pub fn of(expr: &Expr) -> Option<Self> {
        match &expr.ignore_parens_and_casts().kind {
            ExprKind::Var { name, .. } => Some(MemLocation::Local(name.clone())),
            ExprKind::FieldRef { field } => Some(MemLocation::Field(field.clone())),
            _ => None,
        }
    }
}

/// Persistent bindings for one path. Cloning is O(1); forks share structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    bindings: im::HashMap<MemLocation, SVal>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, location: &MemLocation) -> SVal {
        self.bindings
            .get(location)
            .copied()
            .unwrap_or(SVal::Unknown)
    }

    pub fn bind(&self, location: MemLocation, value: SVal) -> Self {
        Self {
            bindings: self.bindings.update(location, value),
        }
    }

    /// Current value of an lvalue expression, without side effects.
    pub fn value_of(&self, expr: &Expr) -> SVal {
        match &expr.ignore_parens_and_casts().kind {
            ExprKind::SelfRef => SVal::NonNull,
            ExprKind::Nil => SVal::Null,
            ExprKind::IntLiteral { value } => SVal::from_truth(*value != 0),
            _ => MemLocation::of(expr)
                .map(|location| self.lookup(&location))
                .unwrap_or(SVal::Unknown),
        }
    }
}

/// Whether `value` is known to be null on the current path.
///
/// Only answers from what the path already proved; it never narrows the path.
/// An unknown value is reported as "not known null".
pub fn is_known_null(value: SVal) -> bool {
    value == SVal::Null
}
