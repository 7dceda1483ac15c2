//! Minimal closed AST consumed by the checkers.
//!
//! Only the declaration and expression shapes the analysis passes look at are
//! modelled. Front ends translate their own tree into this one (see
//! [`loader`] for the JSON form), resolving dot-syntax property accesses into
//! plain message sends on the way.

pub mod index;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use index::{ClassScope, DeclIndex};
pub use loader::{load_translation_unit, parse_translation_unit};

/// A position in the analyzed source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub fn new(begin: SourceLocation, end: SourceLocation) -> Self {
        Self { begin, end }
    }

    /// Single-line range, handy for fixtures.
    pub fn line(line: u32) -> Self {
        Self::new(SourceLocation::new(line, 1), SourceLocation::new(line, 1))
    }
}

/// Language options that change what the checkers consider dangerous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangOptions {
    /// Fields are released automatically when the object is torn down
    /// (automatic reference counting).
    #[serde(default = "default_auto_release_fields")]
    pub auto_release_fields: bool,
}

fn default_auto_release_fields() -> bool {
    true
}

impl Default for LangOptions {
    fn default() -> Self {
        Self {
            auto_release_fields: default_auto_release_fields(),
        }
    }
}

/// One analyzed source file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslationUnit {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub lang: LangOptions,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
    #[serde(default)]
    pub implementations: Vec<ImplementationDecl>,
    #[serde(default)]
    pub globals: Vec<VarDecl>,
}

/// Declared type of a field, property, parameter or local.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TypeRef {
    /// Pointer to an instance of the named class.
    Object(String),
    /// Untyped object pointer (`id`).
    Id,
    /// Anything else, spelled as written (`int`, `dispatch_once_t`).
    Scalar(String),
}

impl TypeRef {
    pub fn object(name: impl Into<String>) -> Self {
        TypeRef::Object(name.into())
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        TypeRef::Scalar(name.into())
    }

    /// Class name when this is a typed object pointer.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeRef::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_object_pointer(&self) -> bool {
        matches!(self, TypeRef::Object(_) | TypeRef::Id)
    }

    pub fn spelling(&self) -> &str {
        match self {
            TypeRef::Object(name) | TypeRef::Scalar(name) => name,
            TypeRef::Id => "id",
        }
    }
}

/// How a property setter treats the stored reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    #[default]
    Strong,
    Copy,
    /// Zeroing non-owning reference.
    Weak,
    /// Non-owning, non-zeroing reference (`assign`, `unsafe_unretained`).
    Assign,
}

impl Ownership {
    /// The setter stores the reference without retaining it and the slot is
    /// not cleared when the referenced object dies.
    pub fn is_unsafe(self) -> bool {
        matches!(self, Ownership::Assign)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub ownership: Ownership,
    /// Field synthesized for (or explicitly bound to) this property.
    #[serde(default)]
    pub backing_field: Option<String>,
    #[serde(default)]
    pub range: SourceRange,
}

impl PropertyDecl {
    /// Selector of the conventional setter, `delegate` -> `setDelegate:`.
    pub fn setter_selector(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => format!("set{}{}:", first.to_ascii_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Instance,
    Class,
}

/// Method declared in an `@interface` (no body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub selector: String,
    #[serde(default)]
    pub kind: MethodKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub methods: Vec<MethodSignature>,
    #[serde(default)]
    pub range: SourceRange,
}

/// Conventional method family, derived from the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodFamily {
    Init,
    None,
}

impl MethodFamily {
    /// Leading underscores are ignored and the first selector word must be
    /// exactly `init` (`initWithFrame:` yes, `initialize` no).
    pub fn of(selector: &str) -> Self {
        let name = selector.trim_start_matches('_');
        match name.strip_prefix("init") {
            Some(rest) if !rest.starts_with(|c: char| c.is_ascii_lowercase()) => {
                MethodFamily::Init
            }
            _ => MethodFamily::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
}

/// Method with (optionally) a body, as found in an `@implementation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub selector: String,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub body: Option<Stmt>,
    /// Compiler-generated (synthesized accessors and the like).
    #[serde(default)]
    pub implicit: bool,
    #[serde(default)]
    pub range: SourceRange,
}

impl MethodDecl {
    pub fn family(&self) -> MethodFamily {
        MethodFamily::of(&self.selector)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImplementationDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub range: SourceRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    #[default]
    Local,
    StaticLocal,
    Global,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub storage: StorageClass,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub range: SourceRange,
}

impl VarDecl {
    pub fn has_static_storage(&self) -> bool {
        matches!(self.storage, StorageClass::StaticLocal | StorageClass::Global)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Expr {
        expr: Expr,
    },
    Block {
        #[serde(default)]
        stmts: Vec<Stmt>,
    },
    If {
        cond: Expr,
        then: Box<Stmt>,
        #[serde(default)]
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    Decl {
        decl: VarDecl,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
    AddrOf,
    Deref,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Receiver {
    Instance { expr: Box<Expr> },
    Class { name: String },
    Super,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageExpr {
    pub receiver: Receiver,
    pub selector: String,
    #[serde(default)]
    pub args: Vec<Expr>,
}

impl MessageExpr {
    pub fn instance_receiver(&self) -> Option<&Expr> {
        match &self.receiver {
            Receiver::Instance { expr } => Some(expr),
            _ => None,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&Expr> {
        self.args.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprKind {
    SelfRef,
    Nil,
    IntLiteral {
        value: i64,
    },
    /// Reference to a local, parameter or global.
    Var {
        name: String,
        #[serde(default)]
        ty: Option<TypeRef>,
    },
    /// Direct reference to a field of `self`.
    FieldRef {
        field: String,
    },
    Message(MessageExpr),
    Assign {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Paren {
        inner: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        inner: Box<Expr>,
    },
    SelectorLiteral {
        selector: String,
    },
    /// Plain function call.
    Call {
        callee: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// Any construct the checkers do not model; only its children are kept.
    Opaque {
        #[serde(default)]
        children: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    #[serde(default)]
    pub range: SourceRange,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            range: SourceRange::default(),
        }
    }

    pub fn at(mut self, range: SourceRange) -> Self {
        self.range = range;
        self
    }

    /// Strips parentheses and casts.
    pub fn ignore_parens_and_casts(&self) -> &Expr {
        let mut expr = self;
        loop {
            match &expr.kind {
                ExprKind::Paren { inner } | ExprKind::Cast { inner, .. } => expr = inner,
                _ => return expr,
            }
        }
    }

    pub fn as_message(&self) -> Option<&MessageExpr> {
        match &self.kind {
            ExprKind::Message(message) => Some(message),
            _ => None,
        }
    }

    /// `nil`, `NULL` or a literal zero.
    pub fn is_null_literal(&self) -> bool {
        matches!(
            self.ignore_parens_and_casts().kind,
            ExprKind::Nil | ExprKind::IntLiteral { value: 0 }
        )
    }

    /// Direct sub-expressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::SelfRef
            | ExprKind::Nil
            | ExprKind::IntLiteral { .. }
            | ExprKind::Var { .. }
            | ExprKind::FieldRef { .. }
            | ExprKind::SelectorLiteral { .. } => Vec::new(),
            ExprKind::Message(message) => {
                let mut children = Vec::with_capacity(message.args.len() + 1);
                if let Some(receiver) = message.instance_receiver() {
                    children.push(receiver);
                }
                children.extend(message.args.iter());
                children
            }
            ExprKind::Assign { lhs, rhs } | ExprKind::Binary { lhs, rhs, .. } => {
                vec![lhs.as_ref(), rhs.as_ref()]
            }
            ExprKind::Unary { operand, .. } => vec![operand.as_ref()],
            ExprKind::Paren { inner } | ExprKind::Cast { inner, .. } => vec![inner.as_ref()],
            ExprKind::Call { args, .. } => args.iter().collect(),
            ExprKind::Opaque { children } => children.iter().collect(),
        }
    }
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr { expr }
    }

    /// Statements directly nested in this one.
    pub fn child_stmts(&self) -> Vec<&Stmt> {
        match self {
            Stmt::Block { stmts } => stmts.iter().collect(),
            Stmt::If {
                then, otherwise, ..
            } => {
                let mut children = vec![then.as_ref()];
                if let Some(otherwise) = otherwise {
                    children.push(otherwise);
                }
                children
            }
            Stmt::While { body, .. } => vec![body.as_ref()],
            Stmt::Expr { .. } | Stmt::Return { .. } | Stmt::Decl { .. } => Vec::new(),
        }
    }

    /// Expressions owned directly by this statement.
    pub fn child_exprs(&self) -> Vec<&Expr> {
        match self {
            Stmt::Expr { expr } => vec![expr],
            Stmt::If { cond, .. } | Stmt::While { cond, .. } => vec![cond],
            Stmt::Return { value } => value.iter().collect(),
            Stmt::Decl { decl } => decl.init.iter().collect(),
            Stmt::Block { .. } => Vec::new(),
        }
    }
}
