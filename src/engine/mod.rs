//! Reference path-sensitive host.
//!
//! Checkers implementing [`PathChecker`] are driven over every method body of
//! a translation unit. Each explored path carries an abstract [`Store`] of
//! nullness facts plus the checker's own per-path state; both are persistent
//! values, so forking a path is a cheap clone.
//!
//! Callback order for one translation unit:
//!
//! 1. [`PathChecker::check_ast_decl`] for every `@implementation`, before any
//!    path is explored;
//! 2. for every method body and every path through it,
//!    [`PathChecker::check_pre_stmt`] (each expression, after its operands and
//!    before its own effect), [`PathChecker::check_post_call`] (each message
//!    send), [`PathChecker::eval_assume`] (each feasible branch direction) and
//!    [`PathChecker::check_end_function`] (each path that reaches the end);
//! 3. [`PathChecker::check_end_of_translation_unit`].

pub mod context;
pub mod driver;
pub mod explorer;
pub mod store;

use crate::ast::{Expr, ImplementationDecl};
use crate::diagnostics::DiagnosticSink;
use crate::errors::Result;
use std::fmt::Debug;

pub use context::{AnalysisManager, CallEvent, CheckerContext};
pub use driver::run_path_checker;
pub use explorer::{ExplorationStats, PathExplorer};
pub use store::{is_known_null, MemLocation, SVal, Store};

/// A checker hooked into path exploration.
///
/// `Session` is data built by the declaration scan and read during path
/// exploration; it lives for one translation unit. `State` is the per-path
/// value threaded through the callbacks.
pub trait PathChecker {
    type State: Clone + PartialEq + Default + Debug;
    type Session: Default;

    fn name(&self) -> &'static str;

    /// Class-wide scan of one implementation, run before its methods are
    /// explored. An error aborts this callback only.
    fn check_ast_decl(
        &self,
        _session: &mut Self::Session,
        _decl: &ImplementationDecl,
        _manager: &AnalysisManager<'_>,
        _sink: &mut dyn DiagnosticSink,
    ) -> Result<()> {
        Ok(())
    }

    fn check_pre_stmt(
        &self,
        _session: &Self::Session,
        _expr: &Expr,
        _ctx: &mut CheckerContext<'_, Self::State>,
    ) {
    }

    fn check_post_call(
        &self,
        _session: &Self::Session,
        _call: &CallEvent<'_>,
        _ctx: &mut CheckerContext<'_, Self::State>,
    ) {
    }

    /// Refines the state when the path continues under `cond == assumption`.
    fn eval_assume(
        &self,
        _session: &Self::Session,
        _manager: &AnalysisManager<'_>,
        state: Self::State,
        _cond: &Expr,
        _assumption: bool,
    ) -> Self::State {
        state
    }

    fn check_end_function(
        &self,
        _session: &Self::Session,
        _ctx: &mut CheckerContext<'_, Self::State>,
    ) {
    }

    fn check_end_of_translation_unit(
        &self,
        _session: &mut Self::Session,
        _manager: &AnalysisManager<'_>,
    ) {
    }
}
