use super::context::{AnalysisManager, CallEvent, CheckerContext};
use super::store::{is_known_null, MemLocation, SVal, Store};
use super::PathChecker;
use crate::ast::{BinaryOp, Expr, ExprKind, MessageExpr, MethodDecl, Receiver, Stmt, UnaryOp};
use crate::diagnostics::DiagnosticSink;
use serde::Serialize;
use std::ops::AddAssign;

/// Counters describing how much of a method (or translation unit) was
/// explored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExplorationStats {
    pub methods: usize,
    pub paths_completed: usize,
    pub paths_abandoned: usize,
    pub branches_pruned: usize,
}

impl AddAssign for ExplorationStats {
    fn add_assign(&mut self, other: Self) {
        self.methods += other.methods;
        self.paths_completed += other.paths_completed;
        self.paths_abandoned += other.paths_abandoned;
        self.branches_pruned += other.branches_pruned;
    }
}

#[derive(Debug, Clone)]
struct Path<S> {
    id: usize,
    store: Store,
    state: S,
}

/// Explores every path through one method body, depth of loops bounded by
/// `max_loop_unroll` and number of paths by `max_paths_per_method`.
///
/// Paths are never merged. A path that would exceed the budget is abandoned
/// without an end-of-function callback.
pub struct PathExplorer<'a, C: PathChecker> {
    checker: &'a C,
    session: &'a C::Session,
    manager: &'a AnalysisManager<'a>,
    class: &'a str,
    method: &'a MethodDecl,
    sink: &'a mut dyn DiagnosticSink,
    next_path: usize,
    stats: ExplorationStats,
}

impl<'a, C: PathChecker> PathExplorer<'a, C> {
    pub fn new(
        checker: &'a C,
        session: &'a C::Session,
        manager: &'a AnalysisManager<'a>,
        class: &'a str,
        method: &'a MethodDecl,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            checker,
            session,
            manager,
            class,
            method,
            sink,
            next_path: 0,
            stats: ExplorationStats::default(),
        }
    }

    pub fn explore(mut self) -> ExplorationStats {
        let Some(body) = self.method.body.as_ref() else {
            return self.stats;
        };
        self.stats.methods = 1;

        let initial = Path {
            id: self.allocate_path_id(),
            store: Store::new(),
            state: C::State::default(),
        };
        let live = self.exec_stmt(body, vec![initial]);
        for path in live {
            self.end_path(path);
        }

        if self.stats.paths_abandoned > 0 {
            tracing::debug!(
                class = self.class,
                method = %self.method.selector,
                abandoned = self.stats.paths_abandoned,
                "path budget exhausted"
            );
        }
        self.stats
    }

    fn allocate_path_id(&mut self) -> usize {
        let id = self.next_path;
        self.next_path += 1;
        id
    }

    fn fork(&mut self, path: &Path<C::State>) -> Option<Path<C::State>> {
        if self.next_path >= self.manager.settings().max_paths_per_method {
            self.stats.paths_abandoned += 1;
            return None;
        }
        Some(Path {
            id: self.allocate_path_id(),
            store: path.store.clone(),
            state: path.state.clone(),
        })
    }

    fn exec_stmt(&mut self, stmt: &'a Stmt, paths: Vec<Path<C::State>>) -> Vec<Path<C::State>> {
        if paths.is_empty() {
            return paths;
        }
        match stmt {
            Stmt::Expr { expr } => paths
                .into_iter()
                .map(|mut path| {
                    self.eval(expr, &mut path);
                    path
                })
                .collect(),
            Stmt::Block { stmts } => stmts
                .iter()
                .fold(paths, |paths, stmt| self.exec_stmt(stmt, paths)),
            Stmt::Decl { decl } => paths
                .into_iter()
                .map(|mut path| {
                    let value = match &decl.init {
                        Some(init) => self.eval(init, &mut path),
                        None => SVal::Unknown,
                    };
                    path.store = path
                        .store
                        .bind(MemLocation::Local(decl.name.clone()), value);
                    path
                })
                .collect(),
            Stmt::Return { value } => {
                for mut path in paths {
                    if let Some(value) = value {
                        self.eval(value, &mut path);
                    }
                    self.end_path(path);
                }
                Vec::new()
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                let mut continuing = Vec::new();
                for path in paths {
                    let (taken, not_taken) = self.branch(cond, path);
                    if let Some(path) = taken {
                        continuing.extend(self.exec_stmt(then, vec![path]));
                    }
                    if let Some(path) = not_taken {
                        match otherwise {
                            Some(otherwise) => {
                                continuing.extend(self.exec_stmt(otherwise, vec![path]))
                            }
                            None => continuing.push(path),
                        }
                    }
                }
                continuing
            }
            Stmt::While { cond, body } => self.exec_loop(cond, body, paths),
        }
    }

    fn exec_loop(
        &mut self,
        cond: &'a Expr,
        body: &'a Stmt,
        paths: Vec<Path<C::State>>,
    ) -> Vec<Path<C::State>> {
        let mut exited = Vec::new();
        let mut looping = paths;
        for _ in 0..self.manager.settings().max_loop_unroll {
            if looping.is_empty() {
                break;
            }
            let mut entered = Vec::new();
            for path in looping {
                let (stay, leave) = self.branch(cond, path);
                entered.extend(stay);
                exited.extend(leave);
            }
            looping = self.exec_stmt(body, entered);
        }

        // Past the unroll bound only the exit edge is followed.
        for mut path in looping {
            match self.eval(cond, &mut path) {
                SVal::NonNull => self.stats.paths_abandoned += 1,
                _ => exited.push(self.assume(cond, false, path)),
            }
        }
        exited
    }

    /// Evaluates `cond` and splits the path into its feasible directions.
    fn branch(
        &mut self,
        cond: &'a Expr,
        mut path: Path<C::State>,
    ) -> (Option<Path<C::State>>, Option<Path<C::State>>) {
        let value = self.eval(cond, &mut path);
        let (on_true, on_false) = match value {
            SVal::NonNull => {
                self.stats.branches_pruned += 1;
                (Some(path), None)
            }
            SVal::Null => {
                self.stats.branches_pruned += 1;
                (None, Some(path))
            }
            SVal::Unknown => {
                let other = self.fork(&path);
                (Some(path), other)
            }
        };
        (
            on_true.map(|path| self.assume(cond, true, path)),
            on_false.map(|path| self.assume(cond, false, path)),
        )
    }

    fn assume(&self, cond: &Expr, assumption: bool, path: Path<C::State>) -> Path<C::State> {
        let store = refine(&path.store, cond, assumption);
        let state = self.checker.eval_assume(
            self.session,
            self.manager,
            path.state,
            cond,
            assumption,
        );
        Path {
            id: path.id,
            store,
            state,
        }
    }

    fn end_path(&mut self, mut path: Path<C::State>) {
        self.with_context(&mut path, |checker, session, ctx| {
            checker.check_end_function(session, ctx)
        });
        self.stats.paths_completed += 1;
    }

    fn with_context<F>(&mut self, path: &mut Path<C::State>, callback: F)
    where
        F: FnOnce(&C, &C::Session, &mut CheckerContext<'_, C::State>),
    {
        let state = std::mem::take(&mut path.state);
        let mut ctx = CheckerContext::new(
            self.manager,
            self.class,
            self.method,
            self.checker.name(),
            path.id,
            &path.store,
            state,
        );
        callback(self.checker, self.session, &mut ctx);
        let (state, reports) = ctx.into_parts();
        path.state = state;
        for report in reports {
            self.sink.emit(report);
        }
    }

    fn eval(&mut self, expr: &'a Expr, path: &mut Path<C::State>) -> SVal {
        let operands: Vec<SVal> = expr
            .children()
            .into_iter()
            .map(|child| self.eval(child, path))
            .collect();

        self.with_context(path, |checker, session, ctx| {
            checker.check_pre_stmt(session, expr, ctx)
        });

        let operand = |index: usize| operands.get(index).copied().unwrap_or(SVal::Unknown);
        match &expr.kind {
            ExprKind::SelfRef | ExprKind::SelectorLiteral { .. } => SVal::NonNull,
            ExprKind::Nil => SVal::Null,
            ExprKind::IntLiteral { value } => SVal::from_truth(*value != 0),
            ExprKind::Var { .. } | ExprKind::FieldRef { .. } => path.store.value_of(expr),
            ExprKind::Paren { .. } | ExprKind::Cast { .. } => operand(0),
            ExprKind::Assign { lhs, .. } => {
                let value = operand(1);
                if let Some(location) = MemLocation::of(lhs) {
                    path.store = path.store.bind(location, value);
                }
                value
            }
            ExprKind::Binary { op, .. } => binary_value(*op, operand(0), operand(1)),
            ExprKind::Unary { op, .. } => match op {
                UnaryOp::Not => match operand(0) {
                    SVal::Null => SVal::NonNull,
                    SVal::NonNull => SVal::Null,
                    SVal::Unknown => SVal::Unknown,
                },
                UnaryOp::AddrOf => SVal::NonNull,
                UnaryOp::Neg | UnaryOp::Deref => SVal::Unknown,
            },
            ExprKind::Message(message) => self.eval_message(expr, message, &operands, path),
            ExprKind::Call { .. } | ExprKind::Opaque { .. } => SVal::Unknown,
        }
    }

    fn eval_message(
        &mut self,
        expr: &'a Expr,
        message: &'a MessageExpr,
        operands: &[SVal],
        path: &mut Path<C::State>,
    ) -> SVal {
        let (receiver, args) = match &message.receiver {
            Receiver::Instance { .. } => (
                operands.first().copied().unwrap_or(SVal::Unknown),
                operands.get(1..).unwrap_or_default().to_vec(),
            ),
            Receiver::Class { .. } | Receiver::Super => (SVal::NonNull, operands.to_vec()),
        };

        let index = self.manager.index();
        let scope = self.manager.scope(self.class);
        let runtime_definition = scope
            .receiver_class(&message.receiver)
            .and_then(|class| index.find_method_impl(&class, &message.selector));
        let synthesized = runtime_definition.is_none_or(|method| method.implicit);
        let on_self = message
            .instance_receiver()
            .is_some_and(|receiver| {
                matches!(receiver.ignore_parens_and_casts().kind, ExprKind::SelfRef)
            });

        let mut result = SVal::Unknown;
        if is_known_null(receiver) {
            result = SVal::Null;
        } else if on_self && synthesized {
            if let Some(field) = scope
                .resolve_getter(message)
                .and_then(|property| property.backing_field.clone())
            {
                result = path.store.lookup(&MemLocation::Field(field));
            } else if let Some(field) = scope
                .resolve_setter(message)
                .and_then(|property| property.backing_field.clone())
            {
                let value = args.first().copied().unwrap_or(SVal::Unknown);
                path.store = path.store.bind(MemLocation::Field(field), value);
            }
        }

        let call = CallEvent {
            expr,
            message,
            receiver,
            args,
            runtime_definition,
        };
        self.with_context(path, |checker, session, ctx| {
            checker.check_post_call(session, &call, ctx)
        });
        result
    }
}

/// Nullness of a binary expression given the nullness of its operands.
fn binary_value(op: BinaryOp, lhs: SVal, rhs: SVal) -> SVal {
    use SVal::{NonNull, Null, Unknown};
    match op {
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = match (lhs, rhs) {
                (Null, Null) => NonNull,
                (Null, NonNull) | (NonNull, Null) => Null,
                _ => Unknown,
            };
            match (op, equal) {
                (BinaryOp::Ne, NonNull) => Null,
                (BinaryOp::Ne, Null) => NonNull,
                _ => equal,
            }
        }
        BinaryOp::And => match (lhs, rhs) {
            (Null, _) | (_, Null) => Null,
            (NonNull, NonNull) => NonNull,
            _ => Unknown,
        },
        BinaryOp::Or => match (lhs, rhs) {
            (NonNull, _) | (_, NonNull) => NonNull,
            (Null, Null) => Null,
            _ => Unknown,
        },
        _ => Unknown,
    }
}

/// Store after assuming `cond` evaluated to `assumption`.
///
/// Only comparisons of a local or field against a null literal, plain
/// truthiness tests and their negations narrow anything.
fn refine(store: &Store, cond: &Expr, assumption: bool) -> Store {
    let cond = cond.ignore_parens_and_casts();
    match &cond.kind {
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => refine(store, operand, !assumption),
        ExprKind::Binary { op, lhs, rhs } if op.is_equality() => {
            let slot = if rhs.is_null_literal() {
                lhs
            } else if lhs.is_null_literal() {
                rhs
            } else {
                return store.clone();
            };
            let is_null = (*op == BinaryOp::Eq) == assumption;
            match MemLocation::of(slot) {
                Some(location) => store.bind(location, SVal::from_truth(!is_null)),
                None => store.clone(),
            }
        }
        ExprKind::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } if assumption => refine(&refine(store, lhs, true), rhs, true),
        ExprKind::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } if !assumption => refine(&refine(store, lhs, false), rhs, false),
        ExprKind::Assign { lhs, .. } => match MemLocation::of(lhs) {
            Some(location) => store.bind(location, SVal::from_truth(assumption)),
            None => store.clone(),
        },
        _ => match MemLocation::of(cond) {
            Some(location) => store.bind(location, SVal::from_truth(assumption)),
            None => store.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclIndex, SourceRange, TranslationUnit};
    use crate::config::AnalysisSettings;
    use crate::diagnostics::Diagnostic;
    use crate::testkit::{fixtures, helpers::*};
    use pretty_assertions::assert_eq;

    /// Records callback events in its path state and reports the trace of
    /// every completed path.
    struct TraceChecker;

    impl PathChecker for TraceChecker {
        type State = Vec<String>;
        type Session = ();

        fn name(&self) -> &'static str {
            "test.Trace"
        }

        fn check_pre_stmt(&self, _: &(), expr: &Expr, ctx: &mut CheckerContext<'_, Vec<String>>) {
            let label = match &expr.kind {
                ExprKind::Message(message) => format!("pre:{}", message.selector),
                ExprKind::Assign { .. } => "pre:=".to_string(),
                _ => return,
            };
            let mut trace = ctx.state().clone();
            trace.push(label);
            ctx.set_state(trace);
        }

        fn check_post_call(
            &self,
            _: &(),
            call: &CallEvent<'_>,
            ctx: &mut CheckerContext<'_, Vec<String>>,
        ) {
            let mut trace = ctx.state().clone();
            trace.push(format!("post:{}:{:?}", call.selector(), call.receiver));
            ctx.set_state(trace);
        }

        fn eval_assume(
            &self,
            _: &(),
            _: &AnalysisManager<'_>,
            mut state: Vec<String>,
            _cond: &Expr,
            assumption: bool,
        ) -> Vec<String> {
            state.push(format!("assume:{assumption}"));
            state
        }

        fn check_end_function(&self, _: &(), ctx: &mut CheckerContext<'_, Vec<String>>) {
            let message = ctx.state().join(" ");
            ctx.emit_report("trace", "test", message, SourceRange::default());
        }
    }

    fn explore(
        tu: &TranslationUnit,
        settings: AnalysisSettings,
    ) -> (ExplorationStats, Vec<String>) {
        let index = DeclIndex::new(tu);
        let manager = AnalysisManager::new(&index, &settings);
        let implementation = &tu.implementations[0];
        let method = &implementation.methods[0];
        let mut sink: Vec<Diagnostic> = Vec::new();
        let stats = PathExplorer::new(
            &TraceChecker,
            &(),
            &manager,
            &implementation.name,
            method,
            &mut sink,
        )
        .explore();
        let traces = sink.into_iter().map(|d| d.message).collect();
        (stats, traces)
    }

    #[test]
    fn test_operands_are_visited_before_the_call() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![stmt(msg(field("_bar"), "setDelegate:", vec![msg(self_ref(), "target", vec![])]))],
        )]);
        let (stats, traces) = explore(&tu, AnalysisSettings::default());
        assert_eq!(stats.paths_completed, 1);
        assert_eq!(
            traces,
            vec!["pre:target post:target:NonNull pre:setDelegate: post:setDelegate::Unknown"]
        );
    }

    #[test]
    fn test_unknown_condition_forks_both_directions() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![if_(field("_bar"), stmt(msg(field("_bar"), "stop", vec![])), None)],
        )]);
        let (stats, mut traces) = explore(&tu, AnalysisSettings::default());
        traces.sort();
        assert_eq!(stats.paths_completed, 2);
        assert_eq!(
            traces,
            vec!["assume:false", "assume:true pre:stop post:stop:NonNull"]
        );
    }

    #[test]
    fn test_known_null_prunes_infeasible_branch() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![
                stmt(assign(field("_bar"), nil())),
                if_(field("_bar"), stmt(msg(field("_bar"), "stop", vec![])), None),
            ],
        )]);
        let (stats, traces) = explore(&tu, AnalysisSettings::default());
        assert_eq!(stats.paths_completed, 1);
        assert_eq!(stats.branches_pruned, 1);
        assert_eq!(traces, vec!["pre:= assume:false"]);
    }

    #[test]
    fn test_synthesized_setter_on_self_updates_backing_field() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![
                stmt(setter(self_ref(), "bar", nil())),
                if_(eq(field("_bar"), nil()), stmt(msg(self_ref(), "done", vec![])), None),
            ],
        )]);
        let (stats, _) = explore(&tu, AnalysisSettings::default());
        assert_eq!(stats.paths_completed, 1);
        assert_eq!(stats.branches_pruned, 1);
    }

    #[test]
    fn test_loop_is_unrolled_up_to_the_bound() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![while_(
                msg(self_ref(), "hasMore", vec![]),
                stmt(msg(self_ref(), "tick", vec![])),
            )],
        )]);
        let (stats, traces) = explore(&tu, AnalysisSettings::default());
        // zero, one and two iterations
        assert_eq!(stats.paths_completed, 3);
        assert_eq!(stats.paths_abandoned, 0);
        assert!(traces.iter().any(|t| t.matches("post:tick").count() == 2));
        assert!(traces.iter().all(|t| t.matches("post:tick").count() <= 2));
    }

    #[test]
    fn test_loop_with_proven_condition_is_abandoned_at_the_bound() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![while_(var("more"), stmt(msg(self_ref(), "tick", vec![])))],
        )]);
        let (stats, _) = explore(&tu, AnalysisSettings::default());
        // only the path that never entered the loop survives
        assert_eq!(stats.paths_completed, 1);
        assert_eq!(stats.paths_abandoned, 1);
    }

    #[test]
    fn test_path_budget_abandons_extra_forks() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![
                if_(var("a"), stmt(msg(self_ref(), "one", vec![])), None),
                if_(var("b"), stmt(msg(self_ref(), "two", vec![])), None),
            ],
        )]);
        let settings = AnalysisSettings {
            max_paths_per_method: 1,
            ..AnalysisSettings::default()
        };
        let (stats, traces) = explore(&tu, settings);
        assert_eq!(stats.paths_completed, 1);
        assert_eq!(stats.paths_abandoned, 2);
        assert_eq!(traces.len(), 1);
    }

    #[test]
    fn test_return_ends_the_path_early() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![
                if_(var("done"), ret(None), None),
                stmt(msg(self_ref(), "cleanup", vec![])),
            ],
        )]);
        let (stats, mut traces) = explore(&tu, AnalysisSettings::default());
        traces.sort();
        assert_eq!(stats.paths_completed, 2);
        assert_eq!(
            traces,
            vec!["assume:false pre:cleanup post:cleanup:NonNull", "assume:true"]
        );
    }

    #[test]
    fn test_refine_handles_negation_and_conjunction() {
        let store = Store::new();
        let cond = not(eq(var("x"), nil()));
        let refined = refine(&store, &cond, true);
        assert_eq!(refined.lookup(&MemLocation::Local("x".into())), SVal::NonNull);

        let both = and(var("a"), ne(field("_b"), nil()));
        let refined = refine(&store, &both, true);
        assert_eq!(refined.lookup(&MemLocation::Local("a".into())), SVal::NonNull);
        assert_eq!(refined.lookup(&MemLocation::Field("_b".into())), SVal::NonNull);

        let refined = refine(&store, &both, false);
        assert_eq!(refined, store);
    }

    #[test]
    fn test_binary_value_equality_table() {
        assert_eq!(binary_value(BinaryOp::Eq, SVal::Null, SVal::Null), SVal::NonNull);
        assert_eq!(binary_value(BinaryOp::Ne, SVal::Null, SVal::NonNull), SVal::NonNull);
        assert_eq!(binary_value(BinaryOp::Eq, SVal::NonNull, SVal::NonNull), SVal::Unknown);
        assert_eq!(binary_value(BinaryOp::Or, SVal::Unknown, SVal::NonNull), SVal::NonNull);
    }
}
