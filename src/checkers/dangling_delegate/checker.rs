use super::fact_finder::find_class_facts;
use super::facts::{ClassFacts, ClassFactsCache, FieldId};
use super::matchers::{
    first_argument_is_self, is_self_reference, is_statically_null, match_field_lvalue,
    match_property_setter_call,
};
use super::policy::{assume_safe_branch, suppress_if_statically_null, SafeBranch};
use super::report::{verify_and_report, LEAKING_SELF};
use super::state::{DelegatePathState, DynamicState};
use crate::ast::{Expr, ExprKind, ImplementationDecl, PropertyDecl, SourceRange, TypeRef};
use crate::config::DanglingDelegateConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::engine::{AnalysisManager, CallEvent, CheckerContext, PathChecker, SVal};
use crate::errors::{Error, Result};
use tracing::debug;

pub const NAME: &str = "memory.DanglingDelegate";

type Ctx<'a> = CheckerContext<'a, DelegatePathState>;

/// Facts of every class seen in the current translation unit.
#[derive(Debug, Default)]
pub struct DelegateSession {
    cache: ClassFactsCache,
}

impl DelegateSession {
    pub fn facts(&self, class: &str) -> Option<&ClassFacts> {
        self.cache.get(class)
    }

    pub fn cached_classes(&self) -> usize {
        self.cache.len()
    }
}

/// Finds objects left holding a non-owning reference to `self` after the
/// field that kept them alive lets go of them.
#[derive(Debug, Clone, Default)]
pub struct DanglingDelegateChecker {
    config: DanglingDelegateConfig,
}

impl DanglingDelegateChecker {
    pub fn new(config: DanglingDelegateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DanglingDelegateConfig {
        &self.config
    }

    /// The host has no start-of-method callback, so the first callback of
    /// each path records the class and, in pseudo-init methods, marks every
    /// interesting field as fully cleared.
    fn apply_initial_state(&self, facts: Option<&ClassFacts>, ctx: &mut Ctx<'_>) {
        if ctx.state().initial_state_applied() {
            return;
        }
        let mut state = ctx.state().with_initial_state(ctx.class_name());
        if let Some(facts) = facts.filter(|f| f.is_pseudo_init(&ctx.method().selector)) {
            for (field, field_facts) in facts.fields() {
                state = state.with_field(field.clone(), DynamicState::all_cleared(field_facts));
            }
        }
        ctx.set_state(state);
    }

    /// Reports every unsafe property of `field` the path has not cleared.
    fn verify_field(
        &self,
        facts: &ClassFacts,
        field: &FieldId,
        decl_name: Option<&str>,
        range: SourceRange,
        ctx: &mut Ctx<'_>,
    ) -> usize {
        let Some(field_facts) = facts.field_facts(field) else {
            return 0;
        };
        let cleared = ctx.state().field(field).cleared_unsafe_properties().clone();
        let field_type = ctx.scope().field(field.name()).map(|decl| &decl.ty);
        verify_and_report(
            &field_facts.unsafe_properties_that_may_hold_self,
            &cleared,
            field,
            field_type,
            decl_name,
            |message| ctx.emit_report(LEAKING_SELF.title, LEAKING_SELF.category, message, range),
        )
    }

    fn update_field(
        &self,
        field: FieldId,
        ctx: &mut Ctx<'_>,
        transition: impl FnOnce(DynamicState) -> DynamicState,
    ) {
        let next = transition(ctx.state().field(&field));
        let state = ctx.state().with_field(field, next);
        ctx.set_state(state);
    }

    /// `self.x = value` through an accessor of a field-backed property.
    fn check_self_setter(
        &self,
        facts: &ClassFacts,
        property: &PropertyDecl,
        call: &CallEvent<'_>,
        ctx: &mut Ctx<'_>,
    ) {
        let Some(field) = property.backing_field.as_deref().map(FieldId::new) else {
            return;
        };
        // a custom setter may release the old object behind our back
        if !call.has_known_body() {
            self.verify_field(facts, &field, None, call.expr.range, ctx);
        }
        if let Some(field_facts) = facts.field_facts(&field) {
            if is_statically_null(call.arg_sval(0)) {
                let cleared = DynamicState::all_cleared(field_facts);
                self.update_field(field, ctx, |_| cleared);
            }
        }
    }

    /// A message to the object held by an interesting field.
    fn check_field_call(
        &self,
        facts: &ClassFacts,
        field: FieldId,
        call: &CallEvent<'_>,
        ctx: &mut Ctx<'_>,
    ) {
        let selector = call.selector();
        if self.config.is_release_selector(selector) {
            self.verify_field(facts, &field, None, call.expr.range, ctx);
            return;
        }

        let passes_self = first_argument_is_self(call.message);
        if let Some(property) = match_property_setter_call(ctx.scope(), call.message) {
            if !property.ownership.is_unsafe() {
                return;
            }
            let name = property.name.as_str();
            if passes_self {
                self.update_field(field, ctx, |s| s.with_property_uncleared(name));
            } else {
                self.update_field(field, ctx, |s| s.with_property_cleared(name));
            }
        } else if passes_self && selector.starts_with(&self.config.remove_target_prefix) {
            self.update_field(field, ctx, |s| s.with_target_cleared());
        } else if passes_self && selector.starts_with(&self.config.remove_observer_prefix) {
            self.update_field(field, ctx, |s| s.with_observer_cleared());
        }
    }

    fn known_null(&self, value: SVal) -> bool {
        self.config.suppress_if_statically_null && suppress_if_statically_null(value)
    }
}

impl PathChecker for DanglingDelegateChecker {
    type State = DelegatePathState;
    type Session = DelegateSession;

    fn name(&self) -> &'static str {
        NAME
    }

    fn check_ast_decl(
        &self,
        session: &mut DelegateSession,
        decl: &ImplementationDecl,
        manager: &AnalysisManager<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<()> {
        if decl.name.is_empty() {
            return Err(Error::host_contract("implementation declaration without a name"));
        }
        if session.cache.contains(&decl.name) {
            debug!(class = %decl.name, "class facts already known");
            return Ok(());
        }

        let scope = manager.scope(&decl.name);
        let facts = find_class_facts(scope, decl, &self.config);
        debug!(
            class = %decl.name,
            interesting_fields = facts.fields().count(),
            teardown = facts.has_teardown_method(),
            "class facts"
        );

        // the implicit teardown releases every field without clearing anything
        if !facts.has_teardown_method() && manager.lang().auto_release_fields {
            let decl_name = format!("implicit {}", self.config.teardown_method);
            for (field, field_facts) in facts.fields() {
                let field_type = scope.field(field.name()).map(|f| &f.ty);
                verify_and_report(
                    &field_facts.unsafe_properties_that_may_hold_self,
                    &im::OrdSet::new(),
                    field,
                    field_type,
                    Some(&decl_name),
                    |message| {
                        sink.emit(Diagnostic::at_declaration(
                            NAME,
                            &LEAKING_SELF,
                            manager.file(),
                            decl.name.as_str(),
                            decl.range,
                            message,
                        ))
                    },
                );
            }
        }

        session.cache.insert_if_absent(decl.name.clone(), facts);
        Ok(())
    }

    /// Direct writes to an interesting field discard the object it held.
    fn check_pre_stmt(&self, session: &DelegateSession, expr: &Expr, ctx: &mut Ctx<'_>) {
        let facts = session.facts(ctx.class_name());
        self.apply_initial_state(facts, ctx);
        let Some(facts) = facts else {
            return;
        };
        if !ctx.lang().auto_release_fields {
            return;
        }
        let ExprKind::Assign { lhs, .. } = &expr.kind else {
            return;
        };
        let lhs = lhs.ignore_parens_and_casts();
        let ExprKind::FieldRef { field } = &lhs.kind else {
            return;
        };
        let is_object = ctx
            .scope()
            .field(field)
            .is_some_and(|decl| matches!(decl.ty, TypeRef::Object(_)));
        if !is_object {
            return;
        }
        if self.known_null(ctx.sval_of(lhs)) {
            return;
        }
        self.verify_field(facts, &FieldId::new(field.as_str()), None, expr.range, ctx);
    }

    fn check_post_call(&self, session: &DelegateSession, call: &CallEvent<'_>, ctx: &mut Ctx<'_>) {
        let facts = session.facts(ctx.class_name());
        self.apply_initial_state(facts, ctx);
        let Some(receiver) = call.message.instance_receiver() else {
            return;
        };
        if self.known_null(call.receiver) {
            return;
        }
        let Some(facts) = facts else {
            return;
        };

        if is_self_reference(receiver) {
            if let Some(property) = match_property_setter_call(ctx.scope(), call.message) {
                self.check_self_setter(facts, property, call, ctx);
            }
            return;
        }

        if let Some(field) = match_field_lvalue(ctx.scope(), receiver) {
            if facts.is_interesting(&field) {
                self.check_field_call(facts, field, call, ctx);
            }
        }
    }

    fn eval_assume(
        &self,
        session: &DelegateSession,
        manager: &AnalysisManager<'_>,
        state: DelegatePathState,
        cond: &Expr,
        assumption: bool,
    ) -> DelegatePathState {
        if !self.config.assume_safe_branch {
            return state;
        }
        let Some(class) = state.current_class().map(str::to_string) else {
            return state;
        };
        let Some(facts) = session.facts(&class) else {
            return state;
        };

        let outcomes = assume_safe_branch(manager.scope(&class), facts, cond, assumption);
        outcomes.into_iter().fold(state, |state, outcome| match outcome {
            SafeBranch::PropertyCleared { field, property } => {
                let cleared = state.field(&field).with_property_cleared(&property);
                state.with_field(field, cleared)
            }
            SafeBranch::FieldCleared(field) => match facts.field_facts(&field) {
                Some(field_facts) => {
                    state.with_field(field, DynamicState::all_cleared(field_facts))
                }
                None => state,
            },
        })
    }

    /// Leaving the teardown method releases every field.
    fn check_end_function(&self, session: &DelegateSession, ctx: &mut Ctx<'_>) {
        let facts = session.facts(ctx.class_name());
        self.apply_initial_state(facts, ctx);
        let Some(facts) = facts else {
            return;
        };
        if !ctx.lang().auto_release_fields || ctx.method().selector != self.config.teardown_method {
            return;
        }

        let decl_name = format!("automatic release at end of {}", self.config.teardown_method);
        let range = ctx.method().range;
        for (field, _) in facts.fields() {
            // already released on this path by a write that was verified
            if self.known_null(ctx.field_sval(field.name())) {
                continue;
            }
            self.verify_field(facts, field, Some(&decl_name), range, ctx);
        }
    }

    fn check_end_of_translation_unit(
        &self,
        session: &mut DelegateSession,
        _manager: &AnalysisManager<'_>,
    ) {
        debug!(classes = session.cache.len(), "dropping class facts");
        session.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclIndex, TranslationUnit};
    use crate::config::AnalysisSettings;
    use crate::diagnostics::ReportContext;
    use crate::engine::{run_path_checker, Store};
    use crate::testkit::{fixtures, helpers::*};
    use pretty_assertions::assert_eq;

    fn run_with(checker: &DanglingDelegateChecker, tu: &TranslationUnit) -> Vec<Diagnostic> {
        let mut sink: Vec<Diagnostic> = Vec::new();
        run_path_checker(checker, tu, &AnalysisSettings::default(), &mut sink);
        sink
    }

    fn run(tu: &TranslationUnit) -> Vec<Diagnostic> {
        run_with(&DanglingDelegateChecker::default(), tu)
    }

    fn init_storing_self() -> crate::ast::MethodDecl {
        method("init", vec![stmt(setter(field("_bar"), "delegate", self_ref()))])
    }

    fn dealloc_clearing() -> crate::ast::MethodDecl {
        method("dealloc", vec![stmt(setter(field("_bar"), "delegate", nil()))])
    }

    #[test]
    fn test_missing_teardown_reports_at_class_level() {
        let diagnostics = run(&fixtures::delegate_pair(vec![init_storing_self()]));
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.context, ReportContext::Declaration { decl: "Foo".into() });
        assert!(d.message.contains("_bar.delegate (in implicit dealloc)"));
        assert_eq!(d.title, "Leaking unsafe reference to self");
    }

    #[test]
    fn test_missing_teardown_without_auto_release_is_silent() {
        let diagnostics = run(&fixtures::manual_release_pair(vec![init_storing_self()]));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_pseudo_init_contributes_no_facts() {
        let tu = fixtures::delegate_pair(vec![method(
            "setupBar",
            vec![stmt(setter(field("_bar"), "delegate", self_ref()))],
        )]);
        assert!(run(&tu).is_empty());
    }

    #[test]
    fn test_teardown_clearing_after_storing_is_silent() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![
                stmt(setter(field("_bar"), "delegate", self_ref())),
                stmt(setter(field("_bar"), "delegate", nil())),
            ],
        )]);
        assert!(run(&tu).is_empty());
    }

    #[test]
    fn test_teardown_without_clearing_reports_at_end() {
        let tu = fixtures::delegate_pair(vec![method(
            "dealloc",
            vec![stmt(setter(field("_bar"), "delegate", self_ref()))],
        )]);
        let diagnostics = run(&tu);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .message
            .contains("(in automatic release at end of dealloc)"));
        assert!(matches!(
            diagnostics[0].context,
            ReportContext::Path { ref method, .. } if method == "dealloc"
        ));
    }

    #[test]
    fn test_storing_self_again_after_clearing_reports() {
        let tu = fixtures::delegate_pair(vec![
            init_storing_self(),
            method(
                "dealloc",
                vec![
                    stmt(setter(field("_bar"), "delegate", nil())),
                    stmt(setter(field("_bar"), "delegate", self_ref())),
                ],
            ),
        ]);
        assert_eq!(run(&tu).len(), 1);
    }

    #[test]
    fn test_field_write_verifies_discarded_object() {
        let tu = fixtures::delegate_pair(vec![
            init_storing_self(),
            dealloc_clearing(),
            method("replaceBar", vec![stmt(assign(field("_bar"), var("other")))]),
        ]);
        let diagnostics = run(&tu);
        assert_eq!(diagnostics.len(), 1);
        let ReportContext::Path { method, .. } = &diagnostics[0].context else {
            panic!("expected a path report");
        };
        assert_eq!(method, "replaceBar");
        assert!(diagnostics[0].message.starts_with(
            "Leaking unsafe reference to self stored in _bar.delegate. "
        ));
    }

    #[test]
    fn test_field_write_over_known_null_is_suppressed() {
        let tu = fixtures::delegate_pair(vec![
            init_storing_self(),
            dealloc_clearing(),
            method(
                "ensureBar",
                vec![if_(not(field("_bar")), stmt(assign(field("_bar"), var("other"))), None)],
            ),
        ]);
        assert!(run(&tu).is_empty());
    }

    #[test]
    fn test_pseudo_init_starts_fully_cleared() {
        let tu = fixtures::delegate_pair(vec![
            init_storing_self(),
            dealloc_clearing(),
            method("setupViews", vec![stmt(assign(field("_bar"), var("other")))]),
        ]);
        assert!(run(&tu).is_empty());
    }

    #[test]
    fn test_guard_comparing_against_self_trusts_taken_branch() {
        let methods = vec![
            init_storing_self(),
            method(
                "dealloc",
                vec![
                    if_(
                        ne(getter(field("_bar"), "delegate"), self_ref()),
                        ret(None),
                        None,
                    ),
                    stmt(setter(field("_bar"), "delegate", nil())),
                ],
            ),
        ];
        let tu = fixtures::delegate_pair(methods);
        assert!(run(&tu).is_empty());

        let strict = DanglingDelegateChecker::new(DanglingDelegateConfig {
            assume_safe_branch: false,
            ..Default::default()
        });
        assert_eq!(run_with(&strict, &tu).len(), 1);
    }

    #[test]
    fn test_self_setter_verifies_then_clears() {
        let tu = fixtures::delegate_pair(vec![
            init_storing_self(),
            dealloc_clearing(),
            method("reset", vec![stmt(setter(self_ref(), "bar", nil()))]),
        ]);
        assert_eq!(run(&tu).len(), 1);

        let tu = fixtures::delegate_pair(vec![
            init_storing_self(),
            dealloc_clearing(),
            method(
                "reset",
                vec![
                    stmt(setter(getter(self_ref(), "bar"), "delegate", nil())),
                    stmt(setter(self_ref(), "bar", nil())),
                ],
            ),
        ]);
        assert!(run(&tu).is_empty());
    }

    #[test]
    fn test_manual_release_is_verified() {
        let leaking = fixtures::manual_release_pair(vec![
            init_storing_self(),
            method("dealloc", vec![stmt(msg(field("_bar"), "release", vec![]))]),
        ]);
        assert_eq!(run(&leaking).len(), 1);

        let clean = fixtures::manual_release_pair(vec![
            init_storing_self(),
            method(
                "dealloc",
                vec![
                    stmt(setter(field("_bar"), "delegate", nil())),
                    stmt(msg(field("_bar"), "release", vec![])),
                ],
            ),
        ]);
        assert!(run(&clean).is_empty());
    }

    #[test]
    fn test_message_to_known_null_field_is_ignored() {
        let tu = fixtures::manual_release_pair(vec![
            init_storing_self(),
            method(
                "dealloc",
                vec![if_(
                    eq(field("_bar"), nil()),
                    stmt(msg(field("_bar"), "release", vec![])),
                    None,
                )],
            ),
        ]);
        // the else path never releases, the then path releases nil
        let no_guards = DanglingDelegateChecker::new(DanglingDelegateConfig {
            assume_safe_branch: false,
            ..Default::default()
        });
        assert!(run_with(&no_guards, &tu).is_empty());

        let unsuppressed = DanglingDelegateChecker::new(DanglingDelegateConfig {
            assume_safe_branch: false,
            suppress_if_statically_null: false,
            ..Default::default()
        });
        assert_eq!(run_with(&unsuppressed, &tu).len(), 1);
    }

    #[test]
    fn test_class_without_interesting_fields_is_silent() {
        let tu = fixtures::delegate_pair(vec![
            method("init", vec![stmt(setter(field("_bar"), "owner", self_ref()))]),
            method("dealloc", vec![stmt(assign(field("_bar"), nil()))]),
        ]);
        assert!(run(&tu).is_empty());
    }

    #[test]
    fn test_unnamed_implementation_is_a_host_contract_error() {
        let tu = TranslationUnit::default();
        let index = DeclIndex::new(&tu);
        let manager = AnalysisManager::new(&index, &AnalysisSettings::default());
        let mut session = DelegateSession::default();
        let mut sink: Vec<Diagnostic> = Vec::new();
        let result = DanglingDelegateChecker::default().check_ast_decl(
            &mut session,
            &ImplementationDecl::default(),
            &manager,
            &mut sink,
        );
        assert!(matches!(result, Err(Error::HostContract(_))));
    }

    #[test]
    fn test_session_is_filled_once_and_cleared_at_end() {
        let tu = fixtures::delegate_pair(vec![init_storing_self()]);
        let index = DeclIndex::new(&tu);
        let manager = AnalysisManager::new(&index, &AnalysisSettings::default());
        let checker = DanglingDelegateChecker::default();
        let mut session = DelegateSession::default();
        let mut sink: Vec<Diagnostic> = Vec::new();

        for _ in 0..2 {
            checker
                .check_ast_decl(&mut session, &tu.implementations[0], &manager, &mut sink)
                .unwrap();
        }
        assert_eq!(session.cached_classes(), 1);
        assert_eq!(sink.len(), 1);

        checker.check_end_of_translation_unit(&mut session, &manager);
        assert_eq!(session.cached_classes(), 0);
    }

    #[test]
    fn test_remove_target_and_observer_passing_self_set_flags() {
        let tu = fixtures::delegate_pair(vec![method(
            "attach",
            vec![
                stmt(msg(
                    field("_bar"),
                    "addTarget:action:forControlEvents:",
                    vec![self_ref(), selector("tap:"), int(64)],
                )),
                stmt(msg(
                    field("_bar"),
                    "addObserver:forKeyPath:options:context:",
                    vec![self_ref(), var("path"), int(0), nil()],
                )),
            ],
        )]);
        let index = DeclIndex::new(&tu);
        let manager = AnalysisManager::new(&index, &AnalysisSettings::default());
        let checker = DanglingDelegateChecker::default();
        let mut session = DelegateSession::default();
        let mut sink: Vec<Diagnostic> = Vec::new();
        checker
            .check_ast_decl(&mut session, &tu.implementations[0], &manager, &mut sink)
            .unwrap();
        assert!(sink.is_empty());

        let detach = method("detach", vec![]);
        let store = Store::new();
        let bar = FieldId::new("_bar");
        let after_call = |expr: &Expr| -> DynamicState {
            let message = expr.as_message().unwrap();
            let event = CallEvent {
                expr,
                message,
                receiver: SVal::Unknown,
                args: message.args.iter().map(|arg| store.value_of(arg)).collect(),
                runtime_definition: None,
            };
            let mut ctx = CheckerContext::new(
                &manager,
                "Foo",
                &detach,
                NAME,
                0,
                &store,
                DelegatePathState::default(),
            );
            checker.check_post_call(&session, &event, &mut ctx);
            let (state, reports) = ctx.into_parts();
            assert!(reports.is_empty());
            state.field(&bar)
        };

        let remove_target = msg(
            field("_bar"),
            "removeTarget:action:forControlEvents:",
            vec![self_ref(), selector("tap:"), int(64)],
        );
        let state = after_call(&remove_target);
        assert!(state.target_cleared());
        assert!(!state.observer_cleared());

        let remove_observer = msg(
            field("_bar"),
            "removeObserver:forKeyPath:",
            vec![self_ref(), var("path")],
        );
        let state = after_call(&remove_observer);
        assert!(state.observer_cleared());
        assert!(!state.target_cleared());

        let other_target = msg(
            field("_bar"),
            "removeTarget:action:forControlEvents:",
            vec![var("other"), selector("tap:"), int(64)],
        );
        let other_observer = msg(
            field("_bar"),
            "removeObserver:forKeyPath:",
            vec![var("other"), var("path")],
        );
        assert_eq!(after_call(&other_target), DynamicState::default());
        assert_eq!(after_call(&other_observer), DynamicState::default());
    }

    #[test]
    fn test_nil_write_in_teardown_reports_once_per_path() {
        let tu = fixtures::delegate_pair(vec![
            init_storing_self(),
            method("dealloc", vec![stmt(assign(field("_bar"), nil()))]),
        ]);
        let diagnostics = run(&tu);
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].message.contains("automatic release"));

        let unsuppressed = DanglingDelegateChecker::new(DanglingDelegateConfig {
            suppress_if_statically_null: false,
            ..Default::default()
        });
        assert_eq!(run_with(&unsuppressed, &tu).len(), 2);
    }
}
