use super::facts::{ClassFacts, ClassFactsBuilder};
use super::matchers::{
    first_argument_is_self, match_field_lvalue, match_known_singleton_accessor,
    match_property_setter_call,
};
use crate::ast::{ClassScope, ExprKind, ImplementationDecl, MessageExpr, MethodDecl, MethodFamily};
use crate::checkers::walk::walk_exprs;
use crate::config::DanglingDelegateConfig;

/// How a method takes part in the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRole {
    /// A true initializer: starts from a cleared state, but is where the
    /// relationships are established, so its calls are still recorded.
    Initializer,
    /// Named like setup code: starts from a cleared state and contributes
    /// no facts.
    PseudoInit,
    Regular,
}

/// Scans the methods of one class implementation.
pub struct FactFinder<'a> {
    scope: ClassScope<'a>,
    config: &'a DanglingDelegateConfig,
    builder: ClassFactsBuilder,
}

impl<'a> FactFinder<'a> {
    pub fn new(scope: ClassScope<'a>, config: &'a DanglingDelegateConfig) -> Self {
        Self {
            scope,
            config,
            builder: ClassFacts::builder(),
        }
    }

    pub fn classify(&self, method: &MethodDecl) -> MethodRole {
        if method.family() == MethodFamily::Init {
            MethodRole::Initializer
        } else if self.config.is_pseudo_init_name(&method.selector) {
            MethodRole::PseudoInit
        } else {
            MethodRole::Regular
        }
    }

    pub fn visit_method(&mut self, method: &MethodDecl) {
        if method.selector == self.config.teardown_method {
            self.builder.teardown_method();
        }

        let role = self.classify(method);
        if role != MethodRole::Regular {
            self.builder.pseudo_init_method(&method.selector);
        }
        if role == MethodRole::PseudoInit {
            return;
        }

        if let Some(body) = &method.body {
            walk_exprs(body, &mut |expr| {
                if let ExprKind::Message(message) = &expr.kind {
                    self.visit_message(message, &method.selector);
                }
            });
        }
    }

    fn visit_message(&mut self, message: &MessageExpr, method: &str) {
        let Some(receiver) = message.instance_receiver() else {
            return;
        };
        if !first_argument_is_self(message) {
            return;
        }

        let selector = message.selector.as_str();
        if let Some(field) = match_field_lvalue(self.scope, receiver) {
            let unsafe_property = match_property_setter_call(self.scope, message)
                .filter(|property| property.ownership.is_unsafe());
            if let Some(property) = unsafe_property {
                self.builder
                    .field_may_store_self_in_unsafe_property(field, &property.name);
            } else if selector.starts_with(&self.config.add_target_prefix) {
                self.builder.field_may_target_self(field);
            } else if selector.starts_with(&self.config.add_observer_prefix) {
                self.builder.field_may_observe_self(field);
            }
            return;
        }

        if let Some(singleton) =
            match_known_singleton_accessor(receiver, &self.config.singleton_accessors)
        {
            if selector.starts_with(&self.config.add_observer_prefix) {
                self.builder
                    .shared_object_may_observe_self_in_method(&singleton, method);
            }
        }
    }

    pub fn finish(self) -> ClassFacts {
        self.builder.build()
    }
}

/// Facts for one implementation, every method visited once.
pub fn find_class_facts(
    scope: ClassScope<'_>,
    decl: &ImplementationDecl,
    config: &DanglingDelegateConfig,
) -> ClassFacts {
    let mut finder = FactFinder::new(scope, config);
    for method in &decl.methods {
        finder.visit_method(method);
    }
    finder.finish()
}
