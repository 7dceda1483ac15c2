use delegatecheck::assert_findings;
use delegatecheck::ast::{MethodSignature, StorageClass, TypeRef};
use delegatecheck::checkers::{responds_to_selector, CheckerRegistry};
use delegatecheck::config::{AnalyzerConfig, CheckersConfig};
use delegatecheck::testkit::{fixtures, helpers::*};
use pretty_assertions::assert_eq;

fn syntactic_only() -> CheckerRegistry {
    CheckerRegistry::from_config(&AnalyzerConfig {
        checkers: Some(CheckersConfig {
            enabled: vec![],
            disabled: vec!["memory.DanglingDelegate".into()],
        }),
        ..Default::default()
    })
}

#[test]
fn test_dispatch_once_predicates_by_storage() {
    let mut tu = fixtures::delegate_pair(vec![method(
        "shared",
        vec![
            local("onceToken", TypeRef::scalar("dispatch_once_t"), None),
            stmt(call("dispatch_once", vec![var("onceToken"), var("block")])),
        ],
    )]);
    tu.globals.push(var_decl(
        "sharedToken",
        TypeRef::scalar("dispatch_once_t"),
        StorageClass::Global,
        None,
    ));

    let summary = syntactic_only().run(&tu);
    assert_eq!(summary.diagnostics.len(), 1);
    assert_eq!(summary.diagnostics[0].checker, "semantic.DispatchOnceStorage");
    assert!(summary.diagnostics[0].message.contains("statically allocated dispatch_once_t"));
}

#[test]
fn test_repeated_operands_in_nested_conditions() {
    let tu = fixtures::delegate_pair(vec![method(
        "refresh",
        vec![
            if_(
                and(var("ready"), paren(or(var("dirty"), var("dirty")))),
                ret(None),
                None,
            ),
            while_(and(var("more"), var("other")), stmt(call("step", vec![]))),
        ],
    )]);
    let summary = syntactic_only().run(&tu);
    assert_findings!(summary.diagnostics, "argument dirty more than once", 1);
    assert_eq!(summary.diagnostics.len(), 1);
}

#[test]
fn test_responds_to_selector_misspelling_and_declared_methods() {
    let mut tu = fixtures::delegate_pair(vec![method(
        "notify",
        vec![
            if_(
                msg(var("d"), "respondsToSelector:", vec![selector("barDidFinish:")]),
                stmt(msg(var("d"), "barDidFnish:", vec![self_ref()])),
                None,
            ),
            if_(
                msg(
                    typed_var("b", TypeRef::object("SubBar")),
                    "respondsToSelector:",
                    vec![selector("barDidFinish:")],
                ),
                stmt(msg(typed_var("b", TypeRef::object("SubBar")), "reload", vec![])),
                None,
            ),
        ],
    )]);
    tu.interfaces[0].methods.push(MethodSignature {
        selector: "reload".into(),
        kind: Default::default(),
    });

    let summary = syntactic_only().run(&tu);
    assert_eq!(summary.diagnostics.len(), 1);
    let found = &summary.diagnostics[0];
    assert_eq!(found.checker, responds_to_selector::NAME);
    assert!(found.message.contains("subsequently selector barDidFnish: is used"));
}
