use super::context::AnalysisManager;
use super::explorer::{ExplorationStats, PathExplorer};
use super::PathChecker;
use crate::ast::{DeclIndex, TranslationUnit};
use crate::config::AnalysisSettings;
use crate::diagnostics::DiagnosticSink;
use tracing::{debug_span, warn};

/// Runs one path-sensitive checker over a whole translation unit.
///
/// Every implementation is scanned before any method is explored, and the
/// checker's session is handed back to it for cleanup at the end.
pub fn run_path_checker<C: PathChecker>(
    checker: &C,
    tu: &TranslationUnit,
    settings: &AnalysisSettings,
    sink: &mut dyn DiagnosticSink,
) -> ExplorationStats {
    let index = DeclIndex::new(tu);
    let manager = AnalysisManager::new(&index, settings);
    let mut session = C::Session::default();

    for implementation in &tu.implementations {
        let _span = debug_span!(
            "check_ast_decl",
            checker = checker.name(),
            class = %implementation.name
        )
        .entered();
        if let Err(e) = checker.check_ast_decl(&mut session, implementation, &manager, sink) {
            warn!("{} skipped a declaration in {}: {}", checker.name(), tu.path, e);
        }
    }

    let mut stats = ExplorationStats::default();
    for implementation in &tu.implementations {
        for method in implementation.methods.iter().filter(|m| m.body.is_some()) {
            let _span = debug_span!(
                "explore_method",
                checker = checker.name(),
                class = %implementation.name,
                method = %method.selector
            )
            .entered();
            stats += PathExplorer::new(
                checker,
                &session,
                &manager,
                &implementation.name,
                method,
                &mut *sink,
            )
            .explore();
        }
    }

    checker.check_end_of_translation_unit(&mut session, &manager);
    stats
}
