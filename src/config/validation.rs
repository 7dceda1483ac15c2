//! Validation with error accumulation for configuration.
//!
//! Every problem is collected before reporting so a user can fix the whole
//! file in one pass.

use super::core::{AnalysisSettings, AnalyzerConfig, DanglingDelegateConfig};
use crate::checkers::CheckerRegistry;

/// A single problem, with the dotted path of the offending key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate entire config, accumulating ALL errors.
pub fn validate_config(config: &AnalyzerConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();
    if let Some(analysis) = &config.analysis {
        validate_analysis(analysis, &mut errors);
    }
    if let Some(checkers) = &config.checkers {
        for (key, names) in [("enabled", &checkers.enabled), ("disabled", &checkers.disabled)] {
            for name in names {
                if !CheckerRegistry::is_known(name) {
                    errors.push(ConfigValidationError::new(
                        format!("checkers.{key}"),
                        format!("unknown checker '{name}'"),
                    ));
                }
            }
        }
    }
    if let Some(dangling) = &config.dangling_delegate {
        validate_dangling_delegate(dangling, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_analysis(analysis: &AnalysisSettings, errors: &mut Vec<ConfigValidationError>) {
    if analysis.max_paths_per_method == 0 {
        errors.push(ConfigValidationError::new(
            "analysis.max_paths_per_method",
            "must be at least 1",
        ));
    }
}

fn validate_dangling_delegate(
    config: &DanglingDelegateConfig,
    errors: &mut Vec<ConfigValidationError>,
) {
    if config.teardown_method.trim().is_empty() {
        errors.push(ConfigValidationError::new(
            "dangling_delegate.teardown_method",
            "must not be empty",
        ));
    }
    if config.pseudo_init_prefixes.iter().any(|p| p.trim().is_empty()) {
        errors.push(ConfigValidationError::new(
            "dangling_delegate.pseudo_init_prefixes",
            "entries must not be empty",
        ));
    }
    let prefixes = [
        ("add_target_prefix", &config.add_target_prefix),
        ("remove_target_prefix", &config.remove_target_prefix),
        ("add_observer_prefix", &config.add_observer_prefix),
        ("remove_observer_prefix", &config.remove_observer_prefix),
    ];
    for (key, value) in prefixes {
        if value.is_empty() {
            errors.push(ConfigValidationError::new(
                format!("dangling_delegate.{key}"),
                "must not be empty",
            ));
        }
    }
}

/// Render accumulated errors one per line.
pub fn format_config_errors(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
