// Core configuration types
mod core;
mod loader;
pub mod validation;

// Re-export core types
pub use self::core::{
    default_max_loop_unroll, default_max_paths_per_method, default_pseudo_init_prefixes,
    default_release_selectors, default_singleton_accessors, default_teardown_method,
    AnalysisSettings, AnalyzerConfig, CheckersConfig, DanglingDelegateConfig, SingletonAccessor,
};

// Re-export loader functions
pub use loader::{
    directory_ancestors, discover_config, load_config, load_config_from_path,
    parse_and_validate_config, CONFIG_FILE_NAME,
};

pub use validation::{format_config_errors, validate_config, ConfigValidationError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkers_enabled_by_default() {
        let checkers = CheckersConfig::default();
        assert!(checkers.is_enabled("memory.DanglingDelegate"));
    }

    #[test]
    fn test_disabled_wins_over_enabled() {
        let checkers = CheckersConfig {
            enabled: vec!["memory.DanglingDelegate".into()],
            disabled: vec!["memory.DanglingDelegate".into()],
        };
        assert!(!checkers.is_enabled("memory.DanglingDelegate"));
    }

    #[test]
    fn test_enabled_list_restricts() {
        let checkers = CheckersConfig {
            enabled: vec!["memory.DanglingDelegate".into()],
            disabled: vec![],
        };
        assert!(!checkers.is_enabled("logic.DoubleBooleanArgument"));
    }

    #[test]
    fn test_pseudo_init_prefixes_are_case_insensitive() {
        let config = DanglingDelegateConfig::default();
        assert!(config.is_pseudo_init_name("setupBar"));
        assert!(config.is_pseudo_init_name("viewDidLoad"));
        assert!(config.is_pseudo_init_name("_loadContents"));
        assert!(config.is_pseudo_init_name("SetUpView"));
        assert!(!config.is_pseudo_init_name("settings"));
        assert!(!config.is_pseudo_init_name("dealloc"));
    }
}
