use serde::{Deserialize, Serialize};

/// Root configuration structure for delegatecheck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalyzerConfig {
    /// Path exploration limits and language overrides
    #[serde(default)]
    pub analysis: Option<AnalysisSettings>,

    /// Which checkers run
    #[serde(default)]
    pub checkers: Option<CheckersConfig>,

    /// Tuning for the dangling delegate checker
    #[serde(default)]
    pub dangling_delegate: Option<DanglingDelegateConfig>,
}

impl AnalyzerConfig {
    pub fn analysis(&self) -> AnalysisSettings {
        self.analysis.clone().unwrap_or_default()
    }

    pub fn checkers(&self) -> CheckersConfig {
        self.checkers.clone().unwrap_or_default()
    }

    pub fn dangling_delegate(&self) -> DanglingDelegateConfig {
        self.dangling_delegate.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Paths explored per method before the rest are abandoned
    #[serde(default = "default_max_paths_per_method")]
    pub max_paths_per_method: usize,

    /// Times a loop body is entered along one path
    #[serde(default = "default_max_loop_unroll")]
    pub max_loop_unroll: usize,

    /// Overrides the translation unit's own language options
    #[serde(default)]
    pub auto_release_fields: Option<bool>,
}

pub fn default_max_paths_per_method() -> usize {
    512
}

pub fn default_max_loop_unroll() -> usize {
    2
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_paths_per_method: default_max_paths_per_method(),
            max_loop_unroll: default_max_loop_unroll(),
            auto_release_fields: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckersConfig {
    /// When non-empty, only these checkers run
    #[serde(default)]
    pub enabled: Vec<String>,

    /// Checkers that never run, even if listed in `enabled`
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl CheckersConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        let listed = self.enabled.is_empty() || self.enabled.iter().any(|n| n == name);
        listed && !self.disabled.iter().any(|n| n == name)
    }
}

/// A class-level accessor returning a process-wide shared instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SingletonAccessor {
    pub class: String,
    pub selector: String,
}

impl SingletonAccessor {
    pub fn new(class: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            selector: selector.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DanglingDelegateConfig {
    /// Lowercase method-name prefixes treated as initialization code
    #[serde(default = "default_pseudo_init_prefixes")]
    pub pseudo_init_prefixes: Vec<String>,

    /// Selector of the destructor-equivalent method
    #[serde(default = "default_teardown_method")]
    pub teardown_method: String,

    /// Manual release operations that end our reference to a field's object
    #[serde(default = "default_release_selectors")]
    pub release_selectors: Vec<String>,

    #[serde(default = "default_add_target_prefix")]
    pub add_target_prefix: String,

    #[serde(default = "default_remove_target_prefix")]
    pub remove_target_prefix: String,

    #[serde(default = "default_add_observer_prefix")]
    pub add_observer_prefix: String,

    #[serde(default = "default_remove_observer_prefix")]
    pub remove_observer_prefix: String,

    #[serde(default = "default_singleton_accessors")]
    pub singleton_accessors: Vec<SingletonAccessor>,

    /// Trust run-time comparisons guarding a branch as proof of safety
    #[serde(default = "default_true")]
    pub assume_safe_branch: bool,

    /// Skip verification when the discarded value is known to be null
    #[serde(default = "default_true")]
    pub suppress_if_statically_null: bool,
}

pub fn default_pseudo_init_prefixes() -> Vec<String> {
    ["setup", "_setup", "load", "_load", "viewdidload", "_viewdidload"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_teardown_method() -> String {
    "dealloc".to_string()
}

pub fn default_release_selectors() -> Vec<String> {
    vec!["release".to_string(), "autorelease".to_string()]
}

pub fn default_add_target_prefix() -> String {
    "addTarget:".to_string()
}

pub fn default_remove_target_prefix() -> String {
    "removeTarget:".to_string()
}

pub fn default_add_observer_prefix() -> String {
    "addObserver:".to_string()
}

pub fn default_remove_observer_prefix() -> String {
    "removeObserver:".to_string()
}

pub fn default_singleton_accessors() -> Vec<SingletonAccessor> {
    vec![SingletonAccessor::new("NSNotificationCenter", "defaultCenter")]
}

fn default_true() -> bool {
    true
}

impl Default for DanglingDelegateConfig {
    fn default() -> Self {
        Self {
            pseudo_init_prefixes: default_pseudo_init_prefixes(),
            teardown_method: default_teardown_method(),
            release_selectors: default_release_selectors(),
            add_target_prefix: default_add_target_prefix(),
            remove_target_prefix: default_remove_target_prefix(),
            add_observer_prefix: default_add_observer_prefix(),
            remove_observer_prefix: default_remove_observer_prefix(),
            singleton_accessors: default_singleton_accessors(),
            assume_safe_branch: true,
            suppress_if_statically_null: true,
        }
    }
}

impl DanglingDelegateConfig {
    /// Case-insensitive prefix match against the configured list.
    pub fn is_pseudo_init_name(&self, method: &str) -> bool {
        let lowered = method.to_lowercase();
        self.pseudo_init_prefixes
            .iter()
            .any(|prefix| lowered.starts_with(&prefix.to_lowercase()))
    }

    pub fn is_release_selector(&self, selector: &str) -> bool {
        self.release_selectors.iter().any(|s| s == selector)
    }
}
