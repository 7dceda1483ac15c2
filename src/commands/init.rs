use crate::config::CONFIG_FILE_NAME;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = r#"# delegatecheck configuration

[analysis]
# Paths explored per method before the rest are abandoned
max_paths_per_method = 512
# Times a loop body is entered along one path
max_loop_unroll = 2
# Uncomment to override the language options recorded in each translation unit
# auto_release_fields = true

[checkers]
# When non-empty, only these checkers run
enabled = []
disabled = []

[dangling_delegate]
teardown_method = "dealloc"
pseudo_init_prefixes = ["setup", "_setup", "load", "_load", "viewdidload", "_viewdidload"]
release_selectors = ["release", "autorelease"]
add_target_prefix = "addTarget:"
remove_target_prefix = "removeTarget:"
add_observer_prefix = "addObserver:"
remove_observer_prefix = "removeObserver:"
# Trust run-time comparisons guarding a branch as proof of safety
assume_safe_branch = true
# Skip verification when the discarded value is known to be null
suppress_if_statically_null = true

[[dangling_delegate.singleton_accessors]]
class = "NSNotificationCenter"
selector = "defaultCenter"
"#;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = write_default_config(Path::new("."), force)?;
    println!("Created {} configuration file", config_path.display());
    Ok(())
}

pub fn write_default_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    log::debug!("Wrote default configuration to {}", config_path.display());
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_and_validate_config, AnalyzerConfig};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_matches_built_in_defaults() {
        let parsed = parse_and_validate_config(DEFAULT_CONFIG).unwrap();
        let defaults = AnalyzerConfig::default();
        assert_eq!(parsed.analysis(), defaults.analysis());
        assert_eq!(parsed.checkers(), defaults.checkers());
        assert_eq!(parsed.dangling_delegate(), defaults.dangling_delegate());
    }

    #[test]
    fn test_existing_file_needs_force() {
        let temp = TempDir::new().unwrap();
        write_default_config(temp.path(), false).unwrap();

        let err = write_default_config(temp.path(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let path = write_default_config(temp.path(), true).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), DEFAULT_CONFIG);
    }
}
