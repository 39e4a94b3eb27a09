//! Run configuration.
//!
//! # Sources
//!
//! ```text
//! <repo>/.fmtgate.yaml      (optional, every key optional)
//! ~/.cache/fmtgate/         (default cache root)
//! ```
//!
//! Precedence is CLI override > config file > built-in default.
//!
//! # API pattern
//!
//! Like the rest of the workspace, functions that need the home directory come
//! in two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

/// File name of the per-repository config file.
pub const CONFIG_FILE: &str = ".fmtgate.yaml";

/// Reference whose merge base delimits the change-set.
pub const DEFAULT_BASELINE: &str = "origin/main";

/// Paths the project exempts from every tool. Vendored state-machine header.
pub const DEFAULT_IGNORE: &[&str] = &["atos/modules/ObjectControl/inc/sml.hpp"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// On-disk shape of `.fmtgate.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// Values supplied on the command line; `None` defers to lower layers.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub baseline: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub baseline: String,
    pub ignore: Vec<String>,
    pub cache_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<repo>/.fmtgate.yaml`. Pure, no I/O.
pub fn config_path_at(repo_root: &Path) -> PathBuf {
    repo_root.join(CONFIG_FILE)
}

/// `<home>/.cache/fmtgate`
pub fn default_cache_root_at(home: &Path) -> PathBuf {
    home.join(".cache").join("fmtgate")
}

// ---------------------------------------------------------------------------
// Load / resolve
// ---------------------------------------------------------------------------

/// Load `.fmtgate.yaml` from `repo_root`, or `None` when absent.
///
/// Returns `ConfigError::Parse` (with path + line context) if malformed.
pub fn load_file_at(repo_root: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    let path = config_path_at(repo_root);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    // An empty file is a valid "all defaults" config.
    if contents.trim().is_empty() {
        return Ok(Some(ConfigFile::default()));
    }
    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|e| ConfigError::Parse { path, source: e })
}

/// Resolve configuration for `repo_root` with an explicit `home`.
///
/// `home` is only consulted when neither the overrides nor the config file
/// name a cache directory; pass `None` to model a missing home directory.
pub fn resolve_at(
    repo_root: &Path,
    home: Option<&Path>,
    overrides: Overrides,
) -> Result<Config, ConfigError> {
    let file = load_file_at(repo_root)?.unwrap_or_default();

    let baseline = overrides
        .baseline
        .or(file.baseline)
        .unwrap_or_else(|| DEFAULT_BASELINE.to_string());

    let ignore = file
        .ignore
        .unwrap_or_else(|| DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect());

    let cache_dir = match (overrides.cache_dir, file.cache_dir) {
        (Some(dir), _) => dir,
        // Relative entries in the config file are relative to the repo.
        (None, Some(dir)) if dir.is_relative() => repo_root.join(dir),
        (None, Some(dir)) => dir,
        (None, None) => default_cache_root_at(home.ok_or(ConfigError::HomeNotFound)?),
    };

    tracing::debug!(
        "config: baseline={baseline} ignore={} cache_dir={}",
        ignore.len(),
        cache_dir.display()
    );

    Ok(Config {
        baseline,
        ignore,
        cache_dir,
    })
}

/// `resolve_at` convenience wrapper using `dirs::home_dir()`.
pub fn resolve(repo_root: &Path, overrides: Overrides) -> Result<Config, ConfigError> {
    let home = dirs::home_dir();
    resolve_at(repo_root, home.as_deref(), overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_config_file_missing() {
        let repo = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let config = resolve_at(repo.path(), Some(home.path()), Overrides::default()).unwrap();
        assert_eq!(config.baseline, "origin/main");
        assert_eq!(config.ignore, vec![DEFAULT_IGNORE[0].to_string()]);
        assert_eq!(
            config.cache_dir,
            home.path().join(".cache").join("fmtgate")
        );
    }

    #[test]
    fn missing_home_is_an_error_only_when_needed() {
        let repo = TempDir::new().unwrap();
        let err = resolve_at(repo.path(), None, Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::HomeNotFound));

        let overrides = Overrides {
            cache_dir: Some(PathBuf::from("/opt/cache")),
            ..Overrides::default()
        };
        let config = resolve_at(repo.path(), None, overrides).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/opt/cache"));
    }

    #[test]
    fn empty_config_file_means_defaults() {
        let repo = TempDir::new().unwrap();
        std::fs::write(config_path_at(repo.path()), "\n").unwrap();
        let loaded = load_file_at(repo.path()).unwrap();
        assert_eq!(loaded, Some(ConfigFile::default()));
    }
}
