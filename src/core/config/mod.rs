//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! gitgraph has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides, stored inside the git directory
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITGRAPH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitgraph/config.toml`
//! 3. `~/.gitgraph/config.toml`
//!
//! # Repo Config Location
//!
//! `<git-dir>/gitgraph/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use gitgraph::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! let config = result.config;
//!
//! println!("first-parent walks: {}", config.first_parent());
//! println!("rename detection: {}", config.detect_renames());
//! ```

pub mod schema;

pub use schema::{DiffConfig, GlobalConfig, RepoConfig, WalkConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "GITGRAPH_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules automatically: repo config
/// overrides global config, which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if one was found)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Default rename similarity threshold, in percent.
    pub const DEFAULT_RENAME_THRESHOLD: u16 = 50;

    /// Default log filter directive.
    pub const DEFAULT_LOG_FILTER: &'static str = "info";

    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads that repository's config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(git_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();
        let global_path = Self::find_global(&mut warnings);
        let mut result = Self::load_files(global_path.as_deref(), git_dir)?;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }

    /// Load configuration from an explicit global file and git directory.
    ///
    /// Either may be `None`. A global path that does not exist is treated
    /// as absent.
    pub fn load_files(
        global_path: Option<&Path>,
        git_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = match global_path.filter(|p| p.exists()) {
            Some(path) => (read_toml::<GlobalConfig>(path)?, Some(path.to_path_buf())),
            None => (GlobalConfig::default(), None),
        };

        let (repo, repo_path) = match git_dir.map(Self::repo_config_path) {
            Some(path) if path.exists() => (Some(read_toml::<RepoConfig>(&path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path,
            },
            warnings: Vec::new(),
        })
    }

    /// Locate the global config file.
    fn find_global(warnings: &mut Vec<ConfigWarning>) -> Option<PathBuf> {
        // 1. Check $GITGRAPH_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            warnings.push(ConfigWarning {
                message: format!("{} points at a missing file, ignoring it", CONFIG_ENV),
                path,
            });
        }

        // 2. Check $XDG_CONFIG_HOME/gitgraph/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitgraph/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.gitgraph/config.toml
        dirs::home_dir()
            .map(|home| home.join(".gitgraph/config.toml"))
            .filter(|path| path.exists())
    }

    /// Get the canonical path for a repository's config.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("gitgraph/config.toml")
    }

    /// Path of the global config file that was loaded, if any.
    pub fn global_path(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Path of the repo config file that was loaded, if any.
    pub fn repo_path(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn walk(&self) -> impl Iterator<Item = &WalkConfig> {
        let repo = self.repo.as_ref().and_then(|r| r.walk.as_ref());
        repo.into_iter().chain(self.global.walk.as_ref())
    }

    fn diff(&self) -> impl Iterator<Item = &DiffConfig> {
        let repo = self.repo.as_ref().and_then(|r| r.diff.as_ref());
        repo.into_iter().chain(self.global.diff.as_ref())
    }

    /// Whether history walks follow only first parents.
    ///
    /// Defaults to `true` if not configured.
    pub fn first_parent(&self) -> bool {
        self.walk().find_map(|w| w.first_parent).unwrap_or(true)
    }

    /// Whether tree diffs detect renames.
    ///
    /// Defaults to `false` if not configured.
    pub fn detect_renames(&self) -> bool {
        self.diff().find_map(|d| d.detect_renames).unwrap_or(false)
    }

    /// Similarity threshold for rename detection.
    ///
    /// Defaults to [`Config::DEFAULT_RENAME_THRESHOLD`] if not configured.
    pub fn rename_threshold(&self) -> u16 {
        self.diff()
            .find_map(|d| d.rename_threshold)
            .unwrap_or(Self::DEFAULT_RENAME_THRESHOLD)
    }

    /// Whether tree diffs report type changes.
    ///
    /// Defaults to `true` if not configured.
    pub fn include_typechange(&self) -> bool {
        self.diff().find_map(|d| d.include_typechange).unwrap_or(true)
    }

    /// Default log filter directive.
    ///
    /// Defaults to [`Config::DEFAULT_LOG_FILTER`] if not configured.
    pub fn log_filter(&self) -> &str {
        self.global
            .log_filter
            .as_deref()
            .unwrap_or(Self::DEFAULT_LOG_FILTER)
    }
}

/// Read and parse a TOML config file.
fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
