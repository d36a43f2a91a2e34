//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$GITGRAPH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitgraph/config.toml`
//! 3. `~/.gitgraph/config.toml`
//!
//! # Repo Config
//!
//! Located at `<git-dir>/gitgraph/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected ranges (e.g., the rename threshold is a percentage).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// log_filter = "gitgraph=debug"
///
/// [walk]
/// first_parent = true
///
/// [diff]
/// detect_renames = true
/// rename_threshold = 60
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default `tracing` filter directive when `GITGRAPH_LOG` is unset
    pub log_filter: Option<String>,

    /// History walk defaults
    pub walk: Option<WalkConfig>,

    /// Tree diff defaults
    pub diff: Option<DiffConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(filter) = &self.log_filter {
            tracing_subscriber::EnvFilter::try_new(filter).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid log_filter '{}': {}", filter, e))
            })?;
        }

        if let Some(diff) = &self.diff {
            diff.validate()?;
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// [walk]
/// first_parent = false
///
/// [diff]
/// include_typechange = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// History walk overrides
    pub walk: Option<WalkConfig>,

    /// Tree diff overrides
    pub diff: Option<DiffConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(diff) = &self.diff {
            diff.validate()?;
        }
        Ok(())
    }
}

/// History walk settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WalkConfig {
    /// Follow only first parents when walking from a commit
    pub first_parent: Option<bool>,
}

/// Tree diff settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Pair deletions with additions of similar content as renames
    pub detect_renames: Option<bool>,

    /// Similarity percentage required to report a rename
    pub rename_threshold: Option<u16>,

    /// Report file-to-symlink (and similar) changes as type changes
    pub include_typechange: Option<bool>,
}

impl DiffConfig {
    /// Validate the diff settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threshold) = self.rename_threshold {
            if threshold > 100 {
                return Err(ConfigError::InvalidValue(format!(
                    "rename_threshold must be between 0 and 100, got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }
}
