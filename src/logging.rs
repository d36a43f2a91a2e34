//! logging
//!
//! Structured diagnostics via `tracing`.
//!
//! The library only emits events; nothing is printed unless the embedding
//! program installs a subscriber. [`init`] installs the usual one: a compact
//! fmt layer on stderr filtered by `$GITGRAPH_LOG`, falling back to the
//! configured default filter.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;

/// Environment variable holding filter directives, e.g. `gitgraph=debug`.
pub const LOG_ENV: &str = "GITGRAPH_LOG";

/// Errors from subscriber installation.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("failed to install log subscriber: {message}")]
    AlreadyInstalled { message: String },
}

/// Install a global subscriber.
///
/// `$GITGRAPH_LOG` takes precedence over `default_filter` when it is set
/// and parses. Fails if a global subscriber is already installed.
pub fn init(default_filter: &str) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| LoggingError::InvalidFilter {
            filter: default_filter.to_string(),
            message: e.to_string(),
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled {
            message: e.to_string(),
        })
}

/// Install a global subscriber using the configured `log_filter`.
pub fn init_from_config(config: &Config) -> Result<(), LoggingError> {
    init(config.log_filter())
}
