//! repo
//!
//! Read-only queries over a repository's commit graph.
//!
//! # Architecture
//!
//! [`Repository`] wraps an [`ObjectStore`] and adds the policies callers
//! rely on:
//!
//! - [`refs`] - resolve and enumerate refs, group them by target commit
//! - [`walk`] - lazy commit logs with scoped release
//! - [`diff`] - what a commit changed relative to its first parent
//!
//! Errors from the store are classified into [`RepoError`] variants that
//! name the ref or commit involved.
//!
//! # Example
//!
//! ```no_run
//! use gitgraph::repo::Repository;
//! use std::path::Path;
//!
//! let repo = Repository::open(Path::new("."))?;
//! let head = repo.head()?;
//! for change in &repo.diff(head.target)? {
//!     println!("{} {}", change.kind.code(), change.path.display());
//! }
//! # Ok::<(), gitgraph::repo::RepoError>(())
//! ```

pub mod diff;
mod error;
pub mod refs;
pub mod walk;

pub use error::{CommitRole, ErrorKind, RepoError};
pub use refs::{ReferenceMap, References};
pub use walk::CommitLog;

use std::path::Path;

use tracing::{debug, warn};

use crate::core::config::Config;
use crate::git::{DiffSettings, Git, ObjectStore};

/// A repository handle.
///
/// Holds only the store and the default walk mode; every query builds its
/// result fresh.
#[derive(Debug, Clone)]
pub struct Repository<S> {
    store: S,
    first_parent: bool,
}

impl Repository<Git> {
    /// Open the repository containing `path`, loading its configuration.
    ///
    /// Config warnings are logged and otherwise ignored.
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        let git = Git::open(path).map_err(|source| RepoError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let loaded = Config::load(Some(git.git_dir()))?;
        for warning in &loaded.warnings {
            warn!(path = %warning.path.display(), "{}", warning.message);
        }

        Ok(Self::from_git(git, &loaded.config))
    }

    /// Open the repository containing `path` with explicit configuration.
    pub fn open_with_config(path: &Path, config: &Config) -> Result<Self, RepoError> {
        let git = Git::open(path).map_err(|source| RepoError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_git(git, config))
    }

    fn from_git(git: Git, config: &Config) -> Self {
        let git = git.with_diff_settings(DiffSettings::from_config(config));
        debug!(
            git_dir = %git.git_dir().display(),
            bare = git.is_bare(),
            first_parent = config.first_parent(),
            "opened repository"
        );
        Self {
            store: git,
            first_parent: config.first_parent(),
        }
    }
}

impl<S: ObjectStore> Repository<S> {
    /// Wrap a store, walking first parents by default.
    pub fn new(store: S) -> Self {
        Self {
            store,
            first_parent: true,
        }
    }

    /// Set the default walk mode used by [`Repository::log_from`].
    pub fn with_first_parent(mut self, first_parent: bool) -> Self {
        self.first_parent = first_parent;
        self
    }

    /// Whether [`Repository::log_from`] follows only first parents.
    pub fn first_parent(&self) -> bool {
        self.first_parent
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
