//! repo::error
//!
//! Errors from repository queries.
//!
//! Each variant names the ref or commit involved so a caller can report
//! precisely what failed. [`RepoError::kind`] collapses them into the small
//! set of categories callers branch on.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::types::Oid;
use crate::git::GitError;

/// Which commit of a diff an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitRole {
    /// The commit that was asked about
    Target,
    /// Its first parent
    Parent,
}

impl fmt::Display for CommitRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitRole::Target => write!(f, "target"),
            CommitRole::Parent => write!(f, "parent"),
        }
    }
}

/// Broad category of a [`RepoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested ref or commit does not exist.
    NotFound,
    /// The store failed while resolving a ref or commit.
    ResolutionFailure,
    /// The commit has no parent to diff against.
    MissingParent,
    /// A commit's root tree could not be resolved.
    MissingTree,
    /// Computing the tree diff failed.
    DiffFailure,
    /// Configuration could not be loaded.
    Configuration,
}

/// Errors from repository queries.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Repository could not be opened.
    #[error("failed to open repository at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: GitError,
    },

    /// Configuration failed to load.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No ref by that name.
    #[error("reference not found: {name}")]
    ReferenceNotFound { name: String },

    /// The store failed while resolving a ref.
    #[error("failed to resolve reference {name}: {source}")]
    Reference {
        name: String,
        #[source]
        source: GitError,
    },

    /// The reference enumeration could not be opened.
    #[error("failed to list references: {source}")]
    ReferenceListing {
        #[source]
        source: GitError,
    },

    /// No commit with that id.
    #[error("{role} commit not found: {oid}")]
    CommitNotFound { oid: Oid, role: CommitRole },

    /// The store failed while resolving a commit.
    #[error("failed to resolve {role} commit {oid}: {source}")]
    Commit {
        oid: Oid,
        role: CommitRole,
        #[source]
        source: GitError,
    },

    /// A commit log failed partway through.
    #[error("commit walk from {from} failed: {source}")]
    Walk {
        from: Oid,
        #[source]
        source: GitError,
    },

    /// The commit is a root commit.
    #[error("commit {oid} has no parent")]
    MissingParent { oid: Oid },

    /// A commit's tree could not be resolved.
    #[error("failed to resolve tree of {role} commit {oid}: {source}")]
    MissingTree {
        oid: Oid,
        role: CommitRole,
        #[source]
        source: GitError,
    },

    /// Diffing the two trees failed.
    #[error("failed to diff {commit} against parent {parent}: {source}")]
    Diff {
        commit: Oid,
        parent: Oid,
        #[source]
        source: GitError,
    },
}

impl RepoError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::ReferenceNotFound { .. } | RepoError::CommitNotFound { .. } => {
                ErrorKind::NotFound
            }
            RepoError::Open { .. }
            | RepoError::Reference { .. }
            | RepoError::ReferenceListing { .. }
            | RepoError::Commit { .. }
            | RepoError::Walk { .. } => ErrorKind::ResolutionFailure,
            RepoError::MissingParent { .. } => ErrorKind::MissingParent,
            RepoError::MissingTree { .. } => ErrorKind::MissingTree,
            RepoError::Diff { .. } => ErrorKind::DiffFailure,
            RepoError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// The commit this error is about, if any.
    pub fn oid(&self) -> Option<&Oid> {
        match self {
            RepoError::CommitNotFound { oid, .. }
            | RepoError::Commit { oid, .. }
            | RepoError::MissingParent { oid }
            | RepoError::MissingTree { oid, .. } => Some(oid),
            RepoError::Walk { from, .. } => Some(from),
            RepoError::Diff { commit, .. } => Some(commit),
            _ => None,
        }
    }

    /// Which commit of a diff the error concerns, if it concerns one.
    pub fn role(&self) -> Option<CommitRole> {
        match self {
            RepoError::CommitNotFound { role, .. }
            | RepoError::Commit { role, .. }
            | RepoError::MissingTree { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Classify a failure to resolve a ref.
    pub(crate) fn reference(name: &str, source: GitError) -> Self {
        if source.is_not_found() {
            RepoError::ReferenceNotFound {
                name: name.to_string(),
            }
        } else {
            RepoError::Reference {
                name: name.to_string(),
                source,
            }
        }
    }

    /// Classify a failure to resolve a commit.
    pub(crate) fn commit(oid: Oid, role: CommitRole, source: GitError) -> Self {
        if source.is_not_found() {
            RepoError::CommitNotFound { oid, role }
        } else {
            RepoError::Commit { oid, role, source }
        }
    }
}
