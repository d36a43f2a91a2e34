//! git::traits
//!
//! The object-store boundary.
//!
//! # Design
//!
//! [`ObjectStore`] is the only thing the traversal and diff logic in
//! [`crate::repo`] knows about storage. It is deliberately small: resolve
//! refs, enumerate refs, open a commit log, fetch a commit's tree, and diff
//! two trees. Everything else (object decoding, packfiles, compression)
//! stays behind the implementation.
//!
//! There are two implementations:
//! - [`Git`](super::Git): libgit2 via the `git2` crate
//! - [`MockStore`](super::mock::MockStore): in-memory, for deterministic tests
//!
//! All methods are synchronous and read-only. Whether a store may be used
//! from several threads at once is the implementation's contract, expressed
//! through its `Send`/`Sync` impls.

use std::path::PathBuf;

use thiserror::Error;

use super::object::{Changes, Commit, Reference, Tree};
use crate::core::types::{Oid, TypeError};

/// Errors from object-store operations.
///
/// These categories are what the core needs to tell apart: a missing
/// ref or object is reported distinctly from I/O or corruption.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal store error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Whether the error means "nothing by that name/id exists".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::RefNotFound { .. } | GitError::ObjectNotFound { .. }
        )
    }

    /// Shorthand for a missing object.
    pub fn object_not_found(oid: &Oid) -> Self {
        GitError::ObjectNotFound {
            oid: oid.to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// A single reference that could not be resolved during enumeration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{source}")]
pub struct ReferenceEntryError {
    /// Name of the ref, when the store could read one
    pub name: Option<String>,
    #[source]
    pub source: GitError,
}

impl ReferenceEntryError {
    /// An entry whose name is known.
    pub fn named(name: impl Into<String>, source: GitError) -> Self {
        Self {
            name: Some(name.into()),
            source,
        }
    }
}

/// Options for opening a commit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Commit to start from (yielded first)
    pub from: Oid,
    /// Follow only first parents instead of the full ancestry
    pub first_parent: bool,
}

impl LogOptions {
    /// Walk the first-parent chain from `from`.
    pub fn first_parent(from: Oid) -> Self {
        Self {
            from,
            first_parent: true,
        }
    }

    /// Walk every ancestor of `from`.
    pub fn full(from: Oid) -> Self {
        Self {
            from,
            first_parent: false,
        }
    }
}

/// Lazy sequence of references produced by a store.
pub type ReferenceIter<'a> =
    Box<dyn Iterator<Item = Result<Reference, ReferenceEntryError>> + 'a>;

/// Lazy sequence of commits produced by a store.
///
/// Dropping the iterator releases whatever the store holds for the walk.
pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<Commit, GitError>> + 'a>;

/// Read-only access to a repository's objects and refs.
pub trait ObjectStore {
    /// The reference HEAD currently resolves to.
    ///
    /// Attached HEAD yields the branch ref; detached HEAD yields `HEAD`.
    fn head(&self) -> Result<Reference, GitError>;

    /// Look up a reference by full or short name.
    fn reference(&self, name: &str) -> Result<Reference, GitError>;

    /// Enumerate every reference, excluding the `HEAD` pseudo-ref.
    ///
    /// An `Err` return means the enumeration could not be opened; `Err`
    /// items mean a single entry could not be resolved, and carry its name
    /// when the store read one.
    fn references(&self) -> Result<ReferenceIter<'_>, GitError>;

    /// Open a walk starting at `options.from`.
    ///
    /// Fails up front if `from` does not name a commit.
    fn commit_log(&self, options: &LogOptions) -> Result<CommitIter<'_>, GitError>;

    /// Resolve a commit's root tree.
    fn tree(&self, commit: &Commit) -> Result<Tree, GitError>;

    /// Compute the changes that turn `before` into `after`.
    fn diff_trees(&self, before: &Tree, after: &Tree) -> Result<Changes, GitError>;
}
