//! repo::walk
//!
//! Lazy commit logs.
//!
//! # Resource scope
//!
//! A [`CommitLog`] owns whatever the store holds for the walk (a libgit2
//! revwalk, for the git2 store). It is released when the log is dropped,
//! which covers normal exhaustion, an early `break`, a `?` return and an
//! explicit [`CommitLog::close`].
//!
//! # Example
//!
//! ```
//! use std::ops::ControlFlow;
//! use gitgraph::git::mock::MockStore;
//! use gitgraph::repo::Repository;
//!
//! let store = MockStore::new();
//! let c1 = store.commit("first", &[], &[]);
//! let c2 = store.commit("second", &[c1], &[]);
//! let repo = Repository::new(store);
//!
//! let mut summaries = Vec::new();
//! let seen = repo
//!     .log_from(c2)?
//!     .for_each_commit(|commit| {
//!         summaries.push(commit.summary().to_string());
//!         ControlFlow::Continue(())
//!     })?;
//!
//! assert_eq!(seen, 2);
//! assert_eq!(summaries, ["second", "first"]);
//! # Ok::<(), gitgraph::repo::RepoError>(())
//! ```

use std::ops::ControlFlow;

use tracing::{debug, trace};

use super::{CommitRole, RepoError, Repository};
use crate::core::types::Oid;
use crate::git::{Commit, CommitIter, GitError, LogOptions, ObjectStore};

impl<S: ObjectStore> Repository<S> {
    /// Open a commit log.
    ///
    /// The starting commit is yielded first, then its ancestors.
    ///
    /// # Errors
    ///
    /// - [`RepoError::CommitNotFound`] if `options.from` is not a commit
    /// - [`RepoError::Commit`] if the store fails otherwise
    pub fn log(&self, options: LogOptions) -> Result<CommitLog<'_>, RepoError> {
        let inner = self
            .store
            .commit_log(&options)
            .map_err(|e| RepoError::commit(options.from, CommitRole::Target, e))?;

        debug!(
            from = %options.from,
            first_parent = options.first_parent,
            "opened commit log"
        );
        Ok(CommitLog {
            inner,
            from: options.from,
            yielded: 0,
        })
    }

    /// Open a commit log using the repository's default walk mode.
    pub fn log_from(&self, from: Oid) -> Result<CommitLog<'_>, RepoError> {
        self.log(LogOptions {
            from,
            first_parent: self.first_parent,
        })
    }

    /// Look up a single commit.
    pub fn find_commit(&self, oid: Oid) -> Result<Commit, RepoError> {
        let mut log = self.log(LogOptions::first_parent(oid))?;
        match log.next_raw() {
            Some(Ok(commit)) => Ok(commit),
            Some(Err(e)) => Err(RepoError::commit(oid, CommitRole::Target, e)),
            None => Err(RepoError::CommitNotFound {
                oid,
                role: CommitRole::Target,
            }),
        }
    }
}

/// A single-pass, lazy sequence of commits.
///
/// Created by [`Repository::log`]. Not restartable.
pub struct CommitLog<'a> {
    inner: CommitIter<'a>,
    from: Oid,
    yielded: usize,
}

impl CommitLog<'_> {
    /// The commit the walk started from.
    pub fn from(&self) -> Oid {
        self.from
    }

    /// Pull the next commit with the store's error intact.
    pub(crate) fn next_raw(&mut self) -> Option<Result<Commit, GitError>> {
        let next = self.inner.next()?;
        if let Ok(commit) = &next {
            self.yielded += 1;
            trace!(oid = %commit.oid, "walked commit");
        }
        Some(next)
    }

    /// Apply `f` to every remaining commit until it returns
    /// [`ControlFlow::Break`] or the log is exhausted.
    ///
    /// Returns how many commits were passed to `f`. The first store error
    /// stops the walk and is returned.
    pub fn for_each_commit<F>(mut self, mut f: F) -> Result<usize, RepoError>
    where
        F: FnMut(Commit) -> ControlFlow<()>,
    {
        let mut visited = 0;
        for commit in self.by_ref() {
            visited += 1;
            if f(commit?).is_break() {
                break;
            }
        }
        Ok(visited)
    }

    /// Release the walk now.
    pub fn close(self) {}
}

impl Iterator for CommitLog<'_> {
    type Item = Result<Commit, RepoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let from = self.from;
        self.next_raw()
            .map(|entry| entry.map_err(|source| RepoError::Walk { from, source }))
    }
}

impl Drop for CommitLog<'_> {
    fn drop(&mut self) {
        trace!(from = %self.from, yielded = self.yielded, "released commit log");
    }
}

impl std::fmt::Debug for CommitLog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitLog")
            .field("from", &self.from)
            .field("yielded", &self.yielded)
            .finish_non_exhaustive()
    }
}
