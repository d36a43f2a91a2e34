//! repo::diff
//!
//! What a commit changed relative to its first parent.
//!
//! # Steps
//!
//! ```text
//! Start -> CommitResolved -> ParentResolved -> TargetTreeResolved
//!       -> ParentTreeResolved -> Diffed
//! ```
//!
//! Each step either advances or fails with an error naming the commit and
//! its role. There are no partial results.

use tracing::debug;

use super::{CommitRole, RepoError, Repository};
use crate::core::types::Oid;
use crate::git::{Changes, LogOptions, ObjectStore};

impl<S: ObjectStore> Repository<S> {
    /// Changes introduced by `oid` relative to its first parent.
    ///
    /// # Errors
    ///
    /// - [`RepoError::CommitNotFound`] / [`RepoError::Commit`] if the commit
    ///   or its parent cannot be resolved (see [`RepoError::role`])
    /// - [`RepoError::MissingParent`] if `oid` is a root commit
    /// - [`RepoError::MissingTree`] if either tree cannot be resolved
    /// - [`RepoError::Diff`] if the tree diff fails
    pub fn diff(&self, oid: Oid) -> Result<Changes, RepoError> {
        let mut log = self.log(LogOptions::first_parent(oid))?;

        let commit = match log.next_raw() {
            Some(Ok(commit)) => commit,
            Some(Err(e)) => return Err(RepoError::commit(oid, CommitRole::Target, e)),
            None => {
                return Err(RepoError::CommitNotFound {
                    oid,
                    role: CommitRole::Target,
                })
            }
        };
        debug!(%oid, "resolved commit");

        let parent = match log.next_raw() {
            Some(Ok(parent)) => parent,
            Some(Err(e)) => {
                // Name the parent the commit records, not the one we failed to read
                let parent = commit.first_parent().copied().unwrap_or_default();
                return Err(RepoError::commit(parent, CommitRole::Parent, e));
            }
            None => return Err(RepoError::MissingParent { oid }),
        };
        log.close();
        debug!(%oid, parent = %parent.oid, "resolved parent");

        let tree = self
            .store
            .tree(&commit)
            .map_err(|source| RepoError::MissingTree {
                oid,
                role: CommitRole::Target,
                source,
            })?;
        debug!(%oid, tree = %tree.oid, "resolved tree");

        let parent_tree = self
            .store
            .tree(&parent)
            .map_err(|source| RepoError::MissingTree {
                oid: parent.oid,
                role: CommitRole::Parent,
                source,
            })?;
        debug!(parent = %parent.oid, tree = %parent_tree.oid, "resolved parent tree");

        let changes = self
            .store
            .diff_trees(&parent_tree, &tree)
            .map_err(|source| RepoError::Diff {
                commit: oid,
                parent: parent.oid,
                source,
            })?;
        debug!(%oid, changes = changes.len(), "diffed");

        Ok(changes)
    }
}
