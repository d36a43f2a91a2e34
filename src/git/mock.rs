//! git::mock
//!
//! In-memory object store for deterministic testing.
//!
//! # Design
//!
//! The mock store keeps commits, trees and refs in memory and implements
//! [`ObjectStore`] over them. Object ids are content-addressed (SHA-256 of
//! a canonical encoding, truncated to 20 bytes), so building the same
//! history twice yields the same ids. Failure scenarios are configured
//! with [`FailOn`], and the number of open commit logs is tracked so tests
//! can verify that every walk was released.
//!
//! # Example
//!
//! ```
//! use gitgraph::git::mock::MockStore;
//! use gitgraph::git::{LogOptions, ObjectStore};
//!
//! let store = MockStore::new();
//! let c1 = store.commit("Initial commit", &[], &[("README.md", "# Demo\n")]);
//! let c2 = store.commit("Add lib", &[c1], &[("README.md", "# Demo\n"), ("lib.rs", "")]);
//! store.set_branch("main", c2);
//!
//! assert_eq!(store.head().unwrap().target, c2);
//!
//! let log: Vec<_> = store
//!     .commit_log(&LogOptions::first_parent(c2))
//!     .unwrap()
//!     .map(|c| c.unwrap().oid)
//!     .collect();
//! assert_eq!(log, vec![c2, c1]);
//! assert_eq!(store.open_logs(), 0);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::DateTime;
use sha2::{Digest, Sha256};

use super::object::{Change, ChangeKind, Changes, Commit, Reference, Signature, Tree};
use super::traits::{
    CommitIter, GitError, LogOptions, ObjectStore, ReferenceEntryError, ReferenceIter,
};
use crate::core::types::{Oid, RefName};

/// Timestamp of the first mock commit; each later commit is one second newer.
const EPOCH: i64 = 1_700_000_000;

/// Mock object store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockStoreInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockStoreInner {
    /// Commits by OID.
    commits: HashMap<Oid, Commit>,
    /// Tree snapshots: path -> blob OID.
    trees: HashMap<Oid, BTreeMap<String, Oid>>,
    /// Refs by full name. Names are validated when read, not when set.
    refs: BTreeMap<String, Oid>,
    head: MockHead,
    /// Injected failures.
    failures: Vec<FailOn>,
    /// Commit logs currently alive.
    open_logs: usize,
    /// Commits created so far; drives timestamps.
    clock: i64,
}

/// Where HEAD points.
#[derive(Debug, Clone)]
enum MockHead {
    Symbolic(String),
    Detached(Oid),
}

impl Default for MockHead {
    fn default() -> Self {
        MockHead::Symbolic("refs/heads/main".to_string())
    }
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail opening the reference enumeration.
    References(GitError),
    /// Yield the error in place of the named ref during enumeration.
    ReferenceEntry { name: String, error: GitError },
    /// Fail the walk step that would yield this commit.
    WalkStep { oid: Oid, error: GitError },
    /// Fail resolving the tree of this commit.
    Tree { commit: Oid, error: GitError },
    /// Fail every tree diff.
    DiffTrees(GitError),
}

impl MockStore {
    /// Create an empty store with HEAD on an unborn `main`.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockStoreInner> {
        lock(&self.inner)
    }

    /// Record a commit whose tree holds exactly `files` (path, contents).
    ///
    /// Returns the new commit's OID. Parents need not exist, which lets
    /// tests model a store with missing objects.
    pub fn commit(&self, message: &str, parents: &[Oid], files: &[(&str, &str)]) -> Oid {
        let mut inner = self.lock();

        let entries: BTreeMap<String, Oid> = files
            .iter()
            .map(|(path, contents)| (path.to_string(), content_oid(&["blob", contents])))
            .collect();
        let tree_text: Vec<String> = entries
            .iter()
            .map(|(path, oid)| format!("{oid} {path}"))
            .collect();
        let tree = content_oid(&["tree", &tree_text.join("\n")]);
        inner.trees.insert(tree, entries);

        let when = DateTime::from_timestamp(EPOCH + inner.clock, 0).unwrap_or(DateTime::UNIX_EPOCH);
        inner.clock += 1;

        let parent_text: Vec<String> = parents.iter().map(Oid::to_hex).collect();
        let oid = content_oid(&[
            "commit",
            &tree.to_hex(),
            &parent_text.join(" "),
            &when.timestamp().to_string(),
            message,
        ]);

        let signature = Signature {
            name: "Mock Author".to_string(),
            email: "mock@example.com".to_string(),
            when,
        };
        inner.commits.insert(
            oid,
            Commit {
                oid,
                tree,
                parents: parents.to_vec(),
                message: message.to_string(),
                author: signature.clone(),
                committer: signature,
            },
        );

        oid
    }

    /// Point a ref (full name) at a target.
    pub fn set_ref(&self, name: &str, target: Oid) {
        self.lock().refs.insert(name.to_string(), target);
    }

    /// Point `refs/heads/<name>` at a target.
    pub fn set_branch(&self, name: &str, target: Oid) {
        self.set_ref(&format!("refs/heads/{name}"), target);
    }

    /// Remove a ref.
    pub fn delete_ref(&self, name: &str) {
        self.lock().refs.remove(name);
    }

    /// Attach HEAD to a ref (full name).
    pub fn set_head(&self, refname: &str) {
        self.lock().head = MockHead::Symbolic(refname.to_string());
    }

    /// Detach HEAD at a commit.
    pub fn detach_head(&self, oid: Oid) {
        self.lock().head = MockHead::Detached(oid);
    }

    /// Inject a failure.
    pub fn fail_on(&self, failure: FailOn) {
        self.lock().failures.push(failure);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Number of commit logs opened and not yet dropped.
    pub fn open_logs(&self) -> usize {
        self.lock().open_logs
    }

    /// Number of commits in the store.
    pub fn commit_count(&self) -> usize {
        self.lock().commits.len()
    }
}

impl MockStoreInner {
    fn failure(&self, select: impl Fn(&FailOn) -> Option<&GitError>) -> Option<GitError> {
        self.failures.iter().find_map(select).cloned()
    }

    fn resolve_head(&self) -> Result<Reference, GitError> {
        let unborn = || GitError::RefNotFound {
            refname: "HEAD".to_string(),
        };
        match &self.head {
            MockHead::Symbolic(name) => {
                let target = self.refs.get(name).ok_or_else(unborn)?;
                Ok(Reference::new(RefName::new(name.as_str())?, *target))
            }
            MockHead::Detached(oid) => Ok(Reference::new(RefName::head(), *oid)),
        }
    }

    fn find_commit(&self, oid: &Oid) -> Result<Commit, GitError> {
        if let Some(error) = self.failure(|f| match f {
            FailOn::WalkStep { oid: at, error } if at == oid => Some(error),
            _ => None,
        }) {
            return Err(error);
        }
        self.commits
            .get(oid)
            .cloned()
            .ok_or_else(|| GitError::object_not_found(oid))
    }

    fn tree_entries(&self, tree: &Tree) -> Result<&BTreeMap<String, Oid>, GitError> {
        self.trees
            .get(&tree.oid)
            .ok_or_else(|| GitError::object_not_found(&tree.oid))
    }

    /// Every commit reachable from `from`, children before parents.
    ///
    /// Commits listed as parents but absent from the store are kept in
    /// the plan so the walk fails when it reaches them.
    fn topo_order(&self, from: Oid) -> Vec<Oid> {
        let mut pending_children: HashMap<Oid, usize> = HashMap::new();
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(oid) = stack.pop() {
            if !seen.insert(oid) {
                continue;
            }
            if let Some(commit) = self.commits.get(&oid) {
                for parent in &commit.parents {
                    *pending_children.entry(*parent).or_default() += 1;
                    stack.push(*parent);
                }
            }
        }

        let mut order = Vec::with_capacity(seen.len());
        let mut ready = vec![from];
        while let Some(oid) = ready.pop() {
            order.push(oid);
            let Some(commit) = self.commits.get(&oid) else {
                continue;
            };
            // Reverse so the first parent is popped first
            for parent in commit.parents.iter().rev() {
                if let Some(count) = pending_children.get_mut(parent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(*parent);
                    }
                }
            }
        }
        order
    }
}

fn lock(inner: &Mutex<MockStoreInner>) -> MutexGuard<'_, MockStoreInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deterministic 20-byte id for a sequence of fields.
fn content_oid(fields: &[&str]) -> Oid {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; Oid::LEN];
    bytes.copy_from_slice(&digest[..Oid::LEN]);
    Oid::from_bytes(bytes)
}

impl ObjectStore for MockStore {
    fn head(&self) -> Result<Reference, GitError> {
        self.lock().resolve_head()
    }

    fn reference(&self, name: &str) -> Result<Reference, GitError> {
        let inner = self.lock();
        if name == "HEAD" {
            return inner.resolve_head();
        }

        for candidate in RefName::expansions(name) {
            if let Some(target) = inner.refs.get(&candidate) {
                return Ok(Reference::new(RefName::new(candidate)?, *target));
            }
        }

        Err(GitError::RefNotFound {
            refname: name.to_string(),
        })
    }

    fn references(&self) -> Result<ReferenceIter<'_>, GitError> {
        let inner = self.lock();
        if let Some(error) = inner.failure(|f| match f {
            FailOn::References(error) => Some(error),
            _ => None,
        }) {
            return Err(error);
        }

        let entries: Vec<Result<Reference, ReferenceEntryError>> = inner
            .refs
            .iter()
            .map(|(name, target)| {
                if let Some(error) = inner.failure(|f| match f {
                    FailOn::ReferenceEntry { name: n, error } if n == name => Some(error),
                    _ => None,
                }) {
                    return Err(ReferenceEntryError::named(name.as_str(), error));
                }
                let refname = RefName::new(name.as_str())
                    .map_err(|e| ReferenceEntryError::named(name.as_str(), e.into()))?;
                Ok(Reference::new(refname, *target))
            })
            .collect();

        Ok(Box::new(entries.into_iter()))
    }

    fn commit_log(&self, options: &LogOptions) -> Result<CommitIter<'_>, GitError> {
        let mut inner = self.lock();
        if !inner.commits.contains_key(&options.from) {
            return Err(GitError::object_not_found(&options.from));
        }

        let plan = if options.first_parent {
            LogPlan::FirstParent(Some(options.from))
        } else {
            LogPlan::Planned(inner.topo_order(options.from).into_iter())
        };
        inner.open_logs += 1;

        Ok(Box::new(MockLog {
            inner: Arc::clone(&self.inner),
            plan,
        }))
    }

    fn tree(&self, commit: &Commit) -> Result<Tree, GitError> {
        let inner = self.lock();
        if let Some(error) = inner.failure(|f| match f {
            FailOn::Tree { commit: at, error } if *at == commit.oid => Some(error),
            _ => None,
        }) {
            return Err(error);
        }

        let tree = Tree { oid: commit.tree };
        inner.tree_entries(&tree)?;
        Ok(tree)
    }

    fn diff_trees(&self, before: &Tree, after: &Tree) -> Result<Changes, GitError> {
        let inner = self.lock();
        if let Some(error) = inner.failure(|f| match f {
            FailOn::DiffTrees(error) => Some(error),
            _ => None,
        }) {
            return Err(error);
        }

        let old = inner.tree_entries(before)?;
        let new = inner.tree_entries(after)?;
        let paths: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

        Ok(paths
            .into_iter()
            .filter_map(|path| {
                let (kind, old_oid, new_oid) = match (old.get(path), new.get(path)) {
                    (Some(a), None) => (ChangeKind::Deleted, *a, Oid::zero()),
                    (None, Some(b)) => (ChangeKind::Added, Oid::zero(), *b),
                    (Some(a), Some(b)) if a != b => (ChangeKind::Modified, *a, *b),
                    _ => return None,
                };
                Some(Change {
                    kind,
                    path: PathBuf::from(path),
                    old_path: None,
                    old_oid,
                    new_oid,
                })
            })
            .collect())
    }
}

/// Walk order for a [`MockLog`].
enum LogPlan {
    /// Follow first parents one step at a time.
    FirstParent(Option<Oid>),
    /// Full ancestry, ordered when the log was opened.
    Planned(std::vec::IntoIter<Oid>),
}

/// A commit walk over the mock store. Counts itself in `open_logs`.
struct MockLog {
    inner: Arc<Mutex<MockStoreInner>>,
    plan: LogPlan,
}

impl Iterator for MockLog {
    type Item = Result<Commit, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = match &mut self.plan {
            LogPlan::FirstParent(next) => next.take()?,
            LogPlan::Planned(order) => order.next()?,
        };

        let commit = lock(&self.inner).find_commit(&oid);
        if let (LogPlan::FirstParent(next), Ok(commit)) = (&mut self.plan, &commit) {
            *next = commit.first_parent().copied();
        }
        Some(commit)
    }
}

impl Drop for MockLog {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        inner.open_logs = inner.open_logs.saturating_sub(1);
    }
}
