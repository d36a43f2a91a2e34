//! git::object
//!
//! Plain data handed across the object-store boundary.
//!
//! Everything here is owned by the caller once returned: a [`Commit`] does
//! not borrow from the store that produced it, and a [`Tree`] is only a
//! handle that the store resolves again when it is diffed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::types::{Oid, RefName};

/// A named pointer with its resolved target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    /// The full ref name
    pub name: RefName,
    /// The commit the ref points to (or its direct target for non-commit refs)
    pub target: Oid,
}

impl Reference {
    /// Create a reference entry.
    pub fn new(name: RefName, target: Oid) -> Self {
        Self { name, target }
    }
}

/// Author or committer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: DateTime<Utc>,
}

/// An immutable node in the commit graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    /// The commit OID
    pub oid: Oid,
    /// Root tree of the snapshot
    pub tree: Oid,
    /// Parent OIDs, first parent first
    pub parents: Vec<Oid>,
    /// Full commit message
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
}

impl Commit {
    /// First line of the commit message.
    ///
    /// # Example
    ///
    /// ```
    /// use gitgraph::git::Commit;
    /// # use gitgraph::core::types::Oid;
    /// # use gitgraph::git::Signature;
    /// # let sig = Signature { name: "a".into(), email: "a@b".into(), when: chrono::DateTime::UNIX_EPOCH };
    /// # let commit = Commit {
    /// #     oid: Oid::zero(), tree: Oid::zero(), parents: vec![],
    /// #     message: "Fix bug\n\nLonger description here".into(),
    /// #     author: sig.clone(), committer: sig,
    /// # };
    /// assert_eq!(commit.summary(), "Fix bug");
    /// ```
    pub fn summary(&self) -> &str {
        let line = self.message.split('\n').next().unwrap_or("");
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// The first parent, if any.
    pub fn first_parent(&self) -> Option<&Oid> {
        self.parents.first()
    }

    /// Whether this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Whether this commit has more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Handle to a commit's root tree snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Tree {
    pub oid: Oid,
}

/// Kind of a per-path modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    TypeChanged,
}

impl ChangeKind {
    /// Single-letter status code, as printed by `git diff --name-status`.
    pub fn code(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Modified => 'M',
            ChangeKind::Renamed => 'R',
            ChangeKind::Copied => 'C',
            ChangeKind::TypeChanged => 'T',
        }
    }
}

/// A single path-level difference between two trees.
///
/// The zero OID marks the side that does not exist: `old_oid` for an
/// addition and `new_oid` for a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub kind: ChangeKind,
    /// Path after the change (the removed path for deletions)
    pub path: PathBuf,
    /// Source path for renames and copies
    pub old_path: Option<PathBuf>,
    pub old_oid: Oid,
    pub new_oid: Oid,
}

/// The changeset between two tree snapshots, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Changes(Vec<Change>);

impl Changes {
    /// Build a changeset, ordering entries by path.
    pub fn new(mut changes: Vec<Change>) -> Self {
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        Self(changes)
    }

    /// Number of changed paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the two trees were identical.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Changes ordered by path.
    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.0.iter()
    }

    /// Paths touched by this changeset, in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(|c| c.path.as_path())
    }

    /// Look up the change recorded for `path`.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&Change> {
        let path = path.as_ref();
        self.0.iter().find(|c| c.path == path)
    }

    /// Take the changes out, still ordered by path.
    pub fn into_vec(self) -> Vec<Change> {
        self.0
    }
}

impl FromIterator<Change> for Changes {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Changes {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Changes {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
