//! git::interface
//!
//! Object-store implementation using git2.
//!
//! This module is the **single doorway** to libgit2 in gitgraph. It
//! converts `git2` objects into the owned types of [`super::object`] and
//! normalizes `git2::Error` into typed [`GitError`] categories, so nothing
//! above this layer ever sees a `git2` type.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist (or HEAD is unborn)
//! - [`GitError::ObjectNotFound`]: Requested commit or tree does not exist
//! - [`GitError::AccessError`]: Locked or unreadable repository files
//! - [`GitError::Internal`]: Anything else libgit2 reports
//!
//! # Concurrency
//!
//! `Git` is `Send` but not `Sync`: a libgit2 repository handle may move
//! between threads but must not be shared. Open one `Git` per thread for
//! parallel reads.
//!
//! # Example
//!
//! ```ignore
//! use gitgraph::git::{Git, ObjectStore};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head()?;
//! println!("{} is at {}", head.name, head.target.short(7));
//! ```

use std::path::Path;

use chrono::DateTime;

use super::object::{Change, ChangeKind, Changes, Commit, Reference, Signature, Tree};
use super::traits::{
    CommitIter, GitError, LogOptions, ObjectStore, ReferenceEntryError, ReferenceIter,
};
use crate::core::config::Config;
use crate::core::types::{Oid, RefName};

impl GitError {
    /// Classify a git2 error raised while resolving a ref.
    fn from_git2_ref(err: git2::Error, refname: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => GitError::RefNotFound {
                refname: refname.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidRefName {
                message: format!("{}: {}", refname, err.message()),
            },
            _ => Self::from_git2_other(err, refname),
        }
    }

    /// Classify a git2 error raised while reading an object.
    fn from_git2_object(err: git2::Error, oid: &Oid) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::object_not_found(oid),
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => GitError::InvalidOid {
                oid: oid.to_string(),
            },
            _ => Self::from_git2_other(err, &oid.to_string()),
        }
    }

    /// Classify a git2 error raised by a revwalk step.
    ///
    /// libgit2 names the missing object only in its message, so the id is
    /// recovered from there when present.
    fn from_git2_walk(err: git2::Error) -> Self {
        if err.code() == git2::ErrorCode::NotFound {
            if let Some(oid) = hex_oid_in(err.message()) {
                return GitError::object_not_found(&oid);
            }
        }
        Self::from_git2_other(err, "revwalk")
    }

    fn from_git2_other(err: git2::Error, context: &str) -> Self {
        match (err.code(), err.class()) {
            (git2::ErrorCode::Locked, _) => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            (_, git2::ErrorClass::Os) => GitError::AccessError {
                message: format!("{}: {}", context, err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Oid> for Oid {
    fn from(oid: git2::Oid) -> Self {
        let mut bytes = [0u8; Oid::LEN];
        bytes.copy_from_slice(oid.as_bytes());
        Oid::from_bytes(bytes)
    }
}

/// First full-length hex object id in `message`.
fn hex_oid_in(message: &str) -> Option<Oid> {
    message
        .split(|c: char| !c.is_ascii_hexdigit())
        .find(|word| word.len() == Oid::HEX_LEN)
        .and_then(|word| Oid::new(word).ok())
}

fn to_git2(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_bytes(oid.as_bytes()).map_err(|_| GitError::InvalidOid {
        oid: oid.to_string(),
    })
}

/// How [`Git`] computes tree diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSettings {
    /// Pair deletions with similar additions as renames
    pub detect_renames: bool,
    /// Similarity percentage for rename detection
    pub rename_threshold: u16,
    /// Report type changes instead of delete + add
    pub include_typechange: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            detect_renames: false,
            rename_threshold: Config::DEFAULT_RENAME_THRESHOLD,
            include_typechange: true,
        }
    }
}

impl DiffSettings {
    /// Settings resolved from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            detect_renames: config.detect_renames(),
            rename_threshold: config.rename_threshold(),
            include_typechange: config.include_typechange(),
        }
    }
}

/// The libgit2-backed object store.
///
/// Every operation is a read; bare repositories are accepted.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
    diff: DiffSettings,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .field("diff", &self.diff)
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            repo,
            diff: DiffSettings::default(),
        })
    }

    /// Replace the diff settings.
    pub fn with_diff_settings(mut self, diff: DiffSettings) -> Self {
        self.diff = diff;
        self
    }

    /// Current diff settings.
    pub fn diff_settings(&self) -> DiffSettings {
        self.diff
    }

    /// Path to the .git directory (or the repository itself when bare).
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Path to the working directory, if the repository has one.
    pub fn work_dir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Whether the repository has no working directory.
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    fn reference_entry(reference: &git2::Reference<'_>) -> Result<Reference, GitError> {
        let name = reference.name().ok_or_else(|| GitError::InvalidRefName {
            message: "ref name is not valid UTF-8".to_string(),
        })?;
        let name = RefName::new(name)?;

        // Peel through tags to the commit; fall back to the direct target
        // for refs that point at other object kinds.
        let target = match reference.peel_to_commit() {
            Ok(commit) => commit.id(),
            Err(_) => reference
                .resolve()
                .map_err(|e| GitError::from_git2_ref(e, name.as_str()))?
                .target()
                .ok_or_else(|| GitError::RefNotFound {
                    refname: name.to_string(),
                })?,
        };

        Ok(Reference::new(name, target.into()))
    }

    fn signature(sig: &git2::Signature<'_>) -> Signature {
        Signature {
            name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            when: DateTime::from_timestamp(sig.when().seconds(), 0)
                .unwrap_or(DateTime::UNIX_EPOCH),
        }
    }

    fn commit_entry(commit: &git2::Commit<'_>) -> Commit {
        Commit {
            oid: commit.id().into(),
            tree: commit.tree_id().into(),
            parents: commit.parent_ids().map(Oid::from).collect(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author: Self::signature(&commit.author()),
            committer: Self::signature(&commit.committer()),
        }
    }

    fn change_entry(delta: &git2::DiffDelta<'_>) -> Option<Change> {
        let kind = match delta.status() {
            git2::Delta::Added => ChangeKind::Added,
            git2::Delta::Deleted => ChangeKind::Deleted,
            git2::Delta::Modified => ChangeKind::Modified,
            git2::Delta::Renamed => ChangeKind::Renamed,
            git2::Delta::Copied => ChangeKind::Copied,
            git2::Delta::Typechange => ChangeKind::TypeChanged,
            // Tree-to-tree diffs never produce the workdir-only statuses
            _ => return None,
        };

        let old_path = delta.old_file().path();
        let path = delta.new_file().path().or(old_path)?.to_path_buf();
        let old_path = match kind {
            ChangeKind::Renamed | ChangeKind::Copied => old_path.map(Path::to_path_buf),
            _ => None,
        };

        Some(Change {
            kind,
            path,
            old_path,
            old_oid: delta.old_file().id().into(),
            new_oid: delta.new_file().id().into(),
        })
    }

    fn find_tree(&self, oid: &Oid) -> Result<git2::Tree<'_>, GitError> {
        self.repo
            .find_tree(to_git2(oid)?)
            .map_err(|e| GitError::from_git2_object(e, oid))
    }
}

impl ObjectStore for Git {
    fn head(&self) -> Result<Reference, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2_ref(e, "HEAD"))?;
        Self::reference_entry(&head)
    }

    fn reference(&self, name: &str) -> Result<Reference, GitError> {
        let reference = self
            .repo
            .resolve_reference_from_short_name(name)
            .map_err(|e| GitError::from_git2_ref(e, name))?;
        Self::reference_entry(&reference)
    }

    fn references(&self) -> Result<ReferenceIter<'_>, GitError> {
        let refs = self
            .repo
            .references()
            .map_err(|e| GitError::from_git2_other(e, "refs"))?;

        Ok(Box::new(refs.map(|reference| {
            let reference = reference.map_err(|e| ReferenceEntryError {
                name: None,
                source: GitError::from_git2_other(e, "refs"),
            })?;
            Self::reference_entry(&reference).map_err(|source| {
                ReferenceEntryError::named(String::from_utf8_lossy(reference.name_bytes()), source)
            })
        })))
    }

    fn commit_log(&self, options: &LogOptions) -> Result<CommitIter<'_>, GitError> {
        let start = to_git2(&options.from)?;
        // Fail up front when the start is missing or not a commit
        self.repo
            .find_commit(start)
            .map_err(|e| GitError::from_git2_object(e, &options.from))?;

        // A first-parent walk is a chain of single lookups; a revwalk would
        // parse each parent before yielding its child.
        if options.first_parent {
            return Ok(Box::new(RevLog {
                repo: &self.repo,
                order: WalkOrder::FirstParent(Some(options.from)),
            }));
        }

        let mut walk = self
            .repo
            .revwalk()
            .map_err(|e| GitError::from_git2_other(e, "revwalk"))?;
        // Topological sorting reads all reachable commits before the first one
        walk.set_sorting(git2::Sort::TOPOLOGICAL)
            .map_err(|e| GitError::from_git2_other(e, "revwalk"))?;
        walk.push(start)
            .map_err(|e| GitError::from_git2_object(e, &options.from))?;

        Ok(Box::new(RevLog {
            repo: &self.repo,
            order: WalkOrder::Topological(walk),
        }))
    }

    fn tree(&self, commit: &Commit) -> Result<Tree, GitError> {
        let tree = self.find_tree(&commit.tree)?;
        Ok(Tree {
            oid: tree.id().into(),
        })
    }

    fn diff_trees(&self, before: &Tree, after: &Tree) -> Result<Changes, GitError> {
        let old_tree = self.find_tree(&before.oid)?;
        let new_tree = self.find_tree(&after.oid)?;

        let mut opts = git2::DiffOptions::new();
        opts.include_typechange(self.diff.include_typechange);

        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut opts))
            .map_err(|e| GitError::from_git2_other(e, "diff"))?;

        if self.diff.detect_renames {
            let mut find = git2::DiffFindOptions::new();
            find.renames(true)
                .rename_threshold(self.diff.rename_threshold);
            diff.find_similar(Some(&mut find))
                .map_err(|e| GitError::from_git2_other(e, "diff"))?;
        }

        Ok(diff
            .deltas()
            .filter_map(|delta| Self::change_entry(&delta))
            .collect())
    }
}

/// How a [`RevLog`] picks the next commit.
enum WalkOrder<'r> {
    /// Follow first parents, looking each one up when it is pulled.
    FirstParent(Option<Oid>),
    /// Full ancestry via libgit2; freed when dropped.
    Topological(git2::Revwalk<'r>),
}

/// A commit walk plus the repository it reads commits from.
struct RevLog<'r> {
    repo: &'r git2::Repository,
    order: WalkOrder<'r>,
}

impl Iterator for RevLog<'_> {
    type Item = Result<Commit, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        let RevLog { repo, order } = self;

        let oid = match order {
            WalkOrder::FirstParent(next) => next.take()?,
            WalkOrder::Topological(walk) => match walk.next()? {
                Ok(oid) => oid.into(),
                Err(e) => return Some(Err(GitError::from_git2_walk(e))),
            },
        };

        let commit = match to_git2(&oid).and_then(|raw| {
            repo.find_commit(raw)
                .map_err(|e| GitError::from_git2_object(e, &oid))
        }) {
            Ok(commit) => commit,
            Err(e) => return Some(Err(e)),
        };

        if let WalkOrder::FirstParent(next) = order {
            *next = commit.parent_id(0).ok().map(Oid::from);
        }
        Some(Ok(Git::commit_entry(&commit)))
    }
}
