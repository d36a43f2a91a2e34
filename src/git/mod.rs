//! git
//!
//! Single interface to Git object storage.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads flow
//! through the [`ObjectStore`] trait. No other module should import `git2`.
//!
//! We use the `git2` crate exclusively (no shelling out to the git CLI).
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Ref resolution and enumeration
//! - Commit walks (first-parent or full ancestry)
//! - Tree lookup and tree-to-tree diffs
//!
//! # Invariants
//!
//! - The store is read-only: nothing here writes refs or objects
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, RefName) and owned values
//!
//! # Example
//!
//! ```ignore
//! use gitgraph::git::{Git, LogOptions, ObjectStore};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//!
//! let head = git.head()?;
//! for commit in git.commit_log(&LogOptions::first_parent(head.target))? {
//!     println!("{}", commit?.summary());
//! }
//! ```

mod interface;
pub mod mock;
mod object;
mod traits;

pub use interface::{DiffSettings, Git};
pub use object::{Change, ChangeKind, Changes, Commit, Reference, Signature, Tree};
pub use traits::{
    CommitIter, GitError, LogOptions, ObjectStore, ReferenceEntryError, ReferenceIter,
};
