//! gitgraph - Read-only queries over a Git repository's commit graph
//!
//! gitgraph resolves references, walks commit history lazily, and computes
//! the changes a commit introduced relative to its first parent.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`repo`] - Reference resolver, commit walker and diff resolver
//! - [`git`] - Single interface to Git object storage (git2 and in-memory)
//! - [`core`] - Domain types and configuration
//! - [`logging`] - Subscriber installation for `tracing` events
//!
//! # Correctness Invariants
//!
//! gitgraph maintains the following invariants:
//!
//! 1. Nothing writes to the repository
//! 2. Every commit log releases its store resources when dropped
//! 3. Errors name the ref or commit involved and are classified by kind
//! 4. Only [`git`] talks to libgit2

pub mod core;
pub mod git;
pub mod logging;
pub mod repo;

pub use crate::core::types::{Oid, RefName};
pub use crate::repo::{CommitLog, ErrorKind, RepoError, Repository};
