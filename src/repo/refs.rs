//! repo::refs
//!
//! Reference resolution and grouping.
//!
//! # Partial failures
//!
//! Enumerating refs can fail in two ways. If the enumeration itself cannot
//! be opened, the whole operation fails. If a single entry cannot be
//! resolved (a dangling symbolic ref, an unreadable loose ref), that entry
//! surfaces as an `Err` item from [`References`], and
//! [`Repository::reference_map`] skips it with a warning.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{RepoError, Repository};
use crate::core::types::Oid;
use crate::git::{ObjectStore, Reference, ReferenceEntryError, ReferenceIter};

impl<S: ObjectStore> Repository<S> {
    /// The reference HEAD currently resolves to.
    ///
    /// An unborn HEAD (no commits yet) is [`RepoError::ReferenceNotFound`].
    pub fn head(&self) -> Result<Reference, RepoError> {
        self.store
            .head()
            .map_err(|e| RepoError::reference("HEAD", e))
    }

    /// Resolve a full or short ref name.
    ///
    /// Short names are tried as `<name>`, `refs/<name>`, `refs/tags/<name>`,
    /// `refs/heads/<name>`, `refs/remotes/<name>` and
    /// `refs/remotes/<name>/HEAD`, in that order.
    pub fn resolve(&self, name: &str) -> Result<Reference, RepoError> {
        self.store
            .reference(name)
            .map_err(|e| RepoError::reference(name, e))
    }

    /// Every reference in the repository, excluding `HEAD`.
    ///
    /// Order is not guaranteed.
    pub fn references(&self) -> Result<References<'_>, RepoError> {
        let inner = self
            .store
            .references()
            .map_err(|source| RepoError::ReferenceListing { source })?;
        Ok(References { inner })
    }

    /// Group every reference by the commit it points to.
    ///
    /// Entries that fail to resolve are skipped and counted; failure to
    /// open the enumeration is returned as an error.
    pub fn reference_map(&self) -> Result<ReferenceMap, RepoError> {
        let mut map = ReferenceMap::default();

        for entry in self.references()? {
            match entry {
                Ok(reference) => map.insert(reference),
                Err(e) => {
                    warn!(error = %e, "skipping unresolvable reference");
                    map.skipped += 1;
                }
            }
        }

        debug!(
            targets = map.len(),
            skipped = map.skipped,
            "built reference map"
        );
        Ok(map)
    }
}

/// Lazy sequence of references.
pub struct References<'a> {
    inner: ReferenceIter<'a>,
}

impl Iterator for References<'_> {
    type Item = Result<Reference, RepoError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| {
            entry.map_err(|ReferenceEntryError { name, source }| match name {
                Some(name) => RepoError::Reference { name, source },
                // The store failed before it could read the entry's name
                None => RepoError::ReferenceListing { source },
            })
        })
    }
}

impl std::fmt::Debug for References<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("References").finish_non_exhaustive()
    }
}

/// References grouped by target, keyed by the target's canonical hex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMap {
    entries: HashMap<String, Vec<Reference>>,
    skipped: usize,
}

impl ReferenceMap {
    fn insert(&mut self, reference: Reference) {
        self.entries
            .entry(reference.target.to_hex())
            .or_default()
            .push(reference);
    }

    /// References pointing at `oid`.
    pub fn get(&self, oid: &Oid) -> Option<&[Reference]> {
        self.get_str(&oid.to_hex())
    }

    /// References pointing at the commit with this canonical hex.
    pub fn get_str(&self, hex: &str) -> Option<&[Reference]> {
        self.entries.get(hex).map(Vec::as_slice)
    }

    /// Number of distinct targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no reference resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of references across all targets.
    pub fn reference_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Entries that failed to resolve during enumeration.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Every target hex with its references, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Reference])> {
        self.entries
            .iter()
            .map(|(hex, refs)| (hex.as_str(), refs.as_slice()))
    }

    /// The underlying map from target hex to references.
    pub fn into_inner(self) -> HashMap<String, Vec<Reference>> {
        self.entries
    }
}
