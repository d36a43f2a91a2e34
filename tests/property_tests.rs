//! Property-based tests for core domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use gitgraph::core::types::{Oid, RefName};
use gitgraph::git::mock::MockStore;
use gitgraph::git::{Commit, Signature};
use gitgraph::repo::{ErrorKind, Repository};

/// Strategy for generating valid hex OIDs.
fn valid_oid_string() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
        ]),
        40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for generating ref name components that pass validation.
fn ref_component() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9_-]{0,15}"
}

fn commit_with_message(message: String) -> Commit {
    let sig = Signature {
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        when: chrono::DateTime::UNIX_EPOCH,
    };
    Commit {
        oid: Oid::zero(),
        tree: Oid::zero(),
        parents: Vec::new(),
        message,
        author: sig.clone(),
        committer: sig,
    }
}

proptest! {
    /// Formatting then parsing yields the same hash.
    #[test]
    fn oid_display_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let oid = Oid::from_bytes(bytes);
        prop_assert_eq!(Oid::new(oid.to_string()).unwrap(), oid);
        prop_assert_eq!(Oid::parse_lossy(&oid.to_hex()), oid);
    }

    /// Any valid OID round-trips through serde.
    #[test]
    fn oid_serde_roundtrip(oid_str in valid_oid_string()) {
        let oid = Oid::new(&oid_str).unwrap();
        let json = serde_json::to_string(&oid).unwrap();
        let parsed: Oid = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(oid, parsed);
    }

    /// OIDs are normalized to lowercase.
    #[test]
    fn oid_normalized_to_lowercase(oid_str in valid_oid_string()) {
        let upper = oid_str.to_uppercase();
        let oid = Oid::new(&upper).unwrap();
        prop_assert_eq!(oid.to_string(), oid_str.to_lowercase());
    }

    /// Only the all-zero hash is the zero sentinel.
    #[test]
    fn zero_sentinel(bytes in prop::array::uniform20(any::<u8>())) {
        let oid = Oid::from_bytes(bytes);
        prop_assert_eq!(oid.is_zero(), bytes.iter().all(|b| *b == 0));
    }

    /// Malformed input parses to zero; strict parsing rejects it.
    #[test]
    fn lossy_parse_of_malformed_input(input in "[g-z ]{0,50}|[0-9a-f]{0,39}|[0-9a-f]{41,60}") {
        prop_assert!(Oid::parse_lossy(&input).is_zero());
        prop_assert!(Oid::new(&input).is_err());
    }

    /// Oid::short returns a prefix of the full hex.
    #[test]
    fn oid_short_is_prefix(oid_str in valid_oid_string(), len in 1usize..40) {
        let oid = Oid::new(&oid_str).unwrap();
        let short = oid.short(len);
        prop_assert_eq!(short.len(), len);
        prop_assert!(oid_str.starts_with(&short));
    }

    /// The summary is the text before the first newline.
    #[test]
    fn summary_is_first_line(first in "[^\r\n]{0,40}", rest in "(\n[^\r\n]{0,40}){0,3}") {
        let commit = commit_with_message(format!("{first}{rest}"));
        prop_assert_eq!(commit.summary(), first.as_str());
    }

    /// Branch names built from valid components keep their shorthand.
    #[test]
    fn branch_shorthand_roundtrip(parts in prop::collection::vec(ref_component(), 1..4)) {
        let short = parts.join("/");
        let refname = RefName::branch(&short).unwrap();
        prop_assert!(refname.is_branch());
        prop_assert_eq!(refname.shorthand(), short.as_str());
        prop_assert!(RefName::expansions(&short).contains(&refname.to_string()));
    }

    /// A first-parent log visits every commit of a linear chain once, newest first.
    #[test]
    fn linear_log_visits_chain(len in 1usize..20) {
        let store = MockStore::new();
        let mut chain = Vec::new();
        for i in 0..len {
            let parents: Vec<Oid> = chain.last().copied().into_iter().collect();
            let contents = i.to_string();
            chain.push(store.commit(&format!("commit {i}"), &parents, &[("n", contents.as_str())]));
        }
        let tip = *chain.last().unwrap();
        let repo = Repository::new(store);

        let walked: Vec<Oid> = repo.log_from(tip).unwrap().map(|c| c.unwrap().oid).collect();
        chain.reverse();
        prop_assert_eq!(walked, chain);
        prop_assert_eq!(repo.store().open_logs(), 0);
    }

    /// Every non-root commit of a chain diffs; the root reports a missing parent.
    #[test]
    fn chain_diffs(len in 2usize..10) {
        let store = MockStore::new();
        let mut chain: Vec<Oid> = Vec::new();
        for i in 0..len {
            let parents: Vec<Oid> = chain.last().copied().into_iter().collect();
            let contents = i.to_string();
            chain.push(store.commit("step", &parents, &[("n", contents.as_str())]));
        }
        let repo = Repository::new(store);

        prop_assert_eq!(repo.diff(chain[0]).unwrap_err().kind(), ErrorKind::MissingParent);
        for oid in &chain[1..] {
            prop_assert_eq!(repo.diff(*oid).unwrap().len(), 1);
        }
    }
}
