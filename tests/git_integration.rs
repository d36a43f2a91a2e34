//! Integration tests for the git2-backed store.
//!
//! These tests build real repositories in temp directories through the
//! git2 API and query them through `Repository<Git>`.

use std::path::Path;

use tempfile::TempDir;

use gitgraph::core::config::{Config, DiffConfig, RepoConfig, WalkConfig};
use gitgraph::core::types::Oid;
use gitgraph::git::{ChangeKind, Git, GitError, LogOptions, ObjectStore};
use gitgraph::repo::{CommitRole, ErrorKind, RepoError, Repository};

const REGULAR: i32 = 0o100644;
const SYMLINK: i32 = 0o120000;

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
    repo: git2::Repository,
    clock: std::cell::Cell<i64>,
}

impl TestRepo {
    /// Create an empty repository with HEAD on an unborn `main`.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let repo = git2::Repository::init(dir.path()).expect("failed to init repo");
        repo.set_head("refs/heads/main").unwrap();
        Self {
            dir,
            repo,
            clock: std::cell::Cell::new(0),
        }
    }

    /// Create an empty bare repository.
    fn bare() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let repo = git2::Repository::init_bare(dir.path()).expect("failed to init repo");
        repo.set_head("refs/heads/main").unwrap();
        Self {
            dir,
            repo,
            clock: std::cell::Cell::new(0),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn open(&self) -> Repository<Git> {
        Repository::open_with_config(self.path(), &Config::default())
            .expect("failed to open test repo")
    }

    /// Write a tree holding exactly `files`, each entry (path, mode, contents).
    fn write_tree(&self, files: &[(&str, i32, &str)]) -> git2::Oid {
        let mut index = git2::Index::new().unwrap();
        for (path, mode, contents) in files {
            let blob = self.repo.blob(contents.as_bytes()).unwrap();
            index
                .add(&git2::IndexEntry {
                    ctime: git2::IndexTime::new(0, 0),
                    mtime: git2::IndexTime::new(0, 0),
                    dev: 0,
                    ino: 0,
                    mode: *mode as u32,
                    uid: 0,
                    gid: 0,
                    file_size: contents.len() as u32,
                    id: blob,
                    flags: 0,
                    flags_extended: 0,
                    path: path.as_bytes().to_vec(),
                })
                .unwrap();
        }
        index.write_tree_to(&self.repo).unwrap()
    }

    /// Commit regular files on top of `parents`, without moving any ref.
    fn commit(&self, message: &str, parents: &[Oid], files: &[(&str, &str)]) -> Oid {
        let files: Vec<(&str, i32, &str)> = files.iter().map(|(p, c)| (*p, REGULAR, *c)).collect();
        self.commit_entries(message, parents, &files)
    }

    fn commit_entries(&self, message: &str, parents: &[Oid], files: &[(&str, i32, &str)]) -> Oid {
        let tree = self.repo.find_tree(self.write_tree(files)).unwrap();

        let seconds = 1_700_000_000 + self.clock.get();
        self.clock.set(self.clock.get() + 60);
        let sig = git2::Signature::new("Test User", "test@example.com", &git2::Time::new(seconds, 0))
            .unwrap();

        let parents: Vec<git2::Commit<'_>> = parents
            .iter()
            .map(|p| self.repo.find_commit(raw(p)).unwrap())
            .collect();
        let parents: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let oid = self
            .repo
            .commit(None, &sig, &sig, message, &tree, &parents)
            .unwrap();
        Oid::new(oid.to_string()).unwrap()
    }

    fn set_ref(&self, name: &str, target: Oid) {
        self.repo.reference(name, raw(&target), true, "test").unwrap();
    }

    fn branch(&self, name: &str, target: Oid) {
        self.set_ref(&format!("refs/heads/{name}"), target);
    }

    /// Delete an object's loose file, as a damaged or partial clone would.
    fn remove_object(&self, oid: Oid) {
        let hex = oid.to_hex();
        let path = self.repo.path().join("objects").join(&hex[..2]).join(&hex[2..]);
        std::fs::remove_file(&path).expect("object should be stored loose");
    }

    fn annotated_tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(raw(&target), None).unwrap();
        let sig = git2::Signature::new("Test User", "test@example.com", &git2::Time::new(0, 0))
            .unwrap();
        self.repo.tag(name, &object, &sig, "release", false).unwrap();
    }
}

fn raw(oid: &Oid) -> git2::Oid {
    git2::Oid::from_bytes(oid.as_bytes()).unwrap()
}

/// C1 -> C2 -> C3 on `main`.
fn three_commits(fixture: &TestRepo) -> (Oid, Oid, Oid) {
    let c1 = fixture.commit("C1", &[], &[("README.md", "# Test Repo\n")]);
    let c2 = fixture.commit(
        "C2\n\nAdd the library",
        &[c1],
        &[("README.md", "# Test Repo\n"), ("src/lib.rs", "pub fn f() {}\n")],
    );
    let c3 = fixture.commit(
        "C3",
        &[c2],
        &[("README.md", "# Test Repo\n\nMore.\n"), ("src/lib.rs", "pub fn f() {}\n")],
    );
    fixture.branch("main", c3);
    (c1, c2, c3)
}

mod scenario {
    use super::*;

    #[test]
    fn head_resolves_to_main() {
        let fixture = TestRepo::new();
        let (_, _, c3) = three_commits(&fixture);
        let repo = fixture.open();

        let head = repo.head().unwrap();
        assert_eq!(head.name.as_str(), "refs/heads/main");
        assert_eq!(head.target, c3);
    }

    #[test]
    fn log_walks_back_to_root() {
        let fixture = TestRepo::new();
        let (c1, c2, c3) = three_commits(&fixture);
        let repo = fixture.open();

        let commits: Vec<_> = repo.log_from(c3).unwrap().map(Result::unwrap).collect();
        let oids: Vec<Oid> = commits.iter().map(|c| c.oid).collect();
        assert_eq!(oids, vec![c3, c2, c1]);

        assert_eq!(commits[1].summary(), "C2");
        assert_eq!(commits[1].parents, vec![c1]);
        assert_eq!(commits[1].author.name, "Test User");
        assert!(commits[2].is_root());
    }

    #[test]
    fn diff_reports_modified_and_added_paths() {
        let fixture = TestRepo::new();
        let (_, c2, c3) = three_commits(&fixture);
        let repo = fixture.open();

        let changes = repo.diff(c3).unwrap();
        assert_eq!(changes.len(), 1);
        let readme = changes.get("README.md").unwrap();
        assert_eq!(readme.kind, ChangeKind::Modified);
        assert!(!readme.old_oid.is_zero());
        assert_ne!(readme.old_oid, readme.new_oid);

        let changes = repo.diff(c2).unwrap();
        let lib = changes.get("src/lib.rs").unwrap();
        assert_eq!(lib.kind, ChangeKind::Added);
        assert!(lib.old_oid.is_zero());
    }

    #[test]
    fn root_commit_has_no_parent() {
        let fixture = TestRepo::new();
        let (c1, ..) = three_commits(&fixture);
        let err = fixture.open().diff(c1).unwrap_err();
        assert!(matches!(err, RepoError::MissingParent { oid } if oid == c1));
    }

    #[test]
    fn unknown_hash_is_not_found() {
        let fixture = TestRepo::new();
        three_commits(&fixture);
        let missing = Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap();

        let err = fixture.open().diff(missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.oid(), Some(&missing));
        assert_eq!(err.role(), Some(CommitRole::Target));
        assert!(err.to_string().contains(&missing.to_hex()));
    }

    #[test]
    fn find_commit_returns_the_commit() {
        let fixture = TestRepo::new();
        let (_, c2, _) = three_commits(&fixture);
        let commit = fixture.open().find_commit(c2).unwrap();
        assert_eq!(commit.oid, c2);
        assert_eq!(commit.message, "C2\n\nAdd the library");
    }
}

mod references {
    use super::*;

    #[test]
    fn unborn_head_is_not_found() {
        let fixture = TestRepo::new();
        assert_eq!(fixture.open().head().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn detached_head() {
        let fixture = TestRepo::new();
        let (_, c2, _) = three_commits(&fixture);
        fixture.repo.set_head_detached(raw(&c2)).unwrap();

        let head = fixture.open().head().unwrap();
        assert_eq!(head.name.as_str(), "HEAD");
        assert_eq!(head.target, c2);
    }

    #[test]
    fn short_names_resolve() {
        let fixture = TestRepo::new();
        let (c1, c2, c3) = three_commits(&fixture);
        fixture.set_ref("refs/tags/v1", c1);
        fixture.set_ref("refs/remotes/origin/main", c2);
        let repo = fixture.open();

        assert_eq!(repo.resolve("main").unwrap().target, c3);
        assert_eq!(repo.resolve("v1").unwrap().name.as_str(), "refs/tags/v1");
        assert_eq!(repo.resolve("origin/main").unwrap().target, c2);
        assert_eq!(repo.resolve("nope").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn map_groups_branches_and_tags() {
        let fixture = TestRepo::new();
        let (c1, _, c3) = three_commits(&fixture);
        fixture.branch("feature", c3);
        fixture.set_ref("refs/tags/v0.1", c1);
        fixture.annotated_tag("v1.0", c3);
        let repo = fixture.open();

        let map = repo.reference_map().unwrap();
        assert_eq!(map.skipped(), 0);
        assert_eq!(map.len(), 2);

        let mut at_tip: Vec<&str> = map.get(&c3).unwrap().iter().map(|r| r.name.as_str()).collect();
        at_tip.sort();
        assert_eq!(
            at_tip,
            vec!["refs/heads/feature", "refs/heads/main", "refs/tags/v1.0"]
        );
        assert_eq!(map.get(&c1).unwrap()[0].name.as_str(), "refs/tags/v0.1");
    }

    #[test]
    fn dangling_symbolic_ref_is_skipped_by_name() {
        let fixture = TestRepo::new();
        let (.., c3) = three_commits(&fixture);
        fixture
            .repo
            .reference_symbolic("refs/heads/dangling", "refs/heads/nowhere", true, "test")
            .unwrap();
        let repo = fixture.open();

        let errors: Vec<RepoError> = repo.references().unwrap().filter_map(Result::err).collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            RepoError::Reference { name, .. } if name == "refs/heads/dangling"
        ));

        let map = repo.reference_map().unwrap();
        assert_eq!(map.skipped(), 1);
        assert_eq!(map.get(&c3).unwrap().len(), 1);
    }

    #[test]
    fn head_is_not_enumerated() {
        let fixture = TestRepo::new();
        three_commits(&fixture);
        let names: Vec<String> = fixture
            .open()
            .references()
            .unwrap()
            .map(|r| r.unwrap().name.to_string())
            .collect();
        assert_eq!(names, vec!["refs/heads/main".to_string()]);
    }
}

mod missing_objects {
    use super::*;

    /// C1 -> C2 -> C3 -> C4 on `main`, each commit changing one file.
    fn four_commits(fixture: &TestRepo) -> [Oid; 4] {
        let c1 = fixture.commit("C1", &[], &[("n.txt", "1\n")]);
        let c2 = fixture.commit("C2", &[c1], &[("n.txt", "2\n")]);
        let c3 = fixture.commit("C3", &[c2], &[("n.txt", "3\n")]);
        let c4 = fixture.commit("C4", &[c3], &[("n.txt", "4\n")]);
        fixture.branch("main", c4);
        [c1, c2, c3, c4]
    }

    #[test]
    fn lost_ancestor_does_not_affect_recent_commits() {
        let fixture = TestRepo::new();
        let [c1, c2, c3, c4] = four_commits(&fixture);
        fixture.remove_object(c1);
        let repo = fixture.open();

        assert_eq!(repo.find_commit(c4).unwrap().summary(), "C4");
        assert_eq!(repo.diff(c4).unwrap().len(), 1);
        assert_eq!(repo.diff(c3).unwrap().len(), 1);

        let mut log = repo.log_from(c4).unwrap();
        let walked: Vec<Oid> = log.by_ref().take(3).map(|c| c.unwrap().oid).collect();
        assert_eq!(walked, vec![c4, c3, c2]);

        let err = log.next().unwrap().unwrap_err();
        assert!(matches!(
            &err,
            RepoError::Walk { from, source: GitError::ObjectNotFound { oid } }
                if *from == c4 && *oid == c1.to_hex()
        ));
    }

    #[test]
    fn lost_first_parent_is_not_found_for_the_parent() {
        let fixture = TestRepo::new();
        let [c1, c2, ..] = four_commits(&fixture);
        fixture.remove_object(c1);

        let err = fixture.open().diff(c2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.role(), Some(CommitRole::Parent));
        assert_eq!(err.oid(), Some(&c1));
    }

    #[test]
    fn full_walk_reports_the_missing_commit() {
        let fixture = TestRepo::new();
        let [c1, .., c4] = four_commits(&fixture);
        fixture.remove_object(c1);

        let repo = fixture.open();
        let failure = match repo.log(LogOptions::full(c4)) {
            Ok(log) => log.filter_map(Result::err).next(),
            Err(err) => Some(err),
        };
        let err = failure.expect("walk should fail somewhere");
        assert!(err.to_string().contains(&c1.to_hex()), "{err}");
    }
}

mod merges {
    use super::*;

    fn merged(fixture: &TestRepo) -> (Oid, Oid, Oid, Oid) {
        let base = fixture.commit("base", &[], &[("a.txt", "0\n")]);
        let left = fixture.commit("left", &[base], &[("a.txt", "1\n")]);
        let right = fixture.commit("right", &[base], &[("a.txt", "0\n"), ("b.txt", "1\n")]);
        let merge = fixture.commit(
            "merge",
            &[left, right],
            &[("a.txt", "1\n"), ("b.txt", "1\n")],
        );
        fixture.branch("main", merge);
        (base, left, right, merge)
    }

    #[test]
    fn diff_uses_first_parent() {
        let fixture = TestRepo::new();
        let (.., merge) = merged(&fixture);
        let changes = fixture.open().diff(merge).unwrap();
        let paths: Vec<&Path> = changes.paths().collect();
        assert_eq!(paths, vec![Path::new("b.txt")]);
    }

    #[test]
    fn first_parent_and_full_walks() {
        let fixture = TestRepo::new();
        let (base, left, right, merge) = merged(&fixture);
        let repo = fixture.open();

        let first: Vec<Oid> = repo
            .log(LogOptions::first_parent(merge))
            .unwrap()
            .map(|c| c.unwrap().oid)
            .collect();
        assert_eq!(first, vec![merge, left, base]);

        let full: Vec<Oid> = repo
            .log(LogOptions::full(merge))
            .unwrap()
            .map(|c| c.unwrap().oid)
            .collect();
        assert_eq!(full.len(), 4);
        assert_eq!(full[0], merge);
        assert_eq!(full[3], base);
        assert!(full.contains(&right));
    }

    #[test]
    fn configured_walk_mode() {
        let fixture = TestRepo::new();
        let (.., merge) = merged(&fixture);

        let mut config = Config::default();
        config.repo = Some(RepoConfig {
            walk: Some(WalkConfig {
                first_parent: Some(false),
            }),
            diff: None,
        });
        let repo = Repository::open_with_config(fixture.path(), &config).unwrap();
        assert_eq!(repo.log_from(merge).unwrap().count(), 4);
    }
}

mod diff_settings {
    use super::*;

    const BODY: &str = "line one\nline two\nline three\nline four\nline five\n";

    #[test]
    fn renames_are_add_and_delete_by_default() {
        let fixture = TestRepo::new();
        let before = fixture.commit("before", &[], &[("old.txt", BODY)]);
        let after = fixture.commit("after", &[before], &[("new.txt", BODY)]);

        let changes = fixture.open().diff(after).unwrap();
        assert_eq!(changes.get("old.txt").unwrap().kind, ChangeKind::Deleted);
        assert_eq!(changes.get("new.txt").unwrap().kind, ChangeKind::Added);
    }

    #[test]
    fn rename_detection_from_repo_config() {
        let fixture = TestRepo::new();
        let before = fixture.commit("before", &[], &[("old.txt", BODY)]);
        let after = fixture.commit("after", &[before], &[("new.txt", BODY)]);

        let git_dir = fixture.repo.path().to_path_buf();
        let config_path = Config::repo_config_path(&git_dir);
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(&config_path, "[diff]\ndetect_renames = true\n").unwrap();

        let config = Config::load_files(None, Some(&git_dir)).unwrap().config;
        assert_eq!(config.repo_path(), Some(config_path.as_path()));

        let repo = Repository::open_with_config(fixture.path(), &config).unwrap();
        let changes = repo.diff(after).unwrap();
        assert_eq!(changes.len(), 1);
        let renamed = changes.get("new.txt").unwrap();
        assert_eq!(renamed.kind, ChangeKind::Renamed);
        assert_eq!(renamed.old_path.as_deref(), Some(Path::new("old.txt")));
    }

    #[test]
    fn type_changes() {
        let fixture = TestRepo::new();
        let before = fixture.commit_entries("file", &[], &[("link", REGULAR, "target")]);
        let after = fixture.commit_entries("symlink", &[before], &[("link", SYMLINK, "target")]);

        let changes = fixture.open().diff(after).unwrap();
        assert_eq!(changes.get("link").unwrap().kind, ChangeKind::TypeChanged);

        let mut config = Config::default();
        config.repo = Some(RepoConfig {
            walk: None,
            diff: Some(DiffConfig {
                include_typechange: Some(false),
                ..Default::default()
            }),
        });
        let repo = Repository::open_with_config(fixture.path(), &config).unwrap();
        let kinds: Vec<ChangeKind> = repo.diff(after).unwrap().iter().map(|c| c.kind).collect();
        assert!(!kinds.contains(&ChangeKind::TypeChanged));
    }
}

mod bare {
    use super::*;

    #[test]
    fn bare_repositories_are_readable() {
        let fixture = TestRepo::bare();
        let (c1, c2, c3) = three_commits(&fixture);
        let repo = fixture.open();

        assert!(repo.store().is_bare());
        assert!(repo.store().work_dir().is_none());
        assert_eq!(repo.head().unwrap().target, c3);
        assert_eq!(repo.log_from(c3).unwrap().count(), 3);
        assert_eq!(repo.diff(c2).unwrap().len(), 1);
        assert_eq!(repo.diff(c1).unwrap_err().kind(), ErrorKind::MissingParent);
    }

    #[test]
    fn opens_from_a_subdirectory() {
        let fixture = TestRepo::new();
        let (.., c3) = three_commits(&fixture);
        let nested = fixture.path().join("deep/er");
        std::fs::create_dir_all(&nested).unwrap();

        let git = Git::open(&nested).unwrap();
        assert_eq!(git.head().unwrap().target, c3);
    }
}
