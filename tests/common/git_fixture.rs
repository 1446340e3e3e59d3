//! Temporary git repositories for end-to-end tests
//!
//! Layout under one temp dir:
//!
//! ```text
//! remotes/acme/docs.git      bare canonical repository (head)
//! remotes/acme/ja.docs.git   bare translation repository (origin and upstream)
//! remotes/bot/ja.docs.git    bare fork of the translation repository (optional)
//! authoring/docs             clone of head used to author upstream commits
//! authoring/ja.docs          clone of origin used to author translation commits
//! work/                      bot workdir; the working copy lands in work/ja.docs
//! ```

#![allow(dead_code)]

use cherry_sync::git::{Git, WorkingCopy};
use cherry_sync::types::{CommitIdentity, FeedItem, RemoteSpec, RemoteTopology};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git in `dir`, panicking with stderr on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {} failed in {}: {}",
        args.join(" "),
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_author(dir: &Path) {
    git(dir, &["config", "user.name", "Test Author"]);
    git(dir, &["config", "user.email", "author@test.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Canonical + translation repositories sharing one history
pub struct GitFixture {
    dir: TempDir,
    pub head_remote: PathBuf,
    pub origin_remote: PathBuf,
    head_author: PathBuf,
    origin_author: PathBuf,
    pub workdir: PathBuf,
}

impl Default for GitFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl GitFixture {
    /// Canonical repo with `README.md` and `docs/intro.md` on `main`, and a
    /// translation repo cloned from it
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = dir.path();
        let remotes = root.join("remotes").join("acme");
        let authoring = root.join("authoring");
        fs::create_dir_all(&remotes).unwrap();
        fs::create_dir_all(&authoring).unwrap();

        let head_author = authoring.join("docs");
        fs::create_dir_all(&head_author).unwrap();
        git(&head_author, &["init", "-q"]);
        git(&head_author, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        configure_author(&head_author);
        fs::create_dir_all(head_author.join("docs")).unwrap();
        fs::write(head_author.join("README.md"), "# Docs\n").unwrap();
        fs::write(head_author.join("docs/intro.md"), "Welcome to the docs.\n").unwrap();
        git(&head_author, &["add", "-A"]);
        git(&head_author, &["commit", "-q", "-m", "Initial commit"]);

        let head_remote = remotes.join("docs.git");
        let origin_remote = remotes.join("ja.docs.git");
        git(root, &["clone", "-q", "--bare", &path_str(&head_author), &path_str(&head_remote)]);
        git(root, &["clone", "-q", "--bare", &path_str(&head_remote), &path_str(&origin_remote)]);
        git(&head_author, &["remote", "add", "origin", &path_str(&head_remote)]);

        let origin_author = authoring.join("ja.docs");
        git(root, &["clone", "-q", &path_str(&origin_remote), &path_str(&origin_author)]);
        configure_author(&origin_author);

        let workdir = root.join("work");

        Self {
            dir,
            head_remote,
            origin_remote,
            head_author,
            origin_author,
            workdir,
        }
    }

    /// Temp dir root
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Commit a file change to the canonical repo and return the full hash
    pub fn commit_to_head(&self, file: &str, content: &str, message: &str) -> String {
        Self::commit_and_push(&self.head_author, file, content, message)
    }

    /// Commit a file change to the translation repo and return the full hash
    pub fn commit_to_origin(&self, file: &str, content: &str, message: &str) -> String {
        Self::commit_and_push(&self.origin_author, file, content, message)
    }

    fn commit_and_push(repo: &Path, file: &str, content: &str, message: &str) -> String {
        let path = repo.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        git(repo, &["add", "-A"]);
        git(repo, &["commit", "-q", "-m", message]);
        git(repo, &["push", "-q", "origin", "main"]);
        git(repo, &["rev-parse", "HEAD"])
    }

    /// Fast-forward the translation repo to the canonical repo's `main`
    pub fn merge_head_into_origin(&self) {
        git(&self.origin_author, &["pull", "-q", "--no-rebase", &path_str(&self.head_remote), "main"]);
        git(&self.origin_author, &["push", "-q", "origin", "main"]);
    }

    /// Branches on the translation remote
    pub fn origin_branches(&self) -> Vec<String> {
        git(
            &self.origin_remote,
            &["for-each-ref", "--format=%(refname:short)", "refs/heads/"],
        )
        .lines()
        .map(ToString::to_string)
        .collect()
    }

    /// File content on a branch of the translation remote
    pub fn origin_file(&self, branch: &str, file: &str) -> String {
        git(&self.origin_remote, &["show", &format!("{branch}:{file}")])
    }

    /// origin = upstream = translation repo, head = canonical repo
    pub fn topology(&self) -> RemoteTopology {
        let origin = RemoteSpec::from_url(&path_str(&self.origin_remote), "main").unwrap();
        let head = RemoteSpec::from_url(&path_str(&self.head_remote), "main").unwrap();
        RemoteTopology {
            origin: origin.clone(),
            upstream: origin,
            head: Some(head),
        }
    }

    /// Bot identity
    pub fn identity() -> CommitIdentity {
        CommitIdentity {
            name: "docs-bot".to_string(),
            email: "bot@test.com".to_string(),
        }
    }

    /// Working copy in `work/ja.docs` (not set up)
    pub fn working_copy(&self) -> WorkingCopy {
        WorkingCopy::new(&self.workdir, self.topology(), Self::identity(), Git::new())
    }

    /// Working copy after `setup()`
    pub async fn ready_working_copy(&self) -> WorkingCopy {
        let mut wc = self.working_copy();
        wc.setup().await.expect("working copy setup");
        wc
    }

    /// Create a bare fork of the translation repo and return its path
    pub fn fork_translation(&self) -> PathBuf {
        let forks = self.root().join("remotes").join("bot");
        fs::create_dir_all(&forks).unwrap();
        let fork = forks.join("ja.docs.git");
        git(
            self.root(),
            &["clone", "-q", "--bare", &path_str(&self.origin_remote), &path_str(&fork)],
        );
        fork
    }

    /// origin = `fork`, upstream = translation repo, head = canonical repo
    pub fn fork_topology(&self, fork: &Path) -> RemoteTopology {
        let mut topology = self.topology();
        topology.origin = RemoteSpec::from_url(&path_str(fork), "main").unwrap();
        topology
    }

    /// Set-up working copy whose origin is `fork`
    pub async fn ready_fork_working_copy(&self, fork: &Path) -> WorkingCopy {
        let mut wc = WorkingCopy::new(
            &self.workdir,
            self.fork_topology(fork),
            Self::identity(),
            Git::new(),
        );
        wc.setup().await.expect("working copy setup");
        wc
    }

    /// Feed item pointing at a canonical commit
    pub fn feed_item(hash: &str, title: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: format!("https://github.com/acme/docs/commit/{hash}"),
            published_at: None,
        }
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
