//! The local clone the bot cherry-picks in
//!
//! A [`WorkingCopy`] owns one checkout directory. Operations that change what
//! is checked out take `&mut self`, so only whoever holds the working copy
//! exclusively (the merge queue worker) can move it between states.

use crate::error::{Error, Result};
use crate::git::client::{Git, GitOutput};
use crate::types::{CommitIdentity, RemoteRole, RemoteSpec, RemoteTopology};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How a commit is brought onto the current branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    /// `git cherry-pick -x <hash>`
    CherryPick,
    /// `git merge --no-edit <ref>`
    Merge,
}

/// Local clone of the origin repository with upstream and head registered
#[derive(Debug)]
pub struct WorkingCopy {
    git: Git,
    root: PathBuf,
    path: PathBuf,
    topology: RemoteTopology,
    identity: CommitIdentity,
}

impl WorkingCopy {
    /// Describe a working copy living at `<root>/<origin name>`
    pub fn new(
        root: impl Into<PathBuf>,
        topology: RemoteTopology,
        identity: CommitIdentity,
        git: Git,
    ) -> Self {
        let root = root.into();
        let path = root.join(&topology.origin.name);
        Self {
            git,
            root,
            path,
            topology,
            identity,
        }
    }

    /// Checkout directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remote layout this working copy was built from
    pub const fn topology(&self) -> &RemoteTopology {
        &self.topology
    }

    /// Name of the local default branch (origin's default branch)
    pub fn default_branch(&self) -> &str {
        &self.topology.origin.default_branch
    }

    async fn run(&self, args: &[&str]) -> Result<GitOutput> {
        self.git.exec(&self.path, args).await
    }

    async fn run_checked(&self, args: &[&str]) -> Result<GitOutput> {
        self.run(args).await?.require_success(&args.join(" "))
    }

    /// Bring the clone into a known state.
    ///
    /// Clones origin if the directory does not exist yet, (re)registers the
    /// upstream and head remotes, sets the commit identity, then hard-resets,
    /// checks out the default branch and deletes every other local branch.
    /// A failed clone is returned as [`Error::CloneFailed`] before any remote
    /// is touched.
    pub async fn setup(&mut self) -> Result<()> {
        if !self.path.join(".git").exists() {
            std::fs::create_dir_all(&self.root)?;
            let origin = &self.topology.origin;
            info!(url = %origin.url, path = %self.path.display(), "cloning origin");
            let output = self
                .git
                .exec(&self.root, &["clone", &origin.url, &origin.name])
                .await?;
            if !output.success() {
                return Err(Error::CloneFailed {
                    url: origin.url.clone(),
                    path: self.path.clone(),
                    stderr: output.stderr.trim().to_string(),
                });
            }
        }

        self.ensure_remote(RemoteRole::Upstream).await?;
        if self.topology.head.is_some() {
            self.ensure_remote(RemoteRole::Head).await?;
        }
        self.run_checked(&["config", "user.name", &self.identity.name])
            .await?;
        self.run_checked(&["config", "user.email", &self.identity.email])
            .await?;

        self.reset_changes().await?;
        self.delete_other_branches().await?;
        debug!(path = %self.path.display(), "working copy ready");
        Ok(())
    }

    async fn ensure_remote(&self, role: RemoteRole) -> Result<()> {
        let Some(spec) = self.topology.get(role) else {
            return Ok(());
        };
        let name = role.remote_name();
        if self.run(&["remote", "get-url", name]).await?.success() {
            self.run_checked(&["remote", "set-url", name, &spec.url])
                .await?;
        } else {
            self.run_checked(&["remote", "add", name, &spec.url])
                .await?;
        }
        Ok(())
    }

    async fn delete_other_branches(&mut self) -> Result<()> {
        let default = self.default_branch().to_string();
        for branch in self.local_branches().await? {
            if branch != default {
                debug!(%branch, "deleting leftover branch");
                self.run_checked(&["branch", "-D", &branch]).await?;
            }
        }
        Ok(())
    }

    /// Fetch the upstream and head default branches. Origin is never fetched.
    pub async fn fetch_all_remotes(&mut self) -> Result<()> {
        self.fetch_remote(RemoteRole::Upstream).await?;
        if self.topology.head.is_some() {
            self.fetch_remote(RemoteRole::Head).await?;
        }
        Ok(())
    }

    /// Fetch one remote's default branch
    pub async fn fetch_remote(&mut self, role: RemoteRole) -> Result<()> {
        let Some(spec) = self.topology.get(role) else {
            return Ok(());
        };
        let name = role.remote_name();
        self.git
            .fetch(&self.path, name, &spec.default_branch, &[])
            .await?
            .require_success(&format!("fetch {name} {}", spec.default_branch))?;
        Ok(())
    }

    /// Check out the default branch and merge the fetched upstream default
    /// branch into it. A failed merge is aborted and reported.
    ///
    /// When upstream is a separate repository the merged default branch is
    /// pushed to origin, so branches cut from it only differ from origin's
    /// default branch by their own commits.
    pub async fn update_default_branch(&mut self) -> Result<()> {
        self.checkout_default_branch().await?;
        let target = remote_ref(RemoteRole::Upstream, &self.topology.upstream);
        let output = self.git.merge(&self.path, &target, &["--no-edit"]).await?;
        if !output.success() {
            warn!(%target, "merging upstream into the default branch failed");
            let _ = self.run(&["merge", "--abort"]).await?;
            return output.require_success(&format!("merge {target}")).map(|_| ());
        }

        if self.has_separate_upstream() {
            let branch = self.default_branch().to_string();
            debug!(%branch, "publishing merged default branch to origin");
            self.update_remote(&branch).await?;
        }
        Ok(())
    }

    /// Whether upstream and origin are different repositories
    pub fn has_separate_upstream(&self) -> bool {
        self.topology.upstream.url != self.topology.origin.url
    }

    /// Check out the local default branch
    pub async fn checkout_default_branch(&mut self) -> Result<()> {
        let branch = self.default_branch().to_string();
        self.git
            .checkout(&self.path, &branch, &[])
            .await?
            .require_success(&format!("checkout {branch}"))?;
        Ok(())
    }

    /// Whether `refs/heads/<name>` exists on origin
    pub async fn exists_remote_branch(&self, name: &str) -> Result<bool> {
        let refname = format!("refs/heads/{name}");
        let output = self
            .run(&["ls-remote", "--exit-code", "--heads", "origin", &refname])
            .await?;
        match output.exit_code {
            0 => Ok(!output.stdout_trimmed().is_empty()),
            // --exit-code reports "no matching refs" as 2
            2 => Ok(false),
            _ => output
                .require_success(&format!("ls-remote origin {refname}"))
                .map(|_| false),
        }
    }

    /// Whether `hash` is already on the default branch, either as an ancestor
    /// or as the source of a `cherry-pick -x` commit.
    pub async fn exists_commit(&self, hash: &str) -> Result<bool> {
        let default = self.default_branch();
        let ancestor = self
            .run(&["merge-base", "--is-ancestor", hash, default])
            .await?;
        if ancestor.success() {
            return Ok(true);
        }

        let pattern = format!("(cherry picked from commit {hash}");
        let picked = self
            .run_checked(&[
                "log",
                default,
                "--format=%H",
                "-n",
                "1",
                "-F",
                "--grep",
                &pattern,
            ])
            .await?;
        Ok(!picked.stdout_trimmed().is_empty())
    }

    /// `git checkout -b <name>` from the current branch
    pub async fn create_new_branch(&mut self, name: &str) -> Result<()> {
        self.git
            .checkout(&self.path, name, &["-b"])
            .await?
            .require_success(&format!("checkout -b {name}"))?;
        Ok(())
    }

    /// Delete a local branch if it exists (left over from an aborted attempt)
    pub async fn delete_old_branch(&mut self, name: &str) -> Result<()> {
        if name == self.default_branch() {
            return Ok(());
        }
        let output = self.run(&["branch", "-D", name]).await?;
        if output.success() {
            debug!(branch = name, "deleted stale local branch");
        }
        Ok(())
    }

    /// Apply `target` onto the current branch and report whether it failed to
    /// apply cleanly.
    ///
    /// On `true` the working copy is left conflicted; call
    /// [`reset_changes`](Self::reset_changes) before anything else.
    pub async fn has_conflicts(&mut self, kind: Integration, target: &str) -> Result<bool> {
        let output = match kind {
            Integration::CherryPick => self.git.cherry_pick(&self.path, target, &["-x"]).await?,
            Integration::Merge => self.git.merge(&self.path, target, &["--no-edit"]).await?,
        };
        if !output.success() {
            debug!(?kind, target, stderr = %output.stderr.trim(), "did not apply cleanly");
        }
        Ok(!output.success())
    }

    /// Discard all uncommitted or conflicted state and return to the default
    /// branch.
    pub async fn reset_changes(&mut self) -> Result<()> {
        self.run_checked(&["reset", "--hard"]).await?;
        self.run_checked(&["clean", "-fd"]).await?;
        self.checkout_default_branch().await
    }

    /// Push a local branch to origin
    pub async fn update_remote(&mut self, branch: &str) -> Result<()> {
        self.git
            .push(&self.path, RemoteRole::Origin.remote_name(), branch, &[])
            .await?
            .require_success(&format!("push origin {branch}"))?;
        Ok(())
    }

    /// Stage everything and commit
    pub async fn commit_all(&mut self, message: &str) -> Result<()> {
        self.run_checked(&["add", "-A"]).await?;
        self.run_checked(&["commit", "--no-verify", "-m", message]).await?;
        Ok(())
    }

    /// Paths with unresolved conflicts
    pub async fn conflicted_files(&self) -> Result<Vec<String>> {
        let output = self
            .run_checked(&["diff", "--name-only", "--diff-filter=U"])
            .await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    /// Resolve a revision to a full hash
    pub async fn rev_parse(&self, rev: &str) -> Result<String> {
        let output = self.run_checked(&["rev-parse", "--verify", rev]).await?;
        Ok(output.stdout_trimmed().to_string())
    }

    /// Whether `ancestor` is reachable from `descendant`
    pub async fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        Ok(self
            .run(&["merge-base", "--is-ancestor", ancestor, descendant])
            .await?
            .success())
    }

    /// Name of the checked-out branch
    pub async fn current_branch(&self) -> Result<String> {
        let output = self.run_checked(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        Ok(output.stdout_trimmed().to_string())
    }

    /// Whether there are no staged, unstaged or untracked changes
    pub async fn is_clean(&self) -> Result<bool> {
        let output = self.run_checked(&["status", "--porcelain"]).await?;
        Ok(output.stdout_trimmed().is_empty())
    }

    /// Local branch names
    pub async fn local_branches(&self) -> Result<Vec<String>> {
        let output = self
            .run_checked(&["for-each-ref", "--format=%(refname:short)", "refs/heads/"])
            .await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }
}

/// `<remote>/<default branch>` for a role
pub fn remote_ref(role: RemoteRole, spec: &RemoteSpec) -> String {
    format!("{}/{}", role.remote_name(), spec.default_branch)
}
