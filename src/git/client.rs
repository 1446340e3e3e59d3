//! Thin wrapper around the `git` binary
//!
//! Every call names the directory it runs in; nothing here depends on the
//! process working directory. Commands run through `tokio::process`, so a
//! long fetch or push never holds up a runtime worker thread.
//!
//! A non-zero exit status is reported through [`GitOutput::exit_code`], never
//! as an `Err`: conflicts are an expected outcome that callers branch on.
//! `Err` is reserved for failing to spawn git.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use tokio::process::Command;
use tracing::trace;

/// Subcommands that talk to a remote and get the auth header
const NETWORK_SUBCOMMANDS: &[&str] = &["clone", "fetch", "push", "ls-remote", "pull"];

/// Captured result of one git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    /// Process exit code (-1 if killed by a signal)
    pub exit_code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl GitOutput {
    /// Whether git exited with status 0
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`Error::GitCommand`]
    pub fn require_success(self, command: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::GitCommand {
                command: command.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }

    /// Stdout with surrounding whitespace removed
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Async git command runner
#[derive(Debug, Clone, Default)]
pub struct Git {
    /// Pre-rendered `http.extraHeader` value for authenticated remotes
    auth_header: Option<String>,
}

impl Git {
    /// Runner that relies on the ambient git credential setup
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that authenticates HTTPS remotes with a GitHub token
    pub fn with_token(token: &str) -> Self {
        let encoded = STANDARD.encode(format!("x-access-token:{token}"));
        Self {
            auth_header: Some(format!("AUTHORIZATION: basic {encoded}")),
        }
    }

    /// Run `git <args>` in `dir`
    pub async fn exec(&self, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.env("GIT_MERGE_AUTOEDIT", "no");
        // Output is parsed (e.g. CONFLICT lines), so pin the locale.
        cmd.env("LC_ALL", "C");

        if let Some(header) = &self.auth_header
            && args.first().is_some_and(|sub| NETWORK_SUBCOMMANDS.contains(sub))
        {
            cmd.arg("-c").arg(format!("http.extraHeader={header}"));
        }
        cmd.args(args);

        trace!(dir = %dir.display(), args = ?args, "running git");
        let output = cmd.output().await.map_err(Error::GitSpawn)?;

        Ok(GitOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// `git checkout [options] <branch>`
    pub async fn checkout(&self, dir: &Path, branch: &str, options: &[&str]) -> Result<GitOutput> {
        self.exec(dir, &with_options("checkout", options, &[branch]))
            .await
    }

    /// `git fetch [options] <remote> <branch>`
    pub async fn fetch(
        &self,
        dir: &Path,
        remote: &str,
        branch: &str,
        options: &[&str],
    ) -> Result<GitOutput> {
        self.exec(dir, &with_options("fetch", options, &[remote, branch]))
            .await
    }

    /// `git merge [options] <branch>`
    pub async fn merge(&self, dir: &Path, branch: &str, options: &[&str]) -> Result<GitOutput> {
        self.exec(dir, &with_options("merge", options, &[branch]))
            .await
    }

    /// `git push [options] <remote> <branch>`
    pub async fn push(
        &self,
        dir: &Path,
        remote: &str,
        branch: &str,
        options: &[&str],
    ) -> Result<GitOutput> {
        self.exec(dir, &with_options("push", options, &[remote, branch]))
            .await
    }

    /// `git cherry-pick [options] <hash>`
    pub async fn cherry_pick(&self, dir: &Path, hash: &str, options: &[&str]) -> Result<GitOutput> {
        self.exec(dir, &with_options("cherry-pick", options, &[hash]))
            .await
    }
}

fn with_options<'a>(subcommand: &'a str, options: &[&'a str], rest: &[&'a str]) -> Vec<&'a str> {
    let mut args = Vec::with_capacity(1 + options.len() + rest.len());
    args.push(subcommand);
    args.extend_from_slice(options);
    args.extend_from_slice(rest);
    args
}
