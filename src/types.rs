//! Core types for cherry-sync

use crate::error::{Error, Result};
use crate::platform::parse_repo_info;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of hex characters kept from a commit hash when naming branches.
///
/// Refs spelled as a full 40-character hex string are treated by git as object
/// names, so a shorter prefix is used instead.
pub const SHORT_HASH_LEN: usize = 8;

/// Logical role of a git remote in the working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteRole {
    /// The translation repository; pushed to, never fetched
    Origin,
    /// The repository whose default branch the local mirror follows
    Upstream,
    /// The canonical repository whose commit feed is watched
    Head,
}

impl RemoteRole {
    /// Name of the git remote registered for this role
    pub const fn remote_name(self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Upstream => "upstream",
            Self::Head => "head",
        }
    }
}

impl std::fmt::Display for RemoteRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.remote_name())
    }
}

/// One git remote, immutable once built from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSpec {
    /// Clone URL
    pub url: String,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name (without `.git`)
    pub name: String,
    /// Default branch name (e.g., "main")
    pub default_branch: String,
}

impl RemoteSpec {
    /// Build a remote from its URL, deriving owner and name
    pub fn from_url(url: &str, default_branch: &str) -> Result<Self> {
        let info = parse_repo_info(url)?;
        Ok(Self {
            url: url.to_string(),
            owner: info.owner,
            name: info.repo,
            default_branch: default_branch.to_string(),
        })
    }

    /// `owner/name` slug
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// The three remotes a working copy knows about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTopology {
    /// Translation repository (read-write)
    pub origin: RemoteSpec,
    /// Repository merged into the local default branch before each attempt
    pub upstream: RemoteSpec,
    /// Canonical source repository, if different from upstream
    pub head: Option<RemoteSpec>,
}

impl RemoteTopology {
    /// Remote whose commits are cherry-picked and whose feed is watched
    pub fn canonical(&self) -> (RemoteRole, &RemoteSpec) {
        match &self.head {
            Some(head) => (RemoteRole::Head, head),
            None => (RemoteRole::Upstream, &self.upstream),
        }
    }

    /// Remote spec for a role (`None` only for an unconfigured head)
    pub fn get(&self, role: RemoteRole) -> Option<&RemoteSpec> {
        match role {
            RemoteRole::Origin => Some(&self.origin),
            RemoteRole::Upstream => Some(&self.upstream),
            RemoteRole::Head => self.head.as_ref(),
        }
    }
}

/// Identity used for commits created in the working copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    /// git `user.name`
    pub name: String,
    /// git `user.email`
    pub email: String,
}

/// One entry of the watched commit feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Commit subject as shown in the feed
    pub title: String,
    /// Commit URL; the last path segment is the commit hash
    pub link: String,
    /// Publication (or last update) time, if the feed carries one
    pub published_at: Option<DateTime<Utc>>,
}

/// A commit referenced by a feed item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitRef {
    /// Full lowercase hex hash
    pub hash: String,
    /// First [`SHORT_HASH_LEN`] characters of `hash`, used as the branch name
    pub short_hash: String,
}

impl CommitRef {
    /// Parse a commit hash, normalising to lowercase
    pub fn parse(hash: &str) -> Result<Self> {
        let hash = hash.trim().to_ascii_lowercase();
        if hash.len() < SHORT_HASH_LEN || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidCommitLink(hash));
        }
        let short_hash = hash[..SHORT_HASH_LEN].to_string();
        Ok(Self { hash, short_hash })
    }

    /// Extract the commit from the last path segment of a commit URL
    pub fn from_link(link: &str) -> Result<Self> {
        let path = link.split(['?', '#']).next().unwrap_or_default();
        let segment = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        Self::parse(segment).map_err(|_| Error::InvalidCommitLink(link.to_string()))
    }
}

impl std::fmt::Display for CommitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.short_hash)
    }
}

/// An issue in the downstream tracker correlated with one upstream commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingIssue {
    /// Issue number
    pub number: u64,
    /// Web URL for the issue
    pub html_url: String,
}

/// Result of an issue search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSearch {
    /// Total matches reported by the tracker
    pub total_count: u64,
    /// Matching issues (first page)
    pub items: Vec<TrackingIssue>,
}

/// A pull request opened by the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
}

/// Repository the issue tracker operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
    /// Base branch for pull requests
    pub default_branch: String,
}

/// Repository coordinates parsed from a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    /// Host name (e.g., "github.com")
    pub host: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
}
