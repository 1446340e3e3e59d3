//! Merge planning - pure functions
//!
//! Everything that decides *what* to write (titles, bodies, which guard
//! fired) lives here with no I/O, so it can be unit tested directly.

use crate::types::{CommitRef, FeedItem, TrackingIssue};
use regex::Regex;
use std::sync::LazyLock;

// A trailing "(#123)" refers to the upstream repo's own PR numbering.
static PR_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(#\d+\)\s*$").expect("valid regex"));

/// A cherry-pick attempt waiting in (or running on) the merge queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeTask {
    /// Commit to cherry-pick
    pub commit: CommitRef,
    /// Feed item that announced the commit
    pub item: FeedItem,
    /// Tracking issue found or created for the commit
    pub issue: Option<TrackingIssue>,
}

impl MergeTask {
    /// Branch the attempt is made on
    pub fn branch(&self) -> &str {
        &self.commit.short_hash
    }

    /// Title for the pull request
    pub fn pull_request_title(&self) -> String {
        normalize_title(&self.item.title)
    }

    /// Body for the pull request
    pub fn pull_request_body(&self) -> String {
        pull_request_body(self.issue.as_ref().map(|i| i.number), &self.item.link)
    }
}

/// Why a feed item was not queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The commit is already reachable from the default branch
    CommitExists,
    /// A branch named after the short hash already exists on origin
    BranchExists,
    /// A merge task for the same commit is queued or running
    InFlight,
    /// The ledger has a recorded outcome for the commit
    AlreadyProcessed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CommitExists => "commit has already been merged",
            Self::BranchExists => "remote branch already exists",
            Self::InFlight => "merge already queued",
            Self::AlreadyProcessed => "commit already processed",
        })
    }
}

/// Pick the skip reason from the repository guards, commit check first
pub const fn guard_verdict(commit_exists: bool, branch_exists: bool) -> Option<SkipReason> {
    if commit_exists {
        Some(SkipReason::CommitExists)
    } else if branch_exists {
        Some(SkipReason::BranchExists)
    } else {
        None
    }
}

/// Strip a trailing `(#NNN)` PR reference and surrounding whitespace
pub fn normalize_title(title: &str) -> String {
    PR_SUFFIX_REGEX.replace(title.trim(), "").trim().to_string()
}

/// Title for a new tracking issue
pub fn issue_title(prefix: &str, feed_title: &str) -> String {
    format!("{prefix}{}", normalize_title(feed_title))
}

/// Body for a new tracking issue.
///
/// The short hash is spelled out so that issue search by hash finds it.
pub fn issue_body(item: &FeedItem, commit: &CommitRef) -> String {
    format!(
        "Update to original repo\nOriginal: {}\nCommit: {}",
        item.link, commit.short_hash
    )
}

/// Body for the pull request opened after a clean cherry-pick
pub fn pull_request_body(issue_number: Option<u64>, link: &str) -> String {
    match issue_number {
        Some(n) => format!("This PR resolves #{n}\r\nCherry picked from {link}"),
        None => format!("Cherry picked from {link}"),
    }
}
