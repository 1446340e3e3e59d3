//! Processed-commit ledger
//!
//! Opt-in record of commits the bot has finished with, kept across restarts.
//! It is an extra guard only: branch and commit existence in the working copy
//! stay authoritative, and a missing or deleted ledger just means those
//! guards do all the work.

mod storage;

pub use storage::{LedgerFile, load_ledger, save_ledger};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current ledger file format version
pub const TRACKING_VERSION: u32 = 1;

/// How processing of a commit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Cherry-picked cleanly and a pull request was opened
    PullRequestOpened,
    /// Cherry-pick conflicted; left for a human
    Conflicted,
    /// Already on the default branch after fetching
    AlreadyMerged,
}

/// One ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedCommit {
    /// Short hash (branch name)
    pub short_hash: String,
    /// Full commit hash
    pub hash: String,
    /// Feed item title
    pub title: String,
    /// Terminal outcome
    pub outcome: Outcome,
    /// Tracking issue number, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<u64>,
    /// Pull request number, if one was opened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<u64>,
    /// When the outcome was recorded
    pub recorded_at: DateTime<Utc>,
}

/// All processed commits, in the order they finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedLedger {
    /// File format version
    pub version: u32,
    /// Entries, at most one per short hash
    #[serde(default)]
    pub commits: Vec<ProcessedCommit>,
}

impl Default for ProcessedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessedLedger {
    /// Empty ledger
    pub const fn new() -> Self {
        Self {
            version: TRACKING_VERSION,
            commits: Vec::new(),
        }
    }

    /// Whether a commit has a recorded outcome
    pub fn contains(&self, short_hash: &str) -> bool {
        self.get(short_hash).is_some()
    }

    /// Recorded entry for a short hash
    pub fn get(&self, short_hash: &str) -> Option<&ProcessedCommit> {
        self.commits.iter().find(|c| c.short_hash == short_hash)
    }

    /// Record an outcome, replacing any earlier entry for the same commit
    pub fn record(&mut self, entry: ProcessedCommit) {
        self.commits.retain(|c| c.short_hash != entry.short_hash);
        self.commits.push(entry);
    }
}
