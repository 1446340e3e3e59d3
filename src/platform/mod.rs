//! Issue tracker services
//!
//! The merge orchestrator only talks to the tracker through [`IssueTracker`],
//! so tests can substitute an in-memory implementation.

mod detection;
mod github;

pub use detection::{commits_feed_url, parse_repo_info};
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{IssueSearch, PullRequest, TrackingIssue};
use async_trait::async_trait;

/// Issue and pull request operations on the downstream repository
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Search issues, open or closed, whose title or body mention `short_hash`
    async fn search_issue(&self, short_hash: &str) -> Result<IssueSearch>;

    /// Create an issue
    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<TrackingIssue>;

    /// Close an issue
    async fn close_issue(&self, number: u64) -> Result<()>;

    /// Open a pull request from `branch` into the configured default branch
    async fn create_pull_request(&self, title: &str, body: &str, branch: &str)
    -> Result<PullRequest>;

    /// Close a pull request without merging
    async fn close_pull_request(&self, number: u64) -> Result<()>;

    /// Request review from the given users
    async fn assign_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<()>;
}
