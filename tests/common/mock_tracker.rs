//! Mock issue tracker for testing
//!
//! These are test utilities - not all may be used by every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use cherry_sync::error::{Error, Result};
use cherry_sync::platform::IssueTracker;
use cherry_sync::types::{IssueSearch, PullRequest, TrackingIssue};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_issue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIssueCall {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Call record for `create_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePullRequestCall {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub branch: String,
}

/// Call record for `assign_reviewers`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignReviewersCall {
    pub pr_number: u64,
    pub reviewers: Vec<String>,
}

/// In-memory issue tracker
///
/// Issues and pull requests share one auto-incrementing number sequence, as
/// on GitHub. `search_issue` matches created issues whose title or body
/// contains the query, closed or not, like the GitHub search query does.
pub struct MockTracker {
    next_number: AtomicU64,
    // Call tracking
    search_calls: Mutex<Vec<String>>,
    create_issue_calls: Mutex<Vec<CreateIssueCall>>,
    create_pr_calls: Mutex<Vec<CreatePullRequestCall>>,
    assign_reviewers_calls: Mutex<Vec<AssignReviewersCall>>,
    closed_issues: Mutex<Vec<u64>>,
    closed_prs: Mutex<Vec<u64>>,
    // Error injection
    error_on_search: Mutex<Option<String>>,
    error_on_create_issue: Mutex<Option<String>>,
    error_on_create_pr: Mutex<Option<String>>,
    error_on_assign_reviewers: Mutex<Option<String>>,
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTracker {
    /// Mock for `acme/ja.docs`
    pub fn new() -> Self {
        Self {
            next_number: AtomicU64::new(1),
            search_calls: Mutex::new(Vec::new()),
            create_issue_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            assign_reviewers_calls: Mutex::new(Vec::new()),
            closed_issues: Mutex::new(Vec::new()),
            closed_prs: Mutex::new(Vec::new()),
            error_on_search: Mutex::new(None),
            error_on_create_issue: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            error_on_assign_reviewers: Mutex::new(None),
        }
    }

    // === Error injection methods ===

    /// Make `search_issue` return an error
    pub fn fail_search(&self, msg: &str) {
        *self.error_on_search.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_issue` return an error
    pub fn fail_create_issue(&self, msg: &str) {
        *self.error_on_create_issue.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pull_request` return an error
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `assign_reviewers` return an error
    pub fn fail_assign_reviewers(&self, msg: &str) {
        *self.error_on_assign_reviewers.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear all injected errors
    pub fn clear_errors(&self) {
        *self.error_on_search.lock().unwrap() = None;
        *self.error_on_create_issue.lock().unwrap() = None;
        *self.error_on_create_pr.lock().unwrap() = None;
        *self.error_on_assign_reviewers.lock().unwrap() = None;
    }

    // === Call inspection ===

    pub fn get_search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn get_create_issue_calls(&self) -> Vec<CreateIssueCall> {
        self.create_issue_calls.lock().unwrap().clone()
    }

    pub fn get_create_pr_calls(&self) -> Vec<CreatePullRequestCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    pub fn get_assign_reviewers_calls(&self) -> Vec<AssignReviewersCall> {
        self.assign_reviewers_calls.lock().unwrap().clone()
    }

    pub fn get_closed_issues(&self) -> Vec<u64> {
        self.closed_issues.lock().unwrap().clone()
    }

    pub fn get_closed_prs(&self) -> Vec<u64> {
        self.closed_prs.lock().unwrap().clone()
    }

    // === Assertions ===

    pub fn assert_no_pull_requests(&self) {
        let calls = self.get_create_pr_calls();
        assert!(calls.is_empty(), "expected no pull requests, got {calls:?}");
    }

    pub fn assert_pr_created_for_branch(&self, branch: &str) {
        let calls = self.get_create_pr_calls();
        assert!(
            calls.iter().any(|c| c.branch == branch),
            "expected a pull request from '{branch}', got {calls:?}"
        );
    }

    fn injected(slot: &Mutex<Option<String>>) -> Result<()> {
        match slot.lock().unwrap().as_ref() {
            Some(msg) => Err(Error::GitHubApi(msg.clone())),
            None => Ok(()),
        }
    }

    fn next(&self) -> u64 {
        self.next_number.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn search_issue(&self, short_hash: &str) -> Result<IssueSearch> {
        self.search_calls
            .lock()
            .unwrap()
            .push(short_hash.to_string());
        Self::injected(&self.error_on_search)?;

        let items: Vec<TrackingIssue> = self
            .create_issue_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.title.contains(short_hash) || c.body.contains(short_hash))
            .map(|c| TrackingIssue {
                number: c.number,
                html_url: format!("https://github.com/acme/ja.docs/issues/{}", c.number),
            })
            .collect();

        Ok(IssueSearch {
            total_count: items.len() as u64,
            items,
        })
    }

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<TrackingIssue> {
        Self::injected(&self.error_on_create_issue)?;
        let number = self.next();
        self.create_issue_calls.lock().unwrap().push(CreateIssueCall {
            number,
            title: title.to_string(),
            body: body.to_string(),
            labels: labels.to_vec(),
        });
        Ok(TrackingIssue {
            number,
            html_url: format!("https://github.com/acme/ja.docs/issues/{number}"),
        })
    }

    async fn close_issue(&self, number: u64) -> Result<()> {
        self.closed_issues.lock().unwrap().push(number);
        Ok(())
    }

    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        branch: &str,
    ) -> Result<PullRequest> {
        Self::injected(&self.error_on_create_pr)?;
        let number = self.next();
        self.create_pr_calls
            .lock()
            .unwrap()
            .push(CreatePullRequestCall {
                number,
                title: title.to_string(),
                body: body.to_string(),
                branch: branch.to_string(),
            });
        Ok(PullRequest {
            number,
            html_url: format!("https://github.com/acme/ja.docs/pull/{number}"),
        })
    }

    async fn close_pull_request(&self, number: u64) -> Result<()> {
        self.closed_prs.lock().unwrap().push(number);
        Ok(())
    }

    async fn assign_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<()> {
        self.assign_reviewers_calls
            .lock()
            .unwrap()
            .push(AssignReviewersCall {
                pr_number,
                reviewers: reviewers.to_vec(),
            });
        Self::injected(&self.error_on_assign_reviewers)
    }
}
