//! GitHub issue tracker implementation

use crate::error::{Error, Result};
use crate::platform::IssueTracker;
use crate::types::{IssueSearch, PlatformConfig, PullRequest, TrackingIssue};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::debug;

// Minimal REST payloads; octocrab's full models carry far more than we read.

#[derive(Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<IssueItem>,
}

#[derive(Deserialize)]
struct IssueItem {
    number: u64,
    html_url: String,
}

impl From<IssueItem> for TrackingIssue {
    fn from(item: IssueItem) -> Self {
        Self {
            number: item.number,
            html_url: item.html_url,
        }
    }
}

#[derive(Deserialize)]
struct PullItem {
    number: u64,
    html_url: String,
}

impl From<PullItem> for PullRequest {
    fn from(item: PullItem) -> Self {
        Self {
            number: item.number,
            html_url: item.html_url,
        }
    }
}

#[derive(Serialize)]
struct CreateIssuePayload<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<&'a [String]>,
}

#[derive(Serialize)]
struct CreatePullPayload<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
}

impl GitHubService {
    /// Create a new GitHub service for the repository in `config`
    pub fn new(token: &str, config: PlatformConfig) -> Result<Self> {
        let api_base = config
            .host
            .as_ref()
            .filter(|h| h.as_str() != "github.com")
            .map(|h| format!("https://{h}/api/v3"));
        Self::build(token, config, api_base.as_deref())
    }

    /// Create a service against an explicit API base URL
    pub fn with_api_base(token: &str, config: PlatformConfig, api_base: &str) -> Result<Self> {
        Self::build(token, config, Some(api_base))
    }

    fn build(token: &str, config: PlatformConfig, api_base: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(base) = api_base {
            builder = builder
                .base_uri(base)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }
        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn repo_route(&self, rest: &str) -> String {
        format!("/repos/{}/{}/{rest}", self.config.owner, self.config.repo)
    }
}

#[async_trait]
impl IssueTracker for GitHubService {
    async fn search_issue(&self, short_hash: &str) -> Result<IssueSearch> {
        let query = format!(
            "{short_hash} repo:{}/{} is:issue in:title,body",
            self.config.owner, self.config.repo
        );
        debug!(%query, "searching issues");

        let response: SearchResponse = self
            .client
            .get("/search/issues", Some(&[("q", query.as_str())]))
            .await?;

        debug!(total = response.total_count, "searched issues");
        Ok(IssueSearch {
            total_count: response.total_count,
            items: response.items.into_iter().map(Into::into).collect(),
        })
    }

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<TrackingIssue> {
        debug!(title, "creating issue");
        let payload = CreateIssuePayload {
            title,
            body,
            labels: (!labels.is_empty()).then_some(labels),
        };
        let issue: IssueItem = self
            .client
            .post(self.repo_route("issues"), Some(&payload))
            .await?;
        debug!(issue = issue.number, "created issue");
        Ok(issue.into())
    }

    async fn close_issue(&self, number: u64) -> Result<()> {
        debug!(issue = number, "closing issue");
        let _: serde_json::Value = self
            .client
            .patch(
                self.repo_route(&format!("issues/{number}")),
                Some(&serde_json::json!({ "state": "closed" })),
            )
            .await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        branch: &str,
    ) -> Result<PullRequest> {
        debug!(branch, base = %self.config.default_branch, "creating PR");
        let payload = CreatePullPayload {
            title,
            body,
            head: branch,
            base: &self.config.default_branch,
        };
        let pr: PullItem = self
            .client
            .post(self.repo_route("pulls"), Some(&payload))
            .await?;
        debug!(pr = pr.number, "created PR");
        Ok(pr.into())
    }

    async fn close_pull_request(&self, number: u64) -> Result<()> {
        debug!(pr = number, "closing PR");
        let _: serde_json::Value = self
            .client
            .patch(
                self.repo_route(&format!("pulls/{number}")),
                Some(&serde_json::json!({ "state": "closed" })),
            )
            .await?;
        Ok(())
    }

    async fn assign_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<()> {
        if reviewers.is_empty() {
            return Ok(());
        }
        debug!(pr = pr_number, ?reviewers, "requesting reviewers");
        let _: serde_json::Value = self
            .client
            .post(
                self.repo_route(&format!("pulls/{pr_number}/requested_reviewers")),
                Some(&serde_json::json!({ "reviewers": reviewers })),
            )
            .await?;
        Ok(())
    }
}
