//! Sync execution - effectful operations

use crate::error::Result;
use crate::git::{Integration, WorkingCopy, remote_ref};
use crate::platform::IssueTracker;
use crate::sync::plan::{
    CONFLICT_COMMIT_MESSAGE, sync_branch_name, sync_pull_request_body, sync_title,
};
use crate::types::{CommitRef, PullRequest, RemoteRole};
use tracing::{debug, info, warn};

/// Result of a sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The default branch already contains the canonical default branch
    UpToDate,
    /// A sync branch for this commit already exists on origin
    BranchExists(String),
    /// A sync pull request was opened
    PullRequestOpened {
        /// The new pull request
        pr: PullRequest,
        /// Files committed with conflict markers
        conflicts: Vec<String>,
    },
}

/// Open a pull request merging the canonical default branch into origin.
///
/// The working copy must already be set up. It is returned to a clean
/// default branch whatever the result.
pub async fn run_sync(wc: &mut WorkingCopy, tracker: &dyn IssueTracker) -> Result<SyncOutcome> {
    let result = sync_inner(wc, tracker).await;
    if let Err(e) = wc.reset_changes().await {
        warn!(error = %e, "failed to reset working copy after sync");
    }
    result
}

async fn sync_inner(wc: &mut WorkingCopy, tracker: &dyn IssueTracker) -> Result<SyncOutcome> {
    let (role, source) = wc.topology().canonical();
    let source = source.clone();

    if role == RemoteRole::Head {
        wc.fetch_remote(RemoteRole::Upstream).await?;
        wc.update_default_branch().await?;
    } else {
        wc.checkout_default_branch().await?;
    }
    wc.fetch_remote(role).await?;

    let target = remote_ref(role, &source);
    let commit = CommitRef::parse(&wc.rev_parse(&target).await?)?;
    let default_branch = wc.default_branch().to_string();

    if wc.is_ancestor(&commit.hash, &default_branch).await? {
        info!(source = %source.slug(), short_hash = %commit.short_hash, "already up to date");
        return Ok(SyncOutcome::UpToDate);
    }

    let branch = sync_branch_name(&commit);
    if wc.exists_remote_branch(&branch).await? {
        warn!(%branch, "sync branch already exists on origin");
        return Ok(SyncOutcome::BranchExists(branch));
    }

    wc.delete_old_branch(&branch).await?;
    wc.create_new_branch(&branch).await?;

    let conflicts = if wc.has_conflicts(Integration::Merge, &target).await? {
        let files = wc.conflicted_files().await?;
        debug!(count = files.len(), "committing conflicted files");
        wc.commit_all(CONFLICT_COMMIT_MESSAGE).await?;
        files
    } else {
        Vec::new()
    };

    wc.update_remote(&branch).await?;
    let pr = tracker
        .create_pull_request(
            &sync_title(&source, &commit),
            &sync_pull_request_body(&source, &commit, &conflicts),
            &branch,
        )
        .await?;
    info!(
        outcome = "success",
        pr = pr.number,
        url = %pr.html_url,
        conflicts = conflicts.len(),
        "sync pull request created"
    );

    wc.checkout_default_branch().await?;
    wc.delete_old_branch(&branch).await?;
    Ok(SyncOutcome::PullRequestOpened { pr, conflicts })
}
