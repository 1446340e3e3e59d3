//! Merge orchestration - effectful operations
//!
//! [`MergeOrchestrator`] turns feed items into merge tasks. Repository
//! queries and every working copy mutation run as [`MergeQueue`] tasks;
//! issue tracker calls that the task depends on (issue lookup and creation)
//! are awaited before the task is queued.

use crate::error::Result;
use crate::git::{Integration, WorkingCopy};
use crate::merge::plan::{MergeTask, SkipReason, guard_verdict, issue_body, issue_title};
use crate::platform::IssueTracker;
use crate::queue::{MergeQueue, TaskHandle};
use crate::tracking::{LedgerFile, Outcome, ProcessedCommit};
use crate::types::{CommitRef, FeedItem, PullRequest, TrackingIssue};
use chrono::Utc;
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Settings the orchestrator needs from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Prefix for tracking issue titles (e.g. `"[Doc]: "`)
    pub issue_title_prefix: String,
    /// Labels applied to new tracking issues
    pub labels: Vec<String>,
    /// Users asked to review each pull request
    pub reviewers: Vec<String>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            issue_title_prefix: "[Doc]: ".to_string(),
            labels: vec!["documentation".to_string()],
            reviewers: Vec::new(),
        }
    }
}

/// How a merge task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Cherry-picked, pushed and a pull request opened
    PullRequestOpened(PullRequest),
    /// Cherry-pick conflicted; the working copy was reset and nothing pushed
    Conflicted,
    /// The commit reached the default branch before the task ran
    AlreadyMerged,
}

impl MergeOutcome {
    const fn ledger_outcome(&self) -> Outcome {
        match self {
            Self::PullRequestOpened(_) => Outcome::PullRequestOpened,
            Self::Conflicted => Outcome::Conflicted,
            Self::AlreadyMerged => Outcome::AlreadyMerged,
        }
    }
}

/// What happened to a feed item
#[derive(Debug)]
pub enum Dispatch {
    /// Nothing to do
    Skipped(SkipReason),
    /// A merge task was queued
    Queued {
        /// Tracking issue the pull request will reference
        issue: TrackingIssue,
        /// Completion of the queued task
        handle: TaskHandle<MergeOutcome>,
    },
}

type InFlightSet = Arc<Mutex<HashSet<String>>>;

/// Removes a short hash from the in-flight set when dropped, so the set is
/// released on success, error, panic and early return alike.
struct InFlightClaim {
    set: InFlightSet,
    short_hash: String,
}

impl InFlightClaim {
    fn acquire(set: &InFlightSet, short_hash: &str) -> Option<Self> {
        let mut guard = set.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.insert(short_hash.to_string()).then(|| Self {
            set: Arc::clone(set),
            short_hash: short_hash.to_string(),
        })
    }
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&self.short_hash);
    }
}

/// Top-level feed item handler
#[derive(Clone)]
pub struct MergeOrchestrator {
    queue: MergeQueue<WorkingCopy>,
    tracker: Arc<dyn IssueTracker>,
    options: Arc<OrchestratorOptions>,
    in_flight: InFlightSet,
    ledger: Option<Arc<Mutex<LedgerFile>>>,
}

impl MergeOrchestrator {
    /// Create an orchestrator that runs its git work on `queue`
    pub fn new(
        queue: MergeQueue<WorkingCopy>,
        tracker: Arc<dyn IssueTracker>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            queue,
            tracker,
            options: Arc::new(options),
            in_flight: Arc::default(),
            ledger: None,
        }
    }

    /// Record terminal outcomes in `ledger` and skip commits it already has
    #[must_use]
    pub fn with_ledger(mut self, ledger: LedgerFile) -> Self {
        self.ledger = Some(Arc::new(Mutex::new(ledger)));
        self
    }

    /// Consume feed items until the channel closes.
    ///
    /// Errors for a single item are logged and never end the loop. Queued
    /// tasks are not awaited here; the queue runs them in order.
    pub async fn run(self, mut items: mpsc::Receiver<FeedItem>) {
        while let Some(item) = items.recv().await {
            let title = item.title.clone();
            if let Err(e) = self.handle_item(item).await {
                error!(%title, error = %e, "failed to handle feed item");
            }
        }
        debug!("feed channel closed; orchestrator stopped");
    }

    /// Run the guards for one feed item and queue a merge task if needed
    pub async fn handle_item(&self, item: FeedItem) -> Result<Dispatch> {
        let commit = CommitRef::from_link(&item.link)?;
        let short_hash = commit.short_hash.clone();
        info!(%short_hash, title = %item.title, "new commit on head repo");

        let Some(claim) = InFlightClaim::acquire(&self.in_flight, &short_hash) else {
            return Ok(skip(&item, &commit, SkipReason::InFlight));
        };

        if self.ledger_contains(&short_hash) {
            return Ok(skip(&item, &commit, SkipReason::AlreadyProcessed));
        }

        if let Some(reason) = self.check_repository(&commit).await? {
            return Ok(skip(&item, &commit, reason));
        }

        let issue = self.find_or_create_issue(&item, &commit).await?;

        let task = MergeTask {
            commit,
            item,
            issue: Some(issue.clone()),
        };
        let handle = self.enqueue(task, claim)?;
        Ok(Dispatch::Queued { issue, handle })
    }

    fn ledger_contains(&self, short_hash: &str) -> bool {
        self.ledger.as_ref().is_some_and(|ledger| {
            ledger
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .contains(short_hash)
        })
    }

    // Reads the working copy, so it goes through the queue like everything
    // else that touches it.
    async fn check_repository(&self, commit: &CommitRef) -> Result<Option<SkipReason>> {
        let hash = commit.hash.clone();
        let short_hash = commit.short_hash.clone();
        let handle = self
            .queue
            .submit(format!("check {short_hash}"), move |wc: &mut WorkingCopy| {
                async move {
                    let commit_exists = wc.exists_commit(&hash).await?;
                    let branch_exists =
                        !commit_exists && wc.exists_remote_branch(&short_hash).await?;
                    Ok(guard_verdict(commit_exists, branch_exists))
                }
                .boxed()
            })?;
        handle.wait().await
    }

    async fn find_or_create_issue(
        &self,
        item: &FeedItem,
        commit: &CommitRef,
    ) -> Result<TrackingIssue> {
        let search = self.tracker.search_issue(&commit.short_hash).await?;
        if search.total_count > 0
            && let Some(existing) = search.items.into_iter().next()
        {
            debug!(short_hash = %commit.short_hash, issue = existing.number, "reusing tracking issue");
            return Ok(existing);
        }

        let title = issue_title(&self.options.issue_title_prefix, &item.title);
        let body = issue_body(item, commit);
        let issue = self
            .tracker
            .create_issue(&title, &body, &self.options.labels)
            .await?;
        info!(
            outcome = "success",
            short_hash = %commit.short_hash,
            issue = issue.number,
            url = %issue.html_url,
            "issue created"
        );
        Ok(issue)
    }

    fn enqueue(&self, task: MergeTask, claim: InFlightClaim) -> Result<TaskHandle<MergeOutcome>> {
        let tracker = Arc::clone(&self.tracker);
        let options = Arc::clone(&self.options);
        let ledger = self.ledger.clone();
        let label = format!("merge {}", task.commit.short_hash);

        self.queue.submit(label, move |wc: &mut WorkingCopy| {
            async move {
                let _claim = claim;
                // A panicked predecessor never reached its own restore.
                wc.reset_changes().await?;
                let result = attempt_merge(wc, tracker.as_ref(), &options, &task).await;
                restore(wc, task.branch()).await;
                let outcome = result?;
                if let Some(ledger) = ledger {
                    record_outcome(&ledger, &task, &outcome);
                }
                Ok(outcome)
            }
            .boxed()
        })
    }
}

fn skip(item: &FeedItem, commit: &CommitRef, reason: SkipReason) -> Dispatch {
    warn!(short_hash = %commit.short_hash, title = %item.title, %reason, "skipping commit");
    Dispatch::Skipped(reason)
}

/// Body of a merge task: fetch, branch, cherry-pick, and on success push and
/// open the pull request.
async fn attempt_merge(
    wc: &mut WorkingCopy,
    tracker: &dyn IssueTracker,
    options: &OrchestratorOptions,
    task: &MergeTask,
) -> Result<MergeOutcome> {
    let short_hash = task.branch();
    let title = &task.item.title;

    wc.fetch_all_remotes().await?;
    wc.update_default_branch().await?;

    if wc.exists_commit(&task.commit.hash).await? {
        warn!(%short_hash, %title, "commit has already been merged");
        return Ok(MergeOutcome::AlreadyMerged);
    }

    wc.delete_old_branch(short_hash).await?;
    wc.create_new_branch(short_hash).await?;

    if wc
        .has_conflicts(Integration::CherryPick, &task.commit.hash)
        .await?
    {
        wc.reset_changes().await?;
        warn!(
            %short_hash,
            %title,
            "Conflicts occurred. Please make a pull request by yourself"
        );
        return Ok(MergeOutcome::Conflicted);
    }

    wc.update_remote(short_hash).await?;
    let pr = tracker
        .create_pull_request(&task.pull_request_title(), &task.pull_request_body(), short_hash)
        .await?;
    info!(
        outcome = "success",
        %short_hash,
        pr = pr.number,
        url = %pr.html_url,
        "pull request created"
    );

    if let Err(e) = tracker.assign_reviewers(pr.number, &options.reviewers).await {
        warn!(pr = pr.number, error = %e, "failed to request reviewers; PR left open");
    }

    Ok(MergeOutcome::PullRequestOpened(pr))
}

// Every task ends on a clean default branch, whatever happened above.
async fn restore(wc: &mut WorkingCopy, branch: &str) {
    if let Err(e) = wc.reset_changes().await {
        error!(error = %e, "failed to reset working copy");
        return;
    }
    if let Err(e) = wc.delete_old_branch(branch).await {
        warn!(%branch, error = %e, "failed to delete local branch");
    }
}

fn record_outcome(ledger: &Mutex<LedgerFile>, task: &MergeTask, outcome: &MergeOutcome) {
    let entry = ProcessedCommit {
        short_hash: task.commit.short_hash.clone(),
        hash: task.commit.hash.clone(),
        title: task.item.title.clone(),
        outcome: outcome.ledger_outcome(),
        issue: task.issue.as_ref().map(|i| i.number),
        pull_request: match outcome {
            MergeOutcome::PullRequestOpened(pr) => Some(pr.number),
            _ => None,
        },
        recorded_at: Utc::now(),
    };
    let mut ledger = ledger
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Err(e) = ledger.record(entry) {
        warn!(path = %ledger.path().display(), error = %e, "failed to update ledger");
    }
}
