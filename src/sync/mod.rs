//! Sync pull requests
//!
//! Merges the canonical repository's whole default branch into the
//! translation repository on a `sync-<short hash>` branch, committing any
//! conflicts as they are so translators can resolve them in review.

mod execute;
mod plan;

pub use execute::{SyncOutcome, run_sync};
pub use plan::{CONFLICT_COMMIT_MESSAGE, sync_branch_name, sync_pull_request_body, sync_title};
