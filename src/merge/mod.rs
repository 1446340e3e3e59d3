//! Merge orchestration for new upstream commits
//!
//! Two-phase pattern:
//! 1. Plan - titles, bodies and guard verdicts (pure, testable)
//! 2. Execute - guards, issue lookup, queued cherry-pick and PR (effectful)

mod execute;
mod plan;

pub use execute::{Dispatch, MergeOrchestrator, MergeOutcome, OrchestratorOptions};
pub use plan::{
    MergeTask, SkipReason, guard_verdict, issue_body, issue_title, normalize_title,
    pull_request_body,
};
