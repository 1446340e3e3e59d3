//! Sync naming and PR text - pure functions

use crate::types::{CommitRef, RemoteSpec};
use std::fmt::Write;

/// Commit message used when conflicted files are committed as-is
pub const CONFLICT_COMMIT_MESSAGE: &str = "merging all conflicts";

/// Branch a sync at `commit` is pushed to
pub fn sync_branch_name(commit: &CommitRef) -> String {
    format!("sync-{}", commit.short_hash)
}

/// Pull request title for a sync
pub fn sync_title(source: &RemoteSpec, commit: &CommitRef) -> String {
    format!("Sync with {} @ {}", source.name, commit.short_hash)
}

/// Pull request body listing conflicted files as a checklist
pub fn sync_pull_request_body(
    source: &RemoteSpec,
    commit: &CommitRef,
    conflicts: &[String],
) -> String {
    let mut body = String::from("This PR was automatically generated.\n\n");
    let _ = writeln!(
        body,
        "Merge changes from [{slug}](https://github.com/{slug}/commits/{branch}) at {short}\n",
        slug = source.slug(),
        branch = source.default_branch,
        short = commit.short_hash,
    );

    if conflicts.is_empty() {
        body.push_str("No conflicts were found.\n");
    } else {
        body.push_str("The following files have conflicts and may need new translations:\n\n");
        for file in conflicts {
            let _ = writeln!(body, "* [ ] {file}");
        }
    }

    body.push_str(
        "\n## DO NOT SQUASH MERGE THIS PULL REQUEST!\n\n\
         Doing so will \"erase\" the commits from the default branch and cause them to show\n\
         up as conflicts the next time we merge.\n",
    );
    body
}
