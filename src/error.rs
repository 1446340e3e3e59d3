//! Error types for cherry-sync

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in cherry-sync
#[derive(Error, Debug)]
pub enum Error {
    /// The git binary could not be spawned
    #[error("failed to run git: {0}")]
    GitSpawn(#[source] std::io::Error),

    /// A git command that must succeed exited non-zero
    #[error("git {command} failed (exit {exit_code}): {stderr}")]
    GitCommand {
        /// The subcommand and arguments
        command: String,
        /// Exit code reported by git
        exit_code: i32,
        /// Captured stderr
        stderr: String,
    },

    /// Initial clone of the working copy failed
    #[error("failed to clone {url} into {}: {stderr}", path.display())]
    CloneFailed {
        /// Remote URL that was cloned
        url: String,
        /// Destination directory
        path: PathBuf,
        /// Captured stderr
        stderr: String,
    },

    /// Feed could not be fetched
    #[error("feed error: {0}")]
    Feed(String),

    /// Feed body could not be parsed
    #[error("failed to parse feed: {0}")]
    FeedParse(String),

    /// A feed item link does not end in a commit hash
    #[error("link does not reference a commit: {0}")]
    InvalidCommitLink(String),

    /// Repository URL could not be parsed into owner/name
    #[error("invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Octocrab error
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication error
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Processed-commit ledger error
    #[error("tracking error: {0}")]
    Tracking(String),

    /// The merge queue worker is gone or dropped a task
    #[error("merge queue error: {0}")]
    Queue(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for cherry-sync operations
pub type Result<T> = std::result::Result<T, Error>;
