//! cherry-sync - keep a translation repository in step with its source
//!
//! Watches the commit feed of a canonical documentation repository and, for
//! each new commit, opens a tracking issue in the translation repository,
//! cherry-picks the commit onto a branch named after its short hash and
//! opens a pull request. Conflicting commits are reset and left for a human.
//!
//! # Architecture
//!
//! - [`feed`]: polls the commit feed and emits unseen items, oldest first
//! - [`merge`]: per-item guards, tracking issue lookup and the merge task
//! - [`queue`]: single-worker FIFO executor that owns the working copy
//! - [`git`]: git command runner and the working copy state machine
//! - [`platform`]: issue tracker trait and its GitHub implementation
//! - [`sync`]: whole-branch sync pull requests
//! - [`tracking`]: optional ledger of processed commits

pub mod auth;
pub mod config;
pub mod error;
pub mod feed;
pub mod git;
pub mod merge;
pub mod platform;
pub mod queue;
pub mod sync;
pub mod tracking;
pub mod types;

pub use error::{Error, Result};
