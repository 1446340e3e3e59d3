//! Local git operations
//!
//! - [`Git`]: runs single git subcommands in an explicit directory
//! - [`WorkingCopy`]: the bot's clone and the state transitions around a
//!   cherry-pick attempt (setup, fetch, branch, apply, reset, push)

mod client;
mod working_copy;

pub use client::{Git, GitOutput};
pub use working_copy::{Integration, WorkingCopy, remote_ref};
