//! Shared test utilities

pub mod git_fixture;
pub mod mock_tracker;

pub use git_fixture::{GitFixture, git, path_str};
pub use mock_tracker::MockTracker;
