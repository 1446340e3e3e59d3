//! CLI command implementations

mod auth;
mod context;
mod setup;
mod style;
mod sync;
mod watch;

pub use auth::run_auth;
pub use setup::run_setup;
pub use sync::{SyncOptions, run_sync};
pub use watch::run_watch;
