//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by watch, sync and setup.

use cherry_sync::auth::{GitHubAuthConfig, get_github_auth};
use cherry_sync::config::Config;
use cherry_sync::error::Result;
use cherry_sync::git::{Git, WorkingCopy};
use cherry_sync::platform::{GitHubService, IssueTracker};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared context for CLI commands that touch the working copy
///
/// This struct encapsulates the common setup:
/// - Loading and validating the configuration file
/// - Resolving the GitHub credential
/// - Creating the issue tracker for the origin repository
/// - Building the git runner that authenticates network commands
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Resolved credential
    pub auth: GitHubAuthConfig,
    /// Issue tracker for the origin repository
    pub tracker: Arc<dyn IssueTracker>,
    /// Git runner
    pub git: Git,
}

impl CommandContext {
    /// Load configuration from `config_path` (or the default location) and
    /// connect to GitHub
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let path = Config::resolve_path(config_path);
        debug!(path = %path.display(), "loading configuration");
        let config = Config::load(&path)?;

        let platform = config.platform_config()?;
        let auth = get_github_auth(platform.host.as_deref()).await?;
        let tracker: Arc<dyn IssueTracker> = Arc::new(GitHubService::new(&auth.token, platform)?);
        let git = Git::with_token(&auth.token);

        Ok(Self {
            config,
            auth,
            tracker,
            git,
        })
    }

    /// Working copy described by the configuration (not yet set up)
    pub fn working_copy(&self) -> Result<WorkingCopy> {
        Ok(WorkingCopy::new(
            &self.config.bot.workdir,
            self.config.topology()?,
            self.config.identity()?,
            self.git.clone(),
        ))
    }
}
