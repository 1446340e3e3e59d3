//! Process configuration
//!
//! Read from a TOML file (default `cherry-sync.toml`):
//!
//! ```toml
//! [origin]
//! url = "https://github.com/reactjs/ja.react.dev.git"
//! default_branch = "main"
//!
//! # Optional; defaults to origin
//! [upstream]
//! url = "https://github.com/reactjs/ja.react.dev.git"
//!
//! # Optional; the canonical repository whose commits are cherry-picked
//! [head]
//! url = "https://github.com/reactjs/react.dev.git"
//!
//! [feed]
//! refresh_secs = 60
//! skip_initial = false
//!
//! [bot]
//! name = "docs-bot"
//! email = "docs-bot@example.com"
//! workdir = "repo"
//! reviewers = ["octocat"]
//! labels = ["documentation"]
//! issue_title_prefix = "[Doc]: "
//! state_file = "state/processed.toml"
//! ```
//!
//! `bot.name` and `bot.email` fall back to the `USER_NAME` and `EMAIL`
//! environment variables.

use crate::error::{Error, Result};
use crate::feed::WatcherOptions;
use crate::merge::OrchestratorOptions;
use crate::platform::{commits_feed_url, parse_repo_info};
use crate::types::{CommitIdentity, PlatformConfig, RemoteSpec, RemoteTopology};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "cherry-sync.toml";

/// Environment variable overriding the configuration file path
pub const CONFIG_ENV_VAR: &str = "CHERRY_SYNC_CONFIG";

fn default_branch() -> String {
    "main".to_string()
}

fn default_refresh_secs() -> u64 {
    60
}

fn default_workdir() -> PathBuf {
    PathBuf::from("repo")
}

fn default_labels() -> Vec<String> {
    vec!["documentation".to_string()]
}

fn default_issue_title_prefix() -> String {
    "[Doc]: ".to_string()
}

/// One `[origin]`/`[upstream]`/`[head]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Clone URL
    pub url: String,
    /// Default branch (default: "main")
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

impl RemoteConfig {
    fn to_spec(&self) -> Result<RemoteSpec> {
        RemoteSpec::from_url(&self.url, &self.default_branch)
    }
}

/// `[feed]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed URL (default: derived from the head or upstream remote)
    #[serde(default)]
    pub url: Option<String>,
    /// Seconds between polls
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Ignore items already in the feed at startup
    #[serde(default)]
    pub skip_initial: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            refresh_secs: default_refresh_secs(),
            skip_initial: false,
        }
    }
}

/// `[bot]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// git `user.name` for bot commits
    #[serde(default)]
    pub name: Option<String>,
    /// git `user.email` for bot commits
    #[serde(default)]
    pub email: Option<String>,
    /// Directory holding the working copy
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    /// Users asked to review each pull request
    #[serde(default)]
    pub reviewers: Vec<String>,
    /// Labels for new tracking issues
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
    /// Prefix for tracking issue titles
    #[serde(default = "default_issue_title_prefix")]
    pub issue_title_prefix: String,
    /// Processed-commit ledger; disabled when unset
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: None,
            email: None,
            workdir: default_workdir(),
            reviewers: Vec::new(),
            labels: default_labels(),
            issue_title_prefix: default_issue_title_prefix(),
            state_file: None,
        }
    }
}

/// Whole configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Translation repository
    pub origin: RemoteConfig,
    /// Repository merged into the local default branch (default: origin)
    #[serde(default)]
    pub upstream: Option<RemoteConfig>,
    /// Canonical repository
    #[serde(default)]
    pub head: Option<RemoteConfig>,
    /// Feed polling
    #[serde(default)]
    pub feed: FeedConfig,
    /// Bot identity and behaviour
    #[serde(default)]
    pub bot: BotConfig,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Pick the configuration file: explicit path, then `CHERRY_SYNC_CONFIG`,
    /// then [`DEFAULT_CONFIG_FILE`] in the current directory.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit.map_or_else(
            || {
                std::env::var_os(CONFIG_ENV_VAR)
                    .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
            },
            Path::to_path_buf,
        )
    }

    fn validate(&self) -> Result<()> {
        if self.feed.refresh_secs == 0 {
            return Err(Error::Config("feed.refresh_secs must be positive".to_string()));
        }
        self.topology().map(|_| ())
    }

    /// Remote layout for the working copy
    pub fn topology(&self) -> Result<RemoteTopology> {
        let origin = self.origin.to_spec()?;
        let upstream = match &self.upstream {
            Some(upstream) => upstream.to_spec()?,
            None => origin.clone(),
        };
        let head = self.head.as_ref().map(RemoteConfig::to_spec).transpose()?;
        Ok(RemoteTopology {
            origin,
            upstream,
            head,
        })
    }

    /// Feed URL, explicit or derived from the canonical remote
    pub fn feed_url(&self) -> Result<String> {
        if let Some(url) = &self.feed.url {
            return Ok(url.clone());
        }
        let topology = self.topology()?;
        let (_, canonical) = topology.canonical();
        Ok(commits_feed_url(
            &canonical.owner,
            &canonical.name,
            &canonical.default_branch,
        ))
    }

    /// Repository issues and pull requests are created in (origin)
    pub fn platform_config(&self) -> Result<PlatformConfig> {
        let info = parse_repo_info(&self.origin.url)?;
        Ok(PlatformConfig {
            owner: info.owner,
            repo: info.repo,
            host: Some(info.host).filter(|h| !h.is_empty() && h != "github.com"),
            default_branch: self.origin.default_branch.clone(),
        })
    }

    /// Commit identity from the file or the environment
    pub fn identity(&self) -> Result<CommitIdentity> {
        self.identity_with(|key| std::env::var(key).ok())
    }

    /// Commit identity, looking fallbacks up with `env`
    pub fn identity_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<CommitIdentity> {
        let name = self
            .bot
            .name
            .clone()
            .or_else(|| env("USER_NAME"))
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("bot.name is not set (or USER_NAME)".to_string()))?;
        let email = self
            .bot
            .email
            .clone()
            .or_else(|| env("EMAIL"))
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("bot.email is not set (or EMAIL)".to_string()))?;
        Ok(CommitIdentity { name, email })
    }

    /// Polling settings
    pub const fn watcher_options(&self) -> WatcherOptions {
        WatcherOptions {
            interval: Duration::from_secs(self.feed.refresh_secs),
            skip_initial: self.feed.skip_initial,
        }
    }

    /// Orchestrator settings
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            issue_title_prefix: self.bot.issue_title_prefix.clone(),
            labels: self.bot.labels.clone(),
            reviewers: self.bot.reviewers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[origin]
url = "https://github.com/reactjs/ja.react.dev.git"
"#;

    const FULL: &str = r#"
[origin]
url = "https://github.com/reactjs/ja.react.dev.git"
default_branch = "main"

[head]
url = "https://github.com/reactjs/react.dev.git"
default_branch = "trunk"

[feed]
refresh_secs = 30
skip_initial = true

[bot]
name = "docs-bot"
email = "bot@example.com"
workdir = "/var/lib/cherry-sync"
reviewers = ["alice", "bob"]
labels = []
issue_title_prefix = "[Merge]: "
state_file = "processed.toml"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.origin.default_branch, "main");
        assert_eq!(config.feed.refresh_secs, 60);
        assert!(!config.feed.skip_initial);
        assert_eq!(config.bot.workdir, PathBuf::from("repo"));
        assert_eq!(config.bot.labels, vec!["documentation".to_string()]);
        assert_eq!(config.bot.issue_title_prefix, "[Doc]: ");
        assert!(config.bot.state_file.is_none());

        let topology = config.topology().unwrap();
        assert_eq!(topology.upstream, topology.origin);
        assert!(topology.head.is_none());
    }

    #[test]
    fn test_default_orchestrator_options_match_config_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.orchestrator_options(), OrchestratorOptions::default());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(FULL).unwrap();
        let topology = config.topology().unwrap();
        let head = topology.head.as_ref().unwrap();
        assert_eq!(head.name, "react.dev");
        assert_eq!(head.default_branch, "trunk");

        let options = config.orchestrator_options();
        assert_eq!(options.reviewers, vec!["alice", "bob"]);
        assert!(options.labels.is_empty());
        assert_eq!(options.issue_title_prefix, "[Merge]: ");

        let watcher = config.watcher_options();
        assert_eq!(watcher.interval, Duration::from_secs(30));
        assert!(watcher.skip_initial);
    }

    #[test]
    fn test_feed_url_derived_from_head() {
        let config = Config::from_toml(FULL).unwrap();
        assert_eq!(
            config.feed_url().unwrap(),
            "https://github.com/reactjs/react.dev/commits/trunk.atom"
        );
    }

    #[test]
    fn test_feed_url_falls_back_to_upstream() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(
            config.feed_url().unwrap(),
            "https://github.com/reactjs/ja.react.dev/commits/main.atom"
        );
    }

    #[test]
    fn test_explicit_feed_url_wins() {
        let content = format!("{MINIMAL}\n[feed]\nurl = \"http://localhost/feed.atom\"\n");
        let config = Config::from_toml(&content).unwrap();
        assert_eq!(config.feed_url().unwrap(), "http://localhost/feed.atom");
    }

    #[test]
    fn test_platform_config_targets_origin() {
        let config = Config::from_toml(FULL).unwrap();
        let platform = config.platform_config().unwrap();
        assert_eq!(platform.owner, "reactjs");
        assert_eq!(platform.repo, "ja.react.dev");
        assert!(platform.host.is_none());
        assert_eq!(platform.default_branch, "main");
    }

    #[test]
    fn test_identity_prefers_file_over_env() {
        let config = Config::from_toml(FULL).unwrap();
        let identity = config
            .identity_with(|_| Some("from-env".to_string()))
            .unwrap();
        assert_eq!(identity.name, "docs-bot");
        assert_eq!(identity.email, "bot@example.com");
    }

    #[test]
    fn test_identity_env_fallback() {
        let config = Config::from_toml(MINIMAL).unwrap();
        let identity = config
            .identity_with(|key| match key {
                "USER_NAME" => Some("env-bot".to_string()),
                "EMAIL" => Some("env@example.com".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(identity.name, "env-bot");
        assert_eq!(identity.email, "env@example.com");
    }

    #[test]
    fn test_identity_missing_is_config_error() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert!(matches!(
            config.identity_with(|_| None),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_origin_is_error() {
        assert!(matches!(
            Config::from_toml("[feed]\nrefresh_secs = 5\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_zero_refresh_is_error() {
        let content = format!("{MINIMAL}\n[feed]\nrefresh_secs = 0\n");
        assert!(Config::from_toml(&content).is_err());
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        let path = Config::resolve_path(Some(Path::new("custom.toml")));
        assert_eq!(path, PathBuf::from("custom.toml"));
    }
}
