//! GitHub credential discovery

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use octocrab::Octocrab;
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
pub const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN", "GITHUB_ACCESS_TOKEN"];

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
    /// GitHub host (None for github.com)
    pub host: Option<String>,
}

/// First non-empty token among [`TOKEN_ENV_VARS`], looked up with `env`
pub fn token_from_env(env: impl Fn(&str) -> Option<String>) -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|key| env(key))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// Get GitHub authentication
///
/// Priority:
/// 1. `GITHUB_TOKEN`, `GH_TOKEN`, `GITHUB_ACCESS_TOKEN`
/// 2. `gh auth token`
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    if let Some(token) = token_from_env(|key| std::env::var(key).ok()) {
        debug!("using GitHub token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
            host: host.map(String::from),
        });
    }

    if let Some(token) = get_gh_cli_token(host).await {
        debug!("using GitHub token from gh CLI");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
            host: host.map(String::from),
        });
    }

    Err(Error::Auth(
        "No GitHub authentication found. Run `gh auth login` or set GITHUB_TOKEN".to_string(),
    ))
}

async fn get_gh_cli_token(host: Option<&str>) -> Option<String> {
    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(h) = host {
        cmd.args(["--hostname", h]);
    }

    let output = cmd.output().await.ok()?;
    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!token.is_empty()).then_some(token)
}

/// Check the token against the API and return the authenticated login
pub async fn test_github_auth(config: &GitHubAuthConfig) -> Result<String> {
    let mut builder = Octocrab::builder().personal_token(config.token.clone());
    if let Some(host) = config.host.as_deref().filter(|h| *h != "github.com") {
        builder = builder
            .base_uri(format!("https://{host}/api/v3"))
            .map_err(|e| Error::Auth(e.to_string()))?;
    }
    let client = builder.build().map_err(|e| Error::Auth(e.to_string()))?;

    let user = client
        .current()
        .user()
        .await
        .map_err(|e| Error::Auth(format!("token rejected: {e}")))?;
    Ok(user.login)
}
