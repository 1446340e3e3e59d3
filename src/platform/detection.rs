//! Repository coordinates from remote URLs

use crate::error::{Error, Result};
use crate::types::RepoInfo;
use url::Url;

/// Parse owner and repository name out of a git remote URL.
///
/// Accepts HTTPS and `ssh://` URLs, scp-style `git@host:owner/repo` remotes,
/// and plain filesystem paths (where the parent directory plays the owner).
/// A trailing `.git` and trailing slashes are ignored.
pub fn parse_repo_info(url: &str) -> Result<RepoInfo> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidRepoUrl(url.to_string()));
    }

    let (host, path) = split_host_and_path(trimmed);

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let [.., owner, repo] = segments.as_slice() else {
        return Err(Error::InvalidRepoUrl(url.to_string()));
    };

    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return Err(Error::InvalidRepoUrl(url.to_string()));
    }

    Ok(RepoInfo {
        host,
        owner: (*owner).to_string(),
        repo: repo.to_string(),
    })
}

fn split_host_and_path(url: &str) -> (String, String) {
    if url.contains("://")
        && let Ok(parsed) = Url::parse(url)
    {
        let host = parsed.host_str().unwrap_or_default().to_string();
        return (host, parsed.path().to_string());
    }

    // scp-like syntax: [user@]host:path
    if let Some((prefix, path)) = url.split_once(':')
        && !prefix.contains('/')
        && !path.starts_with("//")
        && prefix.len() > 1
    {
        let host = prefix.rsplit('@').next().unwrap_or(prefix);
        return (host.to_string(), path.to_string());
    }

    (String::new(), url.to_string())
}

/// Commit-history Atom feed for a GitHub-hosted repository branch
pub fn commits_feed_url(owner: &str, repo: &str, branch: &str) -> String {
    format!("https://github.com/{owner}/{repo}/commits/{branch}.atom")
}
