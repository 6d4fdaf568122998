//! Repository detection from remote URLs

use crate::error::{Error, Result};
use crate::types::PlatformConfig;
use regex::Regex;
use std::env;
use std::sync::LazyLock;

/// Regex for SSH URLs: git@host:owner/repo.git
static RE_SSH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^git@[^:]+:(.+?)(?:\.git)?$").unwrap());

/// Regex for HTTPS URLs: `https://host/owner/repo.git`
static RE_HTTPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^/]+/(.+?)(?:\.git)?$").unwrap());

/// Whether `hostname` is github.com or the configured Enterprise host
pub fn is_github_host(hostname: &str, enterprise_host: Option<&str>) -> bool {
    hostname == "github.com" || enterprise_host.is_some_and(|h| !h.is_empty() && hostname == h)
}

/// Parse repository info (owner/repo) from a GitHub remote URL, accepting
/// the Enterprise host named by `GH_HOST`
pub fn parse_repo_info(url: &str) -> Result<PlatformConfig> {
    parse_repo_info_for_host(url, env::var("GH_HOST").ok().as_deref())
}

/// Parse repository info, accepting `enterprise_host` besides github.com
pub fn parse_repo_info_for_host(
    url: &str,
    enterprise_host: Option<&str>,
) -> Result<PlatformConfig> {
    let url = url.trim().trim_end_matches('/');

    let hostname = extract_hostname(url).ok_or(Error::NoSupportedRemotes)?;
    if !is_github_host(&hostname, enterprise_host) {
        return Err(Error::NoSupportedRemotes);
    }

    let path = RE_SSH
        .captures(url)
        .or_else(|| RE_HTTPS.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::Parse(format!("cannot parse remote URL: {url}")))?;

    let (owner, repo) = match path.split('/').collect::<Vec<_>>()[..] {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => (owner, repo),
        _ => return Err(Error::Parse(format!("invalid repo path: {path}"))),
    };

    Ok(PlatformConfig {
        owner: owner.to_string(),
        repo: repo.to_string(),
        host: (hostname != "github.com").then_some(hostname),
    })
}

/// Host part of an SSH or HTTPS remote URL
pub fn extract_hostname(url: &str) -> Option<String> {
    if let Some(rest) = url.strip_prefix("git@") {
        return rest
            .split(':')
            .next()
            .filter(|h| !h.is_empty())
            .map(ToString::to_string);
    }

    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https() {
        let config = parse_repo_info_for_host("https://github.com/owner/repo.git", None).unwrap();
        assert_eq!(config.owner, "owner");
        assert_eq!(config.repo, "repo");
        assert!(config.host.is_none());
    }

    #[test]
    fn test_parse_https_trailing_slash() {
        let config = parse_repo_info_for_host("https://github.com/owner/repo/", None).unwrap();
        assert_eq!(config.repo, "repo");
    }

    #[test]
    fn test_parse_ssh() {
        let config = parse_repo_info_for_host("git@github.com:owner/repo.git", None).unwrap();
        assert_eq!(config.owner, "owner");
        assert_eq!(config.repo, "repo");
    }

    #[test]
    fn test_other_host_rejected() {
        assert!(matches!(
            parse_repo_info_for_host("https://gitlab.com/owner/repo.git", None),
            Err(Error::NoSupportedRemotes)
        ));
        assert!(matches!(
            parse_repo_info_for_host("not a url", None),
            Err(Error::NoSupportedRemotes)
        ));
    }

    #[test]
    fn test_nested_path_rejected() {
        assert!(matches!(
            parse_repo_info_for_host("https://github.com/group/sub/repo.git", None),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_enterprise_host() {
        let config = parse_repo_info_for_host(
            "git@github.example.com:team/service.git",
            Some("github.example.com"),
        )
        .unwrap();
        assert_eq!(config.owner, "team");
        assert_eq!(config.host.as_deref(), Some("github.example.com"));

        assert!(matches!(
            parse_repo_info_for_host("git@github.example.com:team/service.git", None),
            Err(Error::NoSupportedRemotes)
        ));
    }

    #[test]
    fn test_extract_hostname() {
        assert_eq!(
            extract_hostname("git@github.com:o/r.git").as_deref(),
            Some("github.com")
        );
        assert_eq!(
            extract_hostname("https://github.com/o/r").as_deref(),
            Some("github.com")
        );
        assert_eq!(extract_hostname("nonsense"), None);
    }
}
