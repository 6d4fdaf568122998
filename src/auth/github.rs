//! GitHub token lookup

use super::AuthSource;
use crate::error::{Error, Result};
use std::env;
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// A resolved GitHub token
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// API token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

/// First non-empty token among [`TOKEN_VARS`], read through `lookup`
pub fn token_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<GitHubAuthConfig> {
    TOKEN_VARS.iter().find_map(|var| {
        lookup(var)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|token| {
                debug!(var, "using token from environment");
                GitHubAuthConfig {
                    token,
                    source: AuthSource::EnvVar,
                }
            })
    })
}

/// Resolve a GitHub token: `GITHUB_TOKEN`, `GH_TOKEN`, then `gh auth token`
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    if let Some(config) = token_from_env(|var| env::var(var).ok()) {
        return Ok(config);
    }

    debug!("no token in environment, asking gh");
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .map_err(|e| {
            Error::Auth(format!(
                "no GITHUB_TOKEN or GH_TOKEN set and gh is unavailable: {e}"
            ))
        })?;

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || token.is_empty() {
        return Err(Error::Auth(
            "no GITHUB_TOKEN or GH_TOKEN set and `gh auth token` returned nothing; run `gh auth login`"
                .to_string(),
        ));
    }

    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}
