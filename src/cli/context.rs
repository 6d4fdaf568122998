//! Shared command setup

use jj_stack::config::Config;
use jj_stack::error::{Error, Result};
use jj_stack::platform::{PlatformService, create_platform_service, parse_repo_info};
use jj_stack::repo::{JjWorkspace, Workspace, select_remote};
use std::path::Path;

/// What `submit` and `sync` both need: an open workspace and a chosen remote
pub struct CommandContext {
    /// The jj workspace
    pub workspace: JjWorkspace,
    /// Selected remote name
    pub remote_name: String,
    /// URL of the selected remote
    pub remote_url: String,
}

impl CommandContext {
    /// Open the workspace at `path` and pick a remote
    ///
    /// `remote` (from the command line) wins over the config file.
    pub async fn new(path: &Path, remote: Option<&str>, config: &Config) -> Result<Self> {
        let workspace = JjWorkspace::open(path).await?;

        let remotes = workspace.git_remotes().await?;
        let requested = remote.or(config.remote.as_deref());
        let remote_name = select_remote(&remotes, requested)?;
        let remote_url = remotes
            .iter()
            .find(|r| r.name == remote_name)
            .map(|r| r.url.clone())
            .ok_or_else(|| Error::RemoteNotFound(remote_name.clone()))?;

        Ok(Self {
            workspace,
            remote_name,
            remote_url,
        })
    }

    /// Detect the hosting service from the remote URL and authenticate
    pub async fn platform(&self) -> Result<Box<dyn PlatformService>> {
        let platform_config = parse_repo_info(&self.remote_url)?;
        create_platform_service(&platform_config).await
    }
}
