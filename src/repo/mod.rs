//! Version-control collaborator
//!
//! The engine only talks to jj through the [`Workspace`] trait, which keeps
//! the reconciliation logic testable without a real repository.

mod jj;

pub use jj::JjWorkspace;

use crate::error::{Error, Result};
use crate::types::{Change, GitRemote};
use async_trait::async_trait;
use std::path::Path;

/// Outcome of rebasing one stack root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebaseOutcome {
    /// The rebased change or one of its descendants has conflicts
    pub has_conflict: bool,
    /// The change became empty and was abandoned
    pub skipped_empty: bool,
}

/// Query/command boundary to the local jj workspace
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Root directory of the workspace
    fn workspace_root(&self) -> &Path;

    /// Changes matching `revset`, ancestors first
    async fn changes(&self, revset: &str) -> Result<Vec<Change>>;

    /// Push the branch for a single change
    async fn push_change(&self, change_id: &str, remote: &str) -> Result<()>;

    /// Fetch from a remote
    async fn git_fetch(&self, remote: &str) -> Result<()>;

    /// Configured git remotes
    async fn git_remotes(&self) -> Result<Vec<GitRemote>>;

    /// Roots of local stacks that are not based on the current trunk
    async fn stack_roots(&self) -> Result<Vec<Change>>;

    /// Rebase `change_id` and its descendants onto `destination`,
    /// abandoning changes that become empty
    async fn rebase(&self, change_id: &str, destination: &str) -> Result<RebaseOutcome>;
}

/// Name of the trunk bookmark, defaulting to `main`
pub async fn trunk_name(workspace: &dyn Workspace) -> Result<String> {
    let trunk = workspace.changes("trunk()").await?;
    Ok(trunk
        .first()
        .and_then(|c| c.bookmarks.first().cloned())
        .unwrap_or_else(|| crate::graph::DEFAULT_TRUNK.to_string()))
}

/// Pick the remote to use
///
/// An explicitly requested remote must exist. Otherwise `origin` wins, then
/// the first configured remote.
pub fn select_remote(remotes: &[GitRemote], requested: Option<&str>) -> Result<String> {
    if let Some(name) = requested {
        return remotes
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.name.clone())
            .ok_or_else(|| Error::RemoteNotFound(name.to_string()));
    }

    remotes
        .iter()
        .find(|r| r.name == "origin")
        .or_else(|| remotes.first())
        .map(|r| r.name.clone())
        .ok_or(Error::NoSupportedRemotes)
}
