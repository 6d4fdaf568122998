//! Core types for jj-stack

use serde::{Deserialize, Serialize};

/// A change (revision) from `jj log`
///
/// The change id is stable across rewrites; the commit id changes every time
/// the change is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// jj change ID (reverse hex)
    pub change_id: String,
    /// Git commit ID (hex)
    pub commit_id: String,
    /// Whether the change is on or behind the trunk frontier
    pub immutable: bool,
    /// Full description; the first line is the PR title
    pub description: String,
    /// Local bookmarks pointing at this change
    pub bookmarks: Vec<String>,
    /// Branch name jj uses when pushing this change
    pub push_branch: String,
    /// Parent change IDs; the first parent is the stack predecessor
    pub parents: Vec<String>,
}

impl Change {
    /// First line of the description, trimmed
    pub fn title(&self) -> &str {
        self.description.lines().next().unwrap_or_default().trim()
    }

    /// Everything after the first line, without leading blank lines or
    /// trailing whitespace
    pub fn body(&self) -> &str {
        self.description
            .split_once('\n')
            .map_or("", |(_, rest)| rest.trim_start_matches(['\n', '\r']).trim_end())
    }

    /// Whether the change has a usable description
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    /// First parent (the predecessor in a linear stack)
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    /// Short form of the change ID for display
    pub fn short_id(&self) -> &str {
        let end = self
            .change_id
            .char_indices()
            .nth(8)
            .map_or(self.change_id.len(), |(i, _)| i);
        &self.change_id[..end]
    }
}

/// An open pull request as returned by the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// Commit SHA the head branch points to
    pub head_sha: String,
    /// PR title
    pub title: String,
    /// PR body (empty when unset)
    pub body: String,
    /// GraphQL node ID (used for draft mutations)
    pub node_id: Option<String>,
    /// Whether PR is a draft
    pub is_draft: bool,
}

/// Fields for creating a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    /// Head branch
    pub head: String,
    /// Base branch
    pub base: String,
    /// Title
    pub title: String,
    /// Body
    pub body: String,
    /// Open as draft
    pub draft: bool,
}

/// Fields written when updating an existing pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestUpdate {
    /// Base branch
    pub base: String,
    /// Title
    pub title: String,
    /// Body
    pub body: String,
    /// Desired draft state
    pub draft: bool,
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// PR is open
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// PR details fetched by number, used to refresh persisted associations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDetails {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Current state of the PR
    pub state: PrState,
    /// Head branch name
    pub head_ref: String,
    /// Web URL for the PR
    pub html_url: String,
}

/// A comment on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrComment {
    /// Comment ID
    pub id: u64,
    /// Comment body text
    pub body: String,
}

/// A git remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRemote {
    /// Remote name (e.g., "origin")
    pub name: String,
    /// Remote URL
    pub url: String,
}

/// Repository coordinates on the hosting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}
