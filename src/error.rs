//! Error types for jj-stack

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the reconciliation engine and its collaborators
///
/// Every payload is an owned string so errors can be cloned into the phase
/// machine while the driver also returns them.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Reading the revision graph failed (jj exited non-zero or produced bad output)
    #[error("failed to query revisions: {0}")]
    Query(String),

    /// Pushing a change's branch failed
    #[error("failed to push {change_id}: {message}")]
    Push {
        /// Change that failed to push
        change_id: String,
        /// Output from jj
        message: String,
    },

    /// Any other jj command failed (fetch, rebase, remote listing)
    #[error("jj command failed: {0}")]
    Jj(String),

    /// GitHub API call failed
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// More than one open pull request exists for a branch
    #[error("branch {branch:?} unexpectedly has {count} open pull requests")]
    AmbiguousRemoteState {
        /// Head branch name
        branch: String,
        /// Number of open pull requests found
        count: usize,
    },

    /// Persisted state could not be written
    #[error("state file error: {0}")]
    State(String),

    /// Configuration file is unreadable or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable token was found
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Requested remote does not exist
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// No remote points at a supported host
    #[error("no supported remotes found (only GitHub remotes are supported)")]
    NoSupportedRemotes,

    /// Failed to parse a value (remote URL, command output)
    #[error("parse error: {0}")]
    Parse(String),

    /// Phase machine received an event it cannot handle in its current phase
    #[error("invalid phase transition: {0}")]
    InvalidTransition(String),

    /// The run was interrupted by a signal
    #[error("interrupted")]
    Interrupted,

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => Self::GitHubApi(source.message.clone()),
            _ => Self::GitHubApi(err.to_string()),
        }
    }
}
