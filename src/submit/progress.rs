//! Progress callback trait for interface-agnostic updates
//!
//! The CLI prints these; tests and library callers can ignore them with
//! [`NoopProgress`].

use super::comment::CommentOutcome;
use super::phase::SyncPhase;
use crate::error::Error;
use crate::types::PullRequest;
use async_trait::async_trait;

/// Push operation status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// Push started
    Started,
    /// Push succeeded
    Success,
    /// Push failed with error message
    Failed(String),
}

impl std::fmt::Display for PushStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Success => write!(f, "success"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Progress callback trait
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when the session enters a new phase
    async fn on_phase(&self, phase: SyncPhase);

    /// Called around each branch push
    async fn on_push(&self, branch: &str, status: PushStatus);

    /// Called when a PR is created
    async fn on_pr_created(&self, branch: &str, pr: &PullRequest);

    /// Called when a PR is updated
    async fn on_pr_updated(&self, branch: &str, pr: &PullRequest);

    /// Called after each stack comment is handled
    async fn on_comment(&self, pr_number: u64, outcome: CommentOutcome);

    /// Called when an error occurs that does not stop the current phase
    async fn on_error(&self, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: SyncPhase) {}
    async fn on_push(&self, _branch: &str, _status: PushStatus) {}
    async fn on_pr_created(&self, _branch: &str, _pr: &PullRequest) {}
    async fn on_pr_updated(&self, _branch: &str, _pr: &PullRequest) {}
    async fn on_comment(&self, _pr_number: u64, _outcome: CommentOutcome) {}
    async fn on_error(&self, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}
