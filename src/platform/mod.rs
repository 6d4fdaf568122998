//! Hosting-service collaborator
//!
//! Provides the pull request and comment operations the engine needs,
//! behind a trait so the engine can run against a mock.

mod detection;
mod factory;
mod github;

pub use detection::{extract_hostname, is_github_host, parse_repo_info, parse_repo_info_for_host};
pub use factory::create_platform_service;
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    NewPullRequest, PlatformConfig, PrComment, PullRequest, PullRequestDetails, PullRequestUpdate,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;

/// Platform service trait for pull request operations
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Find the single open PR whose head is `head_branch`
    ///
    /// Returns [`Error::AmbiguousRemoteState`](crate::error::Error::AmbiguousRemoteState)
    /// when more than one is open.
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>>;

    /// Create a new PR
    async fn create_pr(&self, pr: &NewPullRequest) -> Result<PullRequest>;

    /// Update title, body, base and draft state of an existing PR
    async fn update_pr(&self, pr_number: u64, update: &PullRequestUpdate) -> Result<PullRequest>;

    /// Fetch a PR by number, `None` if it no longer exists
    async fn get_pr_details(&self, pr_number: u64) -> Result<Option<PullRequestDetails>>;

    /// List comments on a PR
    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>>;

    /// Create a comment on a PR
    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// Update an existing comment on a PR
    async fn update_pr_comment(&self, pr_number: u64, comment_id: u64, body: &str) -> Result<()>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;

    /// Newest comment containing `marker` on each of `pr_numbers`
    ///
    /// PRs without such a comment are absent from the result.
    async fn find_comment_containing(
        &self,
        pr_numbers: &[u64],
        marker: &str,
        concurrency: usize,
    ) -> Result<HashMap<u64, PrComment>> {
        let found: Vec<(u64, Option<PrComment>)> = stream::iter(pr_numbers.iter().copied())
            .map(|number| async move {
                let comments = self.list_pr_comments(number).await?;
                let newest = comments.into_iter().rev().find(|c| c.body.contains(marker));
                Ok::<_, crate::error::Error>((number, newest))
            })
            .buffer_unordered(concurrency.max(1))
            .try_collect()
            .await?;

        Ok(found
            .into_iter()
            .filter_map(|(number, comment)| comment.map(|c| (number, c)))
            .collect())
    }
}
