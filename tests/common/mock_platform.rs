//! Mock platform service for testing
//!
//! Behaves like a tiny in-memory GitHub: created PRs can be found again,
//! updates are applied in place and comments are stored, so a second
//! session sees what the first one wrote.

#![allow(dead_code)]

use async_trait::async_trait;
use jj_stack::error::{Error, Result};
use jj_stack::platform::PlatformService;
use jj_stack::types::{
    Change, NewPullRequest, PlatformConfig, PrComment, PrState, PullRequest, PullRequestDetails,
    PullRequestUpdate,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Call record for `update_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrCall {
    pub pr_number: u64,
    pub update: PullRequestUpdate,
}

/// Call record for comment writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Decrements the in-flight counter when a create/update call returns
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A PR held by the mock, with its state
#[derive(Debug, Clone)]
struct RemotePr {
    pr: PullRequest,
    state: PrState,
}

/// In-memory platform service
///
/// Features:
/// - Auto-incrementing PR and comment numbers
/// - Call tracking for verification
/// - Merge, close and delete helpers to simulate remote activity
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    next_pr_number: AtomicU64,
    next_comment_id: AtomicU64,
    prs: Mutex<Vec<RemotePr>>,
    comments: Mutex<HashMap<u64, Vec<PrComment>>>,
    // Create/update calls currently running, and the most seen at once
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    write_latency: Mutex<Option<Duration>>,
    // Call tracking
    find_pr_calls: Mutex<Vec<String>>,
    create_pr_calls: Mutex<Vec<NewPullRequest>>,
    update_pr_calls: Mutex<Vec<UpdatePrCall>>,
    get_pr_details_calls: Mutex<Vec<u64>>,
    create_comment_calls: Mutex<Vec<CommentCall>>,
    update_comment_calls: Mutex<Vec<CommentCall>>,
    // Error injection
    error_on_find_pr: Mutex<Option<String>>,
    error_on_create_pr: Mutex<HashMap<String, String>>,
    error_on_update_pr: Mutex<Option<String>>,
    error_on_get_pr_details: Mutex<Option<String>>,
    error_on_comment: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            next_pr_number: AtomicU64::new(1),
            next_comment_id: AtomicU64::new(1000),
            prs: Mutex::new(Vec::new()),
            comments: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            write_latency: Mutex::new(None),
            find_pr_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            update_pr_calls: Mutex::new(Vec::new()),
            get_pr_details_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            update_comment_calls: Mutex::new(Vec::new()),
            error_on_find_pr: Mutex::new(None),
            error_on_create_pr: Mutex::new(HashMap::new()),
            error_on_update_pr: Mutex::new(None),
            error_on_get_pr_details: Mutex::new(None),
            error_on_comment: Mutex::new(None),
        }
    }

    // === Remote state setup ===

    /// Make every create/update call take `latency`, so concurrent calls overlap
    pub fn set_write_latency(&self, latency: Duration) {
        *self.write_latency.lock().unwrap() = Some(latency);
    }

    /// Most create/update calls that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn track_write(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let latency = *self.write_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        InFlight(&self.in_flight)
    }

    /// Add an open PR and return it
    pub fn add_open_pr(&self, head: &str, base: &str, title: &str, body: &str) -> PullRequest {
        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let pr = make_remote_pr(number, head, base, title, body, false);
        self.prs.lock().unwrap().push(RemotePr {
            pr: pr.clone(),
            state: PrState::Open,
        });
        pr
    }

    /// Change the state of a PR (e.g. simulate a merge on the web UI)
    pub fn set_pr_state(&self, pr_number: u64, state: PrState) {
        for remote in self.prs.lock().unwrap().iter_mut() {
            if remote.pr.number == pr_number {
                remote.state = state;
            }
        }
    }

    /// Delete a PR so lookups by number return not found
    pub fn delete_pr(&self, pr_number: u64) {
        self.prs.lock().unwrap().retain(|r| r.pr.number != pr_number);
    }

    /// Point the head of every PR for a pushed change at its commit
    pub fn simulate_pushes(&self, changes: &[Change]) {
        for remote in self.prs.lock().unwrap().iter_mut() {
            if let Some(change) = changes.iter().find(|c| c.push_branch == remote.pr.head_ref) {
                remote.pr.head_sha.clone_from(&change.commit_id);
            }
        }
    }

    /// Add a comment directly (as if someone else wrote it)
    pub fn add_comment(&self, pr_number: u64, body: &str) -> u64 {
        let id = self.next_comment_id.fetch_add(1, Ordering::SeqCst);
        self.comments
            .lock()
            .unwrap()
            .entry(pr_number)
            .or_default()
            .push(PrComment {
                id,
                body: body.to_string(),
            });
        id
    }

    // === Error injection methods ===

    /// Make `find_existing_pr` return an error
    pub fn fail_find_pr(&self, msg: &str) {
        *self.error_on_find_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pr` fail for one head branch
    pub fn fail_create_pr_for(&self, head: &str, msg: &str) {
        self.error_on_create_pr
            .lock()
            .unwrap()
            .insert(head.to_string(), msg.to_string());
    }

    /// Make `update_pr` return an error
    pub fn fail_update_pr(&self, msg: &str) {
        *self.error_on_update_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_pr_details` return an error
    pub fn fail_get_pr_details(&self, msg: &str) {
        *self.error_on_get_pr_details.lock().unwrap() = Some(msg.to_string());
    }

    /// Make comment writes return an error
    pub fn fail_comments(&self, msg: &str) {
        *self.error_on_comment.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification methods ===

    /// Get all branches that `find_existing_pr` was called with
    pub fn get_find_pr_calls(&self) -> Vec<String> {
        self.find_pr_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr` calls
    pub fn get_create_pr_calls(&self) -> Vec<NewPullRequest> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr` calls
    pub fn get_update_pr_calls(&self) -> Vec<UpdatePrCall> {
        self.update_pr_calls.lock().unwrap().clone()
    }

    /// Get all `get_pr_details` calls
    pub fn get_pr_details_calls(&self) -> Vec<u64> {
        self.get_pr_details_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr_comment` calls
    pub fn get_create_comment_calls(&self) -> Vec<CommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr_comment` calls
    pub fn get_update_comment_calls(&self) -> Vec<CommentCall> {
        self.update_comment_calls.lock().unwrap().clone()
    }

    /// Number of API writes of any kind
    pub fn write_count(&self) -> usize {
        self.create_pr_calls.lock().unwrap().len()
            + self.update_pr_calls.lock().unwrap().len()
            + self.create_comment_calls.lock().unwrap().len()
            + self.update_comment_calls.lock().unwrap().len()
    }

    /// Forget recorded calls, keeping remote state
    pub fn clear_calls(&self) {
        self.find_pr_calls.lock().unwrap().clear();
        self.create_pr_calls.lock().unwrap().clear();
        self.update_pr_calls.lock().unwrap().clear();
        self.get_pr_details_calls.lock().unwrap().clear();
        self.create_comment_calls.lock().unwrap().clear();
        self.update_comment_calls.lock().unwrap().clear();
    }

    /// Current state of a PR by number
    pub fn pr(&self, pr_number: u64) -> Option<PullRequest> {
        self.prs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.pr.number == pr_number)
            .map(|r| r.pr.clone())
    }

    /// The open PR for a head branch
    pub fn open_pr_for(&self, head: &str) -> Option<PullRequest> {
        self.prs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.state == PrState::Open && r.pr.head_ref == head)
            .map(|r| r.pr.clone())
    }

    /// Stored comments on a PR
    pub fn comments_on(&self, pr_number: u64) -> Vec<PrComment> {
        self.comments
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default()
    }

    /// Assert that `create_pr` was called with specific head and base
    pub fn assert_create_pr_called(&self, head: &str, base: &str) {
        let calls = self.get_create_pr_calls();
        assert!(
            calls.iter().any(|c| c.head == head && c.base == base),
            "Expected create_pr({head}, {base}) but got: {calls:?}"
        );
    }

    /// Assert that `update_pr` set a specific base
    pub fn assert_update_base_called(&self, pr_number: u64, new_base: &str) {
        let calls = self.get_update_pr_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.pr_number == pr_number && c.update.base == new_base),
            "Expected update_pr({pr_number}, base: {new_base}) but got: {calls:?}"
        );
    }

    fn comment_error(&self) -> Option<Error> {
        self.error_on_comment
            .lock()
            .unwrap()
            .as_ref()
            .map(|msg| Error::GitHubApi(msg.clone()))
    }
}

/// Build a PR the way the mock stores it
pub fn make_remote_pr(
    number: u64,
    head: &str,
    base: &str,
    title: &str,
    body: &str,
    draft: bool,
) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/test/repo/pull/{number}"),
        base_ref: base.to_string(),
        head_ref: head.to_string(),
        head_sha: format!("sha-{head}"),
        title: title.to_string(),
        body: body.to_string(),
        node_id: Some(format!("PR_node_{number}")),
        is_draft: draft,
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        self.find_pr_calls
            .lock()
            .unwrap()
            .push(head_branch.to_string());

        if let Some(msg) = self.error_on_find_pr.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        let open: Vec<PullRequest> = self
            .prs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.state == PrState::Open && r.pr.head_ref == head_branch)
            .map(|r| r.pr.clone())
            .collect();

        match open.len() {
            0 => Ok(None),
            1 => Ok(open.into_iter().next()),
            count => Err(Error::AmbiguousRemoteState {
                branch: head_branch.to_string(),
                count,
            }),
        }
    }

    async fn create_pr(&self, pr: &NewPullRequest) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(pr.clone());
        let _in_flight = self.track_write().await;

        if let Some(msg) = self.error_on_create_pr.lock().unwrap().get(&pr.head) {
            return Err(Error::GitHubApi(msg.clone()));
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let created = make_remote_pr(number, &pr.head, &pr.base, &pr.title, &pr.body, pr.draft);
        self.prs.lock().unwrap().push(RemotePr {
            pr: created.clone(),
            state: PrState::Open,
        });
        Ok(created)
    }

    async fn update_pr(&self, pr_number: u64, update: &PullRequestUpdate) -> Result<PullRequest> {
        self.update_pr_calls.lock().unwrap().push(UpdatePrCall {
            pr_number,
            update: update.clone(),
        });
        let _in_flight = self.track_write().await;

        if let Some(msg) = self.error_on_update_pr.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        let mut prs = self.prs.lock().unwrap();
        let remote = prs
            .iter_mut()
            .find(|r| r.pr.number == pr_number)
            .ok_or_else(|| Error::GitHubApi(format!("PR #{pr_number} not found")))?;
        remote.pr.base_ref.clone_from(&update.base);
        remote.pr.title.clone_from(&update.title);
        remote.pr.body.clone_from(&update.body);
        remote.pr.is_draft = update.draft;
        Ok(remote.pr.clone())
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<Option<PullRequestDetails>> {
        self.get_pr_details_calls.lock().unwrap().push(pr_number);

        if let Some(msg) = self.error_on_get_pr_details.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        Ok(self
            .prs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.pr.number == pr_number)
            .map(|r| PullRequestDetails {
                number: r.pr.number,
                title: r.pr.title.clone(),
                state: r.state,
                head_ref: r.pr.head_ref.clone(),
                html_url: r.pr.html_url.clone(),
            }))
    }

    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>> {
        Ok(self.comments_on(pr_number))
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.create_comment_calls.lock().unwrap().push(CommentCall {
            pr_number,
            body: body.to_string(),
        });
        if let Some(e) = self.comment_error() {
            return Err(e);
        }
        self.add_comment(pr_number, body);
        Ok(())
    }

    async fn update_pr_comment(&self, pr_number: u64, comment_id: u64, body: &str) -> Result<()> {
        self.update_comment_calls.lock().unwrap().push(CommentCall {
            pr_number,
            body: body.to_string(),
        });
        if let Some(e) = self.comment_error() {
            return Err(e);
        }

        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .get_mut(&pr_number)
            .and_then(|list| list.iter_mut().find(|c| c.id == comment_id))
            .ok_or_else(|| Error::GitHubApi(format!("comment {comment_id} not found")))?;
        comment.body = body.to_string();
        Ok(())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
