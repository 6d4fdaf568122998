//! Two-phase sync execution
//!
//! 1. Push phase: one `jj git push` per revision that needs it, base to tip,
//!    strictly sequential, aborting on the first failure.
//! 2. API phase: create or update one PR per revision that needs sync, with
//!    bounded concurrency. Every task runs to completion before the phase
//!    returns; failures are collected rather than short-circuiting.

use super::evaluate::{Evaluation, RevisionPlan, desired_pr};
use super::progress::{ProgressCallback, PushStatus};
use crate::error::{Error, Result};
use crate::graph::RevisionGraph;
use crate::platform::PlatformService;
use crate::repo::Workspace;
use crate::tracking::AssociationStore;
use crate::types::PullRequest;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

/// Which API call produced a PR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrOperation {
    /// PR was created
    Created,
    /// Existing PR was updated
    Updated,
}

/// Outcome of the API phase for one revision
#[derive(Debug, Clone)]
pub struct RevisionResult {
    /// Change ID
    pub change_id: String,
    /// Head branch
    pub branch: String,
    /// Title sent to the PR
    pub title: String,
    /// The resulting PR, or the error that prevented it
    pub outcome: Result<(PrOperation, PullRequest)>,
}

/// Everything the executor did
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Branches pushed, in push order
    pub pushed: Vec<String>,
    /// API results in completion order
    pub results: Vec<RevisionResult>,
}

impl SyncReport {
    /// First API failure, in completion order
    pub fn first_error(&self) -> Option<&Error> {
        self.results.iter().find_map(|r| r.outcome.as_ref().err())
    }

    /// PRs created
    pub fn created(&self) -> impl Iterator<Item = &PullRequest> {
        self.succeeded(PrOperation::Created)
    }

    /// PRs updated
    pub fn updated(&self) -> impl Iterator<Item = &PullRequest> {
        self.succeeded(PrOperation::Updated)
    }

    fn succeeded(&self, op: PrOperation) -> impl Iterator<Item = &PullRequest> {
        self.results.iter().filter_map(move |r| match &r.outcome {
            Ok((o, pr)) if *o == op => Some(pr),
            _ => None,
        })
    }
}

/// Runs the push and API phases for an evaluation
pub struct SyncExecutor<'a> {
    /// Local workspace, used for pushes
    pub workspace: &'a dyn Workspace,
    /// Hosting service
    pub platform: &'a dyn PlatformService,
    /// Progress sink
    pub progress: &'a dyn ProgressCallback,
    /// Remote to push to
    pub remote: &'a str,
    /// Ceiling on concurrent API calls
    pub concurrency: usize,
}

impl SyncExecutor<'_> {
    /// Push, then create/update
    ///
    /// Returns `Err` only for a push failure, in which case no API call was
    /// made. API failures are reported per revision in the [`SyncReport`].
    pub async fn run(
        &self,
        evaluation: &Evaluation,
        graph: &RevisionGraph,
        store: &AssociationStore,
    ) -> Result<SyncReport> {
        let pushed = self.push_phase(evaluation).await?;
        let results = self.api_phase(evaluation, graph, store).await;
        Ok(SyncReport { pushed, results })
    }

    /// Push every branch that needs it, ancestors first
    pub async fn push_phase(&self, evaluation: &Evaluation) -> Result<Vec<String>> {
        let mut pushed = Vec::new();

        for plan in evaluation.pending().filter(|p| p.needs_push()) {
            let branch = plan.branch();
            self.progress.on_push(branch, PushStatus::Started).await;

            match self
                .workspace
                .push_change(&plan.change.change_id, self.remote)
                .await
            {
                Ok(()) => {
                    self.progress.on_push(branch, PushStatus::Success).await;
                    pushed.push(branch.to_string());
                }
                Err(e) => {
                    self.progress
                        .on_push(branch, PushStatus::Failed(e.to_string()))
                        .await;
                    return Err(e);
                }
            }
        }

        info!(count = pushed.len(), "push phase complete");
        Ok(pushed)
    }

    /// Create or update every PR that needs sync
    pub async fn api_phase(
        &self,
        evaluation: &Evaluation,
        graph: &RevisionGraph,
        store: &AssociationStore,
    ) -> Vec<RevisionResult> {
        let results: Vec<RevisionResult> = stream::iter(evaluation.pending())
            .map(|plan| self.sync_revision(plan, evaluation, graph, store))
            .buffer_unordered(self.concurrency.max(1))
            .collect()
            .await;

        info!(
            count = results.len(),
            failed = results.iter().filter(|r| r.outcome.is_err()).count(),
            "API phase complete"
        );
        results
    }

    async fn sync_revision(
        &self,
        plan: &RevisionPlan,
        evaluation: &Evaluation,
        graph: &RevisionGraph,
        store: &AssociationStore,
    ) -> RevisionResult {
        let branch = plan.branch();
        let desired = desired_pr(&plan.change, graph, &evaluation.open_branches, Some(store));
        debug!(change_id = %plan.change.change_id, branch, base = %desired.base, "syncing PR");

        let outcome = match &plan.existing {
            None => self
                .platform
                .create_pr(&desired.to_new(branch))
                .await
                .map(|pr| (PrOperation::Created, pr)),
            Some(existing) => self
                .platform
                .update_pr(existing.number, &desired.to_update())
                .await
                .map(|pr| (PrOperation::Updated, pr)),
        };

        match &outcome {
            Ok((PrOperation::Created, pr)) => self.progress.on_pr_created(branch, pr).await,
            Ok((PrOperation::Updated, pr)) => self.progress.on_pr_updated(branch, pr).await,
            Err(e) => self.progress.on_error(e).await,
        }

        RevisionResult {
            change_id: plan.change.change_id.clone(),
            branch: branch.to_string(),
            title: desired.title,
            outcome,
        }
    }
}
