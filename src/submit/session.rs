//! Submit session driver
//!
//! Runs Loading, Confirmation, Syncing and UpdatingComments in order,
//! feeding each step's result to the [`PhaseMachine`].

use super::comment::{CommentReport, sync_stack_comments};
use super::evaluate::{Evaluation, evaluate};
use super::execute::{SyncExecutor, SyncReport};
use super::lookup::find_open_prs;
use super::phase::{PhaseEvent, PhaseMachine, SyncPhase};
use super::progress::ProgressCallback;
use super::stack::{RowState, Stack};
use crate::config::DEFAULT_API_CONCURRENCY;
use crate::error::{Error, Result};
use crate::graph::RevisionGraph;
use crate::platform::PlatformService;
use crate::repo::Workspace;
use crate::tracking::{
    AssociationEntry, AssociationStore, RefreshSummary, load_state, refresh_departed, save_state,
};
use crate::types::{PrState, PullRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Inputs for a submit session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    /// User revset; the session submits `trunk()::(<revset>) & ~empty()`
    pub revset: String,
    /// Remote to fetch from and push to
    pub remote: String,
    /// Ceiling on concurrent API calls
    pub concurrency: usize,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            revset: "@".to_string(),
            remote: "origin".to_string(),
            concurrency: DEFAULT_API_CONCURRENCY,
        }
    }
}

/// Revset actually queried for a user revset
pub fn submit_revset(revset: &str) -> String {
    format!("trunk()::({revset}) & ~empty()")
}

/// Acknowledgement of the sync plan
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Return `true` to proceed with the sync
    async fn confirm(&self, evaluation: &Evaluation, stack: &Stack) -> Result<bool>;
}

/// Fixed answer, for `--yes`, `--dry-run` and tests
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _evaluation: &Evaluation, _stack: &Stack) -> Result<bool> {
        Ok(self.0)
    }
}

/// Everything a session produced, returned whether or not it succeeded
#[derive(Debug, Clone, Default)]
pub struct SubmitReport {
    /// Final phase and error
    pub machine: PhaseMachine,
    /// Last known stack projection
    pub stack: Stack,
    /// Sync plan, once loading succeeded
    pub evaluation: Option<Evaluation>,
    /// Departed associations refreshed during loading
    pub refresh: RefreshSummary,
    /// Push and API results, once syncing ran
    pub sync: Option<SyncReport>,
    /// Comment results, once comments were written
    pub comments: Option<CommentReport>,
}

impl SubmitReport {
    /// Final phase
    pub const fn phase(&self) -> SyncPhase {
        self.machine.phase()
    }

    /// Error that ended the session
    pub const fn error(&self) -> Option<&Error> {
        self.machine.error()
    }

    /// Whether the session ended without error
    ///
    /// A declined confirmation counts as success: nothing was changed.
    pub const fn is_success(&self) -> bool {
        !matches!(self.phase(), SyncPhase::Failed)
    }

    /// Whether the session stopped at the confirmation prompt
    pub fn declined(&self) -> bool {
        self.phase() == SyncPhase::Confirmation
    }

    fn advance(&mut self, event: PhaseEvent) {
        if let Err(e) = self.machine.advance(event) {
            warn!(error = %e, "unexpected phase event");
            self.machine.fail(e);
        }
    }
}

/// State gathered during Loading
struct Loaded {
    graph: RevisionGraph,
    store: AssociationStore,
    prs: HashMap<String, PullRequest>,
    evaluation: Evaluation,
    refresh: RefreshSummary,
}

/// Run one submit session
pub async fn run_submit(
    workspace: &dyn Workspace,
    platform: &dyn PlatformService,
    confirm: &dyn Confirm,
    progress: &dyn ProgressCallback,
    options: &SubmitOptions,
) -> SubmitReport {
    let mut report = SubmitReport::default();
    progress.on_phase(SyncPhase::Loading).await;

    let loaded = match load(workspace, platform, options).await {
        Ok(loaded) => loaded,
        Err(e) => {
            report.advance(PhaseEvent::Loaded(Err(e)));
            progress.on_phase(report.phase()).await;
            return report;
        }
    };

    let Loaded {
        graph,
        mut store,
        mut prs,
        evaluation,
        refresh,
    } = loaded;

    report.stack = Stack::build(&graph, &prs, &store);
    for plan in evaluation.plans.iter().filter(|p| !p.needs_sync()) {
        report.stack.set_state(&plan.change.change_id, RowState::Success);
    }
    report.refresh = refresh;
    report.evaluation = Some(evaluation.clone());

    report.advance(PhaseEvent::Loaded(Ok(evaluation.needs_sync())));
    progress.on_phase(report.phase()).await;
    if report.phase() != SyncPhase::Confirmation {
        return report;
    }

    match confirm.confirm(&evaluation, &report.stack).await {
        Ok(true) => report.advance(PhaseEvent::Confirmed),
        Ok(false) => {
            debug!("sync declined");
            return report;
        }
        Err(e) => {
            report.machine.fail(e);
            progress.on_phase(report.phase()).await;
            return report;
        }
    }
    progress.on_phase(report.phase()).await;

    // Syncing
    for plan in evaluation.pending() {
        report
            .stack
            .set_state(&plan.change.change_id, RowState::InProgress);
    }

    let executor = SyncExecutor {
        workspace,
        platform,
        progress,
        remote: &options.remote,
        concurrency: options.concurrency,
    };

    let sync_result = match executor.run(&evaluation, &graph, &store).await {
        Ok(sync) => {
            for result in &sync.results {
                match &result.outcome {
                    Ok((_, pr)) => {
                        report.stack.set_pr(&result.change_id, pr);
                        report
                            .stack
                            .set_state(&result.change_id, RowState::Success);
                        prs.insert(result.branch.clone(), pr.clone());
                    }
                    Err(e) => report
                        .stack
                        .set_state(&result.change_id, RowState::Error(e.to_string())),
                }
            }
            let outcome = sync.first_error().cloned().map_or(Ok(()), Err);
            report.sync = Some(sync);
            outcome
        }
        Err(e) => {
            // No API call was made, so nothing else moved
            report.stack.reset_in_progress();
            if let Error::Push { change_id, .. } = &e {
                report
                    .stack
                    .set_state(change_id, RowState::Error(e.to_string()));
            }
            Err(e)
        }
    };

    report.advance(PhaseEvent::Synced(sync_result));
    progress.on_phase(report.phase()).await;
    if report.phase() != SyncPhase::UpdatingComments {
        return report;
    }

    // UpdatingComments, then write-back
    let comments = match sync_stack_comments(
        &report.stack,
        platform,
        options.concurrency,
        progress,
    )
    .await
    {
        Ok(comments) => {
            report.comments = Some(comments);
            record_synced(&mut store, &graph, &prs);
            save_state(workspace.workspace_root(), &store)
        }
        Err(e) => Err(e),
    };

    report.advance(PhaseEvent::CommentsUpdated(comments));
    progress.on_phase(report.phase()).await;
    report
}

async fn load(
    workspace: &dyn Workspace,
    platform: &dyn PlatformService,
    options: &SubmitOptions,
) -> Result<Loaded> {
    workspace.git_fetch(&options.remote).await?;

    let changes = workspace.changes(&submit_revset(&options.revset)).await?;
    let graph = RevisionGraph::new(changes)?;
    debug!(
        revisions = graph.changes().len(),
        syncable = graph.syncable().count(),
        trunk = graph.trunk_name(),
        "loaded revision graph"
    );

    let mut store = load_state(workspace.workspace_root());

    let branches: Vec<String> = graph.syncable().map(|c| c.push_branch.clone()).collect();
    let prs = find_open_prs(platform, &branches, options.concurrency).await?;
    record_synced(&mut store, &graph, &prs);

    let refresh = refresh_departed(
        &mut store,
        |id| graph.contains(id),
        platform,
        options.concurrency,
    )
    .await?;

    let evaluation = evaluate(&graph, &prs, &store);
    debug!(
        pending = evaluation.pending().count(),
        create = evaluation.create_count(),
        update = evaluation.update_count(),
        "evaluated stack"
    );

    Ok(Loaded {
        graph,
        store,
        prs,
        evaluation,
        refresh,
    })
}

/// Record every syncable revision that has an open PR as an open association
fn record_synced(
    store: &mut AssociationStore,
    graph: &RevisionGraph,
    prs: &HashMap<String, PullRequest>,
) {
    for change in graph.syncable() {
        if let Some(pr) = prs.get(&change.push_branch) {
            store.set(
                change.change_id.clone(),
                AssociationEntry {
                    pr_number: pr.number,
                    branch: change.push_branch.clone(),
                    state: PrState::Open,
                    title: change.title().to_string(),
                },
            );
        }
    }
}
