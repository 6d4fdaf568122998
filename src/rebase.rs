//! Fetch and rebase local stacks onto trunk
//!
//! Separate from the submit engine: it only moves local history. Each stack
//! root is rebased with its descendants; changes that become empty (their
//! content already landed through a squash merge) are abandoned.

use crate::error::Result;
use crate::repo::{RebaseOutcome, Workspace, trunk_name};
use crate::submit::ProgressCallback;
use tracing::{info, warn};

/// Destination revset for every rebase
const TRUNK_REVSET: &str = "trunk()";

/// How one stack root ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseStatus {
    /// Rebased cleanly
    Rebased,
    /// Rebased, but the root or a descendant has conflicts
    Conflict,
    /// Became empty and was abandoned
    SkippedEmpty,
    /// Abandoned as empty, but descendants that moved onto trunk conflict
    SkippedEmptyWithConflict,
    /// jj failed for this root
    Failed(String),
}

impl std::fmt::Display for RebaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rebased => write!(f, "rebased"),
            Self::Conflict => write!(f, "rebased with conflicts"),
            Self::SkippedEmpty => write!(f, "already merged, abandoned"),
            Self::SkippedEmptyWithConflict => {
                write!(f, "already merged, abandoned; descendants have conflicts")
            }
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// One rebased stack root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseItem {
    /// Change ID of the root
    pub change_id: String,
    /// First line of its description
    pub title: String,
    /// Result
    pub status: RebaseStatus,
}

/// Result of syncing all stacks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebaseReport {
    /// Trunk the stacks were rebased onto
    pub trunk: String,
    /// One item per stack root, in rebase order
    pub items: Vec<RebaseItem>,
}

impl RebaseReport {
    fn count(&self, pred: impl Fn(&RebaseStatus) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }

    /// Roots rebased cleanly
    pub fn rebased(&self) -> usize {
        self.count(|s| *s == RebaseStatus::Rebased)
    }

    /// Roots with conflicts
    pub fn conflicts(&self) -> usize {
        self.count(|s| {
            matches!(
                s,
                RebaseStatus::Conflict | RebaseStatus::SkippedEmptyWithConflict
            )
        })
    }

    /// Roots abandoned as empty
    pub fn skipped(&self) -> usize {
        self.count(|s| {
            matches!(
                s,
                RebaseStatus::SkippedEmpty | RebaseStatus::SkippedEmptyWithConflict
            )
        })
    }

    /// Roots that failed
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RebaseStatus::Failed(_)))
    }

    /// Whether there was nothing to rebase
    pub fn is_up_to_date(&self) -> bool {
        self.items.is_empty()
    }
}

/// Fetch `remote`, then rebase every stack root onto trunk, one at a time
///
/// A failed fetch aborts. A failed rebase is recorded and the remaining
/// roots are still attempted.
pub async fn sync_stacks(
    workspace: &dyn Workspace,
    remote: &str,
    progress: &dyn ProgressCallback,
) -> Result<RebaseReport> {
    progress.on_message(&format!("Fetching from {remote}")).await;
    workspace.git_fetch(remote).await?;

    let trunk = trunk_name(workspace).await?;
    let roots = workspace.stack_roots().await?;
    info!(trunk, roots = roots.len(), "rebasing stacks");

    let mut report = RebaseReport {
        trunk,
        items: Vec::with_capacity(roots.len()),
    };

    for root in roots {
        let status = match workspace.rebase(&root.change_id, TRUNK_REVSET).await {
            Ok(RebaseOutcome {
                skipped_empty: true,
                has_conflict: true,
            }) => RebaseStatus::SkippedEmptyWithConflict,
            Ok(outcome) if outcome.skipped_empty => RebaseStatus::SkippedEmpty,
            Ok(outcome) if outcome.has_conflict => RebaseStatus::Conflict,
            Ok(_) => RebaseStatus::Rebased,
            Err(e) => {
                warn!(change_id = %root.change_id, error = %e, "rebase failed");
                progress.on_error(&e).await;
                RebaseStatus::Failed(e.to_string())
            }
        };

        progress
            .on_message(&format!("{} {status}", root.short_id()))
            .await;
        report.items.push(RebaseItem {
            title: root.title().to_string(),
            change_id: root.change_id,
            status,
        });
    }

    Ok(report)
}
