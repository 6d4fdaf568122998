//! Refresh associations for changes that left the revision batch

use super::AssociationStore;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{PrState, PullRequestDetails};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

/// What the refresh did to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// PR numbers newly marked merged
    pub merged: Vec<u64>,
    /// PR numbers dropped because they were closed or deleted
    pub removed: Vec<u64>,
}

/// Look up every open association whose change is no longer present
///
/// Merged PRs are marked and kept, closed or missing PRs are removed, and
/// still-open PRs are left alone. Entries already marked merged are never
/// re-fetched. Lookups run with at most `concurrency` in flight; results are
/// applied to the store only after all of them complete.
pub async fn refresh_departed(
    store: &mut AssociationStore,
    is_present: impl Fn(&str) -> bool,
    platform: &dyn PlatformService,
    concurrency: usize,
) -> Result<RefreshSummary> {
    let departed: Vec<(String, u64)> = store
        .entries
        .iter()
        .filter(|(id, entry)| entry.state != PrState::Merged && !is_present(id))
        .map(|(id, entry)| (id.clone(), entry.pr_number))
        .collect();

    if departed.is_empty() {
        return Ok(RefreshSummary::default());
    }
    debug!(count = departed.len(), "refreshing departed associations");

    let fetched: Vec<(String, u64, Option<PullRequestDetails>)> = stream::iter(departed)
        .map(|(change_id, number)| async move {
            let details = platform.get_pr_details(number).await?;
            Ok::<_, crate::error::Error>((change_id, number, details))
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut summary = RefreshSummary::default();
    for (change_id, number, details) in fetched {
        match details.map(|d| d.state) {
            Some(PrState::Merged) => {
                if let Some(entry) = store.entries.get_mut(&change_id) {
                    entry.state = PrState::Merged;
                }
                summary.merged.push(number);
            }
            Some(PrState::Closed) | None => {
                store.remove(&change_id);
                summary.removed.push(number);
            }
            Some(PrState::Open) => {}
        }
    }
    summary.merged.sort_unstable();
    summary.removed.sort_unstable();

    if !summary.merged.is_empty() || !summary.removed.is_empty() {
        info!(
            merged = ?summary.merged,
            removed = ?summary.removed,
            "refreshed departed associations"
        );
    }
    Ok(summary)
}
