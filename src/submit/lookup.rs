//! Remote lookup: open PRs by head branch

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::PullRequest;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use tracing::debug;

/// Find the open PR (if any) for each branch
///
/// At most `concurrency` lookups run at once. Branches without an open PR
/// are absent from the result. Any failure, including a branch with more
/// than one open PR, fails the whole lookup.
pub async fn find_open_prs(
    platform: &dyn PlatformService,
    branches: &[String],
    concurrency: usize,
) -> Result<HashMap<String, PullRequest>> {
    debug!(count = branches.len(), concurrency, "looking up open PRs");

    let found: Vec<(String, Option<PullRequest>)> = stream::iter(branches.iter().cloned())
        .map(|branch| async move {
            let pr = platform.find_existing_pr(&branch).await?;
            Ok::<_, Error>((branch, pr))
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    let prs: HashMap<String, PullRequest> = found
        .into_iter()
        .filter_map(|(branch, pr)| pr.map(|pr| (branch, pr)))
        .collect();
    debug!(found = prs.len(), "open PR lookup complete");
    Ok(prs)
}
