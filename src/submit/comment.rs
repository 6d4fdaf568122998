//! Stack comment generation and upsert

use super::progress::ProgressCallback;
use super::stack::{RowKind, Stack};
use crate::error::Result;
use crate::platform::PlatformService;
use std::fmt::Write as _;
use tracing::debug;

/// Marker identifying comments managed by jj-stack
pub const STACK_COMMENT_MARKER: &str = "<!-- managed-by: jj-stack -->";

/// Suffix marking the PR a comment is posted on
pub const STACK_COMMENT_THIS_PR: &str = " ←";

/// One PR listed in a stack comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentEntry {
    /// PR number
    pub pr_number: u64,
    /// PR was merged out of the stack
    pub merged: bool,
}

/// What happened to one PR's stack comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
    /// No managed comment existed
    Created,
    /// Managed comment existed with different content
    Updated,
    /// Managed comment already matched
    Unchanged,
}

/// Counts of comment outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentReport {
    /// Comments created
    pub created: usize,
    /// Comments rewritten
    pub updated: usize,
    /// Comments left alone
    pub unchanged: usize,
}

impl CommentReport {
    /// Number of API writes performed
    pub const fn writes(&self) -> usize {
        self.created + self.updated
    }
}

/// PRs to list, in display order: open PRs tip first, then merged PRs
pub fn comment_entries(stack: &Stack) -> Vec<CommentEntry> {
    stack
        .rows()
        .iter()
        .filter_map(|row| match (row.kind, row.pr_number) {
            (RowKind::Revision, Some(pr_number)) if row.syncable => Some(CommentEntry {
                pr_number,
                merged: false,
            }),
            (RowKind::Merged, Some(pr_number)) => Some(CommentEntry {
                pr_number,
                merged: true,
            }),
            _ => None,
        })
        .collect()
}

/// Render the comment posted on PR `current`
pub fn format_stack_comment(entries: &[CommentEntry], current: u64) -> String {
    let mut body = String::new();
    body.push_str(STACK_COMMENT_MARKER);
    body.push('\n');
    body.push_str("**Pull Request Stack**\n\n");

    for entry in entries {
        let suffix = if entry.merged {
            " (merged)"
        } else if entry.pr_number == current {
            STACK_COMMENT_THIS_PR
        } else {
            ""
        };
        let _ = writeln!(body, "- #{}{suffix}", entry.pr_number);
    }

    body.push_str("\n---\n");
    body.push_str("*Stack managed with jj-stack*");
    body
}

/// Create or update the stack comment on every open PR in the stack
///
/// Existing comments are looked up concurrently; writes happen one at a time
/// and are skipped when the content already matches.
pub async fn sync_stack_comments(
    stack: &Stack,
    platform: &dyn PlatformService,
    concurrency: usize,
    progress: &dyn ProgressCallback,
) -> Result<CommentReport> {
    let entries = comment_entries(stack);
    let targets: Vec<u64> = entries
        .iter()
        .filter(|e| !e.merged)
        .map(|e| e.pr_number)
        .collect();

    let existing = platform
        .find_comment_containing(&targets, STACK_COMMENT_MARKER, concurrency)
        .await?;

    let mut report = CommentReport::default();
    for &pr_number in &targets {
        let body = format_stack_comment(&entries, pr_number);

        let outcome = match existing.get(&pr_number) {
            Some(comment) if comment.body == body => CommentOutcome::Unchanged,
            Some(comment) => {
                platform
                    .update_pr_comment(pr_number, comment.id, &body)
                    .await?;
                CommentOutcome::Updated
            }
            None => {
                platform.create_pr_comment(pr_number, &body).await?;
                CommentOutcome::Created
            }
        };

        match outcome {
            CommentOutcome::Created => report.created += 1,
            CommentOutcome::Updated => report.updated += 1,
            CommentOutcome::Unchanged => report.unchanged += 1,
        }
        debug!(pr_number, ?outcome, "stack comment");
        progress.on_comment(pr_number, outcome).await;
    }

    Ok(report)
}
