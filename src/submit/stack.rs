//! Display projection of the revision batch
//!
//! Tip first, then PRs that were merged out of the stack, then trunk.

use crate::graph::RevisionGraph;
use crate::tracking::AssociationStore;
use crate::types::PullRequest;
use std::collections::HashMap;

/// Kind of stack row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// A mutable revision in the batch
    Revision,
    /// A PR whose change has been merged out of the stack
    Merged,
    /// The trunk marker
    Trunk,
}

/// Sync state of a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    /// Nothing happened yet
    Pending,
    /// Being synced
    InProgress,
    /// Synced or already up to date
    Success,
    /// Failed with a message
    Error(String),
}

/// One row of the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRow {
    /// Row kind
    pub kind: RowKind,
    /// Change ID (empty for trunk)
    pub change_id: String,
    /// Title or trunk name
    pub title: String,
    /// Branch the revision pushes to (empty for trunk and merged rows)
    pub branch: String,
    /// Associated PR number
    pub pr_number: Option<u64>,
    /// Associated PR URL
    pub pr_url: Option<String>,
    /// Whether this revision becomes a PR
    pub syncable: bool,
    /// Current state
    pub state: RowState,
}

impl StackRow {
    /// Short change ID for display
    pub fn short_id(&self) -> &str {
        let end = self
            .change_id
            .char_indices()
            .nth(8)
            .map_or(self.change_id.len(), |(i, _)| i);
        &self.change_id[..end]
    }
}

/// Ordered rows for display and for the stack comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    rows: Vec<StackRow>,
}

impl Stack {
    /// Project the batch, attaching open PRs found by branch and merged
    /// associations from the store
    pub fn build(
        graph: &RevisionGraph,
        prs: &HashMap<String, PullRequest>,
        store: &AssociationStore,
    ) -> Self {
        let mut rows: Vec<StackRow> = graph
            .mutable()
            .rev()
            .map(|change| {
                let pr = prs.get(&change.push_branch);
                StackRow {
                    kind: RowKind::Revision,
                    change_id: change.change_id.clone(),
                    title: change.title().to_string(),
                    branch: change.push_branch.clone(),
                    pr_number: pr.map(|p| p.number),
                    pr_url: pr.map(|p| p.html_url.clone()),
                    syncable: change.has_description(),
                    state: RowState::Pending,
                }
            })
            .collect();

        let mut merged: Vec<StackRow> = store
            .merged()
            .filter(|(id, _)| !graph.contains(id))
            .map(|(id, entry)| StackRow {
                kind: RowKind::Merged,
                change_id: id.to_string(),
                title: entry.title.clone(),
                branch: String::new(),
                pr_number: Some(entry.pr_number),
                pr_url: None,
                syncable: false,
                state: RowState::Success,
            })
            .collect();
        merged.sort_by(|a, b| b.pr_number.cmp(&a.pr_number));
        rows.extend(merged);

        rows.push(StackRow {
            kind: RowKind::Trunk,
            change_id: String::new(),
            title: graph.trunk_name().to_string(),
            branch: String::new(),
            pr_number: None,
            pr_url: None,
            syncable: false,
            state: RowState::Success,
        });

        Self { rows }
    }

    /// All rows in display order
    pub fn rows(&self) -> &[StackRow] {
        &self.rows
    }

    /// Revision rows that become PRs, tip first
    pub fn syncable_rows(&self) -> impl Iterator<Item = &StackRow> {
        self.rows
            .iter()
            .filter(|r| r.kind == RowKind::Revision && r.syncable)
    }

    /// Row for a change
    pub fn row(&self, change_id: &str) -> Option<&StackRow> {
        self.rows
            .iter()
            .find(|r| r.kind == RowKind::Revision && r.change_id == change_id)
    }

    /// Set the state of a revision row
    pub fn set_state(&mut self, change_id: &str, state: RowState) {
        if let Some(row) = self.row_mut(change_id) {
            row.state = state;
        }
    }

    /// Attach a PR to a revision row
    pub fn set_pr(&mut self, change_id: &str, pr: &PullRequest) {
        if let Some(row) = self.row_mut(change_id) {
            row.pr_number = Some(pr.number);
            row.pr_url = Some(pr.html_url.clone());
        }
    }

    /// Put rows still marked in progress back to pending
    pub fn reset_in_progress(&mut self) {
        for row in &mut self.rows {
            if row.state == RowState::InProgress {
                row.state = RowState::Pending;
            }
        }
    }

    fn row_mut(&mut self, change_id: &str) -> Option<&mut StackRow> {
        self.rows
            .iter_mut()
            .find(|r| r.kind == RowKind::Revision && r.change_id == change_id)
    }
}
