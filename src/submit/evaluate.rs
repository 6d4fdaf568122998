//! Sync-need evaluation
//!
//! Compares every syncable revision with the open PR for its branch. Pure:
//! the same inputs always produce the same plan.

use super::base::{open_branch_set, resolve_base};
use crate::graph::RevisionGraph;
use crate::tracking::AssociationStore;
use crate::types::{Change, NewPullRequest, PullRequest, PullRequestUpdate};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A PR field that differs from the local revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrField {
    /// Title differs
    Title,
    /// Body differs (ignoring trailing whitespace)
    Body,
    /// Base branch differs
    Base,
    /// Draft flag differs
    Draft,
}

impl fmt::Display for PrField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Body => write!(f, "body"),
            Self::Base => write!(f, "base"),
            Self::Draft => write!(f, "draft"),
        }
    }
}

/// What has to happen for one revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// No PR yet: push and create
    Create,
    /// PR exists but is stale
    Update {
        /// Remote head differs from the local commit
        push: bool,
        /// Metadata fields that differ
        fields: Vec<PrField>,
    },
}

impl SyncAction {
    /// Whether the branch must be pushed
    pub const fn needs_push(&self) -> bool {
        match self {
            Self::Create => true,
            Self::Update { push, .. } => *push,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create PR"),
            Self::Update { push, fields } => {
                let mut parts = Vec::new();
                if *push {
                    parts.push("push".to_string());
                }
                parts.extend(fields.iter().map(|field| format!("update {field}")));
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

/// PR contents derived from a local revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredPr {
    /// Base branch
    pub base: String,
    /// Title (first description line)
    pub title: String,
    /// Body (rest of the description)
    pub body: String,
    /// Draft flag
    pub draft: bool,
}

impl DesiredPr {
    /// Fields for creating a PR with head `branch`
    pub fn to_new(&self, branch: &str) -> NewPullRequest {
        NewPullRequest {
            head: branch.to_string(),
            base: self.base.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            draft: self.draft,
        }
    }

    /// Fields for updating an existing PR
    pub fn to_update(&self) -> PullRequestUpdate {
        PullRequestUpdate {
            base: self.base.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            draft: self.draft,
        }
    }
}

/// Draft iff the title mentions "wip" in any case
pub fn is_draft(title: &str) -> bool {
    title.to_lowercase().contains("wip")
}

/// Compute what the PR for `change` should look like
pub fn desired_pr(
    change: &Change,
    graph: &RevisionGraph,
    open_branches: &HashSet<String>,
    store: Option<&AssociationStore>,
) -> DesiredPr {
    let title = change.title().to_string();
    DesiredPr {
        base: resolve_base(change, graph, open_branches, store),
        draft: is_draft(&title),
        body: change.body().to_string(),
        title,
    }
}

/// Fields of `existing` that differ from `desired`
pub fn stale_fields(existing: &PullRequest, desired: &DesiredPr) -> Vec<PrField> {
    let mut fields = Vec::new();
    if existing.title != desired.title {
        fields.push(PrField::Title);
    }
    if existing.body.trim_end() != desired.body.trim_end() {
        fields.push(PrField::Body);
    }
    if existing.base_ref != desired.base {
        fields.push(PrField::Base);
    }
    if existing.is_draft != desired.draft {
        fields.push(PrField::Draft);
    }
    fields
}

/// Evaluation of one syncable revision
#[derive(Debug, Clone)]
pub struct RevisionPlan {
    /// The revision
    pub change: Change,
    /// Desired PR contents
    pub desired: DesiredPr,
    /// Open PR for the revision's branch
    pub existing: Option<PullRequest>,
    /// Required action, `None` when up to date
    pub action: Option<SyncAction>,
}

impl RevisionPlan {
    /// Whether anything has to happen for this revision
    pub const fn needs_sync(&self) -> bool {
        self.action.is_some()
    }

    /// Whether the branch must be pushed
    pub fn needs_push(&self) -> bool {
        self.action.as_ref().is_some_and(SyncAction::needs_push)
    }

    /// Branch the revision is pushed to
    pub fn branch(&self) -> &str {
        &self.change.push_branch
    }
}

/// Result of evaluating a whole batch
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// One plan per syncable revision, ancestors first
    pub plans: Vec<RevisionPlan>,
    /// Branches treated as having an open PR during base resolution
    pub open_branches: HashSet<String>,
}

impl Evaluation {
    /// Whether any revision needs sync
    pub fn needs_sync(&self) -> bool {
        self.plans.iter().any(RevisionPlan::needs_sync)
    }

    /// Plans that need sync, ancestors first
    pub fn pending(&self) -> impl Iterator<Item = &RevisionPlan> {
        self.plans.iter().filter(|p| p.needs_sync())
    }

    /// Plan for a change
    pub fn plan(&self, change_id: &str) -> Option<&RevisionPlan> {
        self.plans.iter().find(|p| p.change.change_id == change_id)
    }

    /// Number of PRs that will be created
    pub fn create_count(&self) -> usize {
        self.pending()
            .filter(|p| matches!(p.action, Some(SyncAction::Create)))
            .count()
    }

    /// Number of PRs that will be updated
    pub fn update_count(&self) -> usize {
        self.pending()
            .filter(|p| matches!(p.action, Some(SyncAction::Update { .. })))
            .count()
    }
}

/// Decide, per syncable revision, whether its PR is out of date
///
/// `existing` maps head branch to the open PR found for it.
pub fn evaluate(
    graph: &RevisionGraph,
    existing: &HashMap<String, PullRequest>,
    store: &AssociationStore,
) -> Evaluation {
    let open_branches = open_branch_set(graph, existing);

    let plans = graph
        .syncable()
        .map(|change| {
            let desired = desired_pr(change, graph, &open_branches, Some(store));
            let existing = existing.get(&change.push_branch).cloned();

            let action = match &existing {
                None => Some(SyncAction::Create),
                Some(pr) => {
                    let push = pr.head_sha != change.commit_id;
                    let fields = stale_fields(pr, &desired);
                    (push || !fields.is_empty()).then_some(SyncAction::Update { push, fields })
                }
            };

            RevisionPlan {
                change: change.clone(),
                desired,
                existing,
                action,
            }
        })
        .collect();

    Evaluation {
        plans,
        open_branches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_draft() {
        assert!(is_draft("WIP: parser"));
        assert!(is_draft("parser (wip)"));
        assert!(is_draft("Swipe gestures"));
        assert!(!is_draft("Add parser"));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(SyncAction::Create.to_string(), "create PR");
        let update = SyncAction::Update {
            push: true,
            fields: vec![PrField::Base, PrField::Draft],
        };
        assert_eq!(update.to_string(), "push, update base, update draft");
        assert!(update.needs_push());
    }

    #[test]
    fn test_body_trailing_whitespace_ignored() {
        let pr = PullRequest {
            number: 1,
            html_url: String::new(),
            base_ref: "main".to_string(),
            head_ref: "push-a".to_string(),
            head_sha: "a0".to_string(),
            title: "Title".to_string(),
            body: "Body".to_string(),
            node_id: None,
            is_draft: false,
        };
        let desired = DesiredPr {
            base: "main".to_string(),
            title: "Title".to_string(),
            body: "Body\n\n".to_string(),
            draft: false,
        };
        assert!(stale_fields(&pr, &desired).is_empty());
    }
}
