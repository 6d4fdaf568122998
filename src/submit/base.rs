//! Base branch resolution

use crate::graph::RevisionGraph;
use crate::tracking::AssociationStore;
use crate::types::{Change, PrState, PullRequest};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Branches that have, or will have by the end of the run, an open PR
///
/// This is every branch with an existing open PR plus the branch of every
/// syncable revision in the batch.
pub fn open_branch_set(
    graph: &RevisionGraph,
    existing: &HashMap<String, PullRequest>,
) -> HashSet<String> {
    existing
        .keys()
        .cloned()
        .chain(graph.syncable().map(|c| c.push_branch.clone()))
        .collect()
}

/// Branch the PR for `change` should target
///
/// Follows first parents only. A parent outside the batch has left the stack.
/// If `store` still records an open PR for it (refreshed against the remote
/// before evaluation), that PR's branch is the base; a merged or unknown
/// parent resolves to trunk. An immutable parent resolves to its first
/// bookmark, falling back to trunk. A mutable parent whose branch is in
/// `open_branches` is the base; any other mutable parent is skipped over.
pub fn resolve_base(
    change: &Change,
    graph: &RevisionGraph,
    open_branches: &HashSet<String>,
    store: Option<&AssociationStore>,
) -> String {
    let trunk = graph.trunk_name();
    let mut visited = HashSet::new();
    let mut next = change.first_parent();

    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            break;
        }

        let Some(parent) = graph.get(parent_id) else {
            return departed_base(change, parent_id, store, trunk);
        };

        if parent.immutable {
            return parent
                .bookmarks
                .first()
                .cloned()
                .unwrap_or_else(|| trunk.to_string());
        }

        if open_branches.contains(&parent.push_branch) {
            return parent.push_branch.clone();
        }

        next = parent.first_parent();
    }

    trunk.to_string()
}

fn departed_base(
    change: &Change,
    parent_id: &str,
    store: Option<&AssociationStore>,
    trunk: &str,
) -> String {
    match store.and_then(|s| s.get(parent_id)) {
        Some(entry) if entry.state == PrState::Open => {
            trace!(
                change_id = %change.change_id,
                parent_id,
                branch = %entry.branch,
                "parent left the stack with an open PR"
            );
            entry.branch.clone()
        }
        Some(_) => {
            trace!(change_id = %change.change_id, parent_id, "parent PR is no longer open");
            trunk.to_string()
        }
        None => {
            trace!(change_id = %change.change_id, parent_id, "parent left the stack");
            trunk.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(id: &str, immutable: bool, parent: Option<&str>) -> Change {
        Change {
            change_id: id.to_string(),
            commit_id: format!("{id}0"),
            immutable,
            description: format!("{id}\n"),
            bookmarks: if immutable { vec!["main".to_string()] } else { vec![] },
            push_branch: format!("push-{id}"),
            parents: parent.map(ToString::to_string).into_iter().collect(),
        }
    }

    #[test]
    fn test_cycle_terminates_at_trunk() {
        // Not a real jj graph, but the walk must still stop
        let a = change("a", false, Some("b"));
        let b = change("b", false, Some("a"));
        let graph = RevisionGraph::new(vec![a.clone(), b]).unwrap();

        assert_eq!(resolve_base(&a, &graph, &HashSet::new(), None), "main");
    }

    #[test]
    fn test_open_branch_set_includes_syncable() {
        let graph = RevisionGraph::new(vec![
            change("t", true, None),
            change("a", false, Some("t")),
        ])
        .unwrap();
        let open = open_branch_set(&graph, &HashMap::new());
        assert!(open.contains("push-a"));
        assert!(!open.contains("push-t"));
    }
}
