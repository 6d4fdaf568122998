//! Test fixtures for building revision batches

#![allow(dead_code)]

use jj_stack::types::{Change, PlatformConfig};

/// Change ID of the trunk revision in fixtures
pub const TRUNK_ID: &str = "zzzzzzzzzzzz";

/// GitHub config for test/repo
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "test".to_string(),
        repo: "repo".to_string(),
        host: None,
    }
}

/// The immutable trunk revision, bookmarked `main`
pub fn make_trunk() -> Change {
    Change {
        change_id: TRUNK_ID.to_string(),
        commit_id: "trunk000".to_string(),
        immutable: true,
        description: "Initial commit\n".to_string(),
        bookmarks: vec!["main".to_string()],
        push_branch: format!("push-{TRUNK_ID}"),
        parents: vec![],
    }
}

/// A mutable change on top of `parent`
pub fn make_change(change_id: &str, parent: &str, description: &str) -> Change {
    Change {
        change_id: change_id.to_string(),
        commit_id: format!("{change_id}-commit"),
        immutable: false,
        description: description.to_string(),
        bookmarks: vec![],
        push_branch: format!("push-{change_id}"),
        parents: vec![parent.to_string()],
    }
}

/// Trunk followed by one change per `(id, description)`, each on the previous
pub fn make_linear_stack(specs: &[(&str, &str)]) -> Vec<Change> {
    let mut changes = vec![make_trunk()];
    let mut parent = TRUNK_ID.to_string();
    for (id, description) in specs {
        changes.push(make_change(id, &parent, description));
        parent = (*id).to_string();
    }
    changes
}

/// Branch name fixtures push a change to
pub fn branch(change_id: &str) -> String {
    format!("push-{change_id}")
}
