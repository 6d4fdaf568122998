//! Persisted association store
//!
//! Maps jj change IDs to the pull request last seen for them, so a change
//! keeps its PR across rebases and squashes, and merged PRs can still be
//! listed in stack comments after their change has left the local graph.

mod refresh;
mod storage;

pub use refresh::{RefreshSummary, refresh_departed};
pub use storage::{load_state, save_state, state_path};

use crate::types::PrState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current state file format version
pub const STATE_VERSION: u32 = 1;

/// Last known PR for one change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationEntry {
    /// PR number
    #[serde(alias = "prNumber")]
    pub pr_number: u64,
    /// Head branch of the PR
    pub branch: String,
    /// Last observed PR state
    pub state: PrState,
    /// PR title when last synced
    pub title: String,
}

/// Change ID to PR associations, one entry per change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationStore {
    /// Format version
    pub version: u32,
    /// Entries keyed by change ID
    #[serde(default)]
    pub entries: BTreeMap<String, AssociationEntry>,
}

impl Default for AssociationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociationStore {
    /// Create an empty store
    pub const fn new() -> Self {
        Self {
            version: STATE_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Entry for a change
    pub fn get(&self, change_id: &str) -> Option<&AssociationEntry> {
        self.entries.get(change_id)
    }

    /// Insert or replace the entry for a change
    pub fn set(&mut self, change_id: impl Into<String>, entry: AssociationEntry) {
        self.entries.insert(change_id.into(), entry);
    }

    /// Remove the entry for a change
    pub fn remove(&mut self, change_id: &str) -> Option<AssociationEntry> {
        self.entries.remove(change_id)
    }

    /// Whether the change's PR is known to be merged
    pub fn is_merged(&self, change_id: &str) -> bool {
        self.get(change_id)
            .is_some_and(|e| e.state == PrState::Merged)
    }

    /// Entries whose PR was merged, keyed by change ID
    pub fn merged(&self) -> impl Iterator<Item = (&str, &AssociationEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.state == PrState::Merged)
            .map(|(id, e)| (id.as_str(), e))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
