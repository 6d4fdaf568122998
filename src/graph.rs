//! Validated revision batch
//!
//! Everything downstream (base resolution, evaluation, stack projection)
//! assumes the invariants checked here, so malformed jj output is rejected
//! once, at the boundary.

use crate::error::{Error, Result};
use crate::types::Change;
use std::collections::HashMap;

/// Trunk bookmark used when the trunk revision carries no bookmark
pub const DEFAULT_TRUNK: &str = "main";

/// The batch of revisions returned for one submit, indexed by change ID
#[derive(Debug, Clone)]
pub struct RevisionGraph {
    changes: Vec<Change>,
    index: HashMap<String, usize>,
    trunk: String,
}

impl RevisionGraph {
    /// Validate a batch in ancestor-to-descendant order
    pub fn new(changes: Vec<Change>) -> Result<Self> {
        let mut index = HashMap::with_capacity(changes.len());

        for (i, change) in changes.iter().enumerate() {
            if change.change_id.is_empty() {
                return Err(Error::Query("revision with empty change ID".to_string()));
            }
            if index.insert(change.change_id.clone(), i).is_some() {
                return Err(Error::Query(format!(
                    "change {} appears more than once",
                    change.change_id
                )));
            }
            if change.immutable {
                continue;
            }
            if change.push_branch.trim().is_empty() {
                return Err(Error::Query(format!(
                    "change {} has no branch name",
                    change.change_id
                )));
            }
            if change.parents.is_empty() {
                return Err(Error::Query(format!(
                    "mutable change {} has no parents",
                    change.change_id
                )));
            }
        }

        let trunk = changes
            .iter()
            .find(|c| c.immutable)
            .and_then(|c| c.bookmarks.first())
            .cloned()
            .unwrap_or_else(|| DEFAULT_TRUNK.to_string());

        Ok(Self {
            changes,
            index,
            trunk,
        })
    }

    /// All revisions, ancestors first
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Look up a revision by change ID
    pub fn get(&self, change_id: &str) -> Option<&Change> {
        self.index.get(change_id).map(|&i| &self.changes[i])
    }

    /// Whether the change is part of this batch
    pub fn contains(&self, change_id: &str) -> bool {
        self.index.contains_key(change_id)
    }

    /// Mutable revisions, ancestors first
    pub fn mutable(&self) -> impl DoubleEndedIterator<Item = &Change> {
        self.changes.iter().filter(|c| !c.immutable)
    }

    /// Revisions that become pull requests: mutable and described
    pub fn syncable(&self) -> impl DoubleEndedIterator<Item = &Change> {
        self.mutable().filter(|c| c.has_description())
    }

    /// Name of the trunk branch
    pub fn trunk_name(&self) -> &str {
        &self.trunk
    }

    /// Whether the batch has no mutable revisions
    pub fn is_empty(&self) -> bool {
        self.mutable().next().is_none()
    }
}
