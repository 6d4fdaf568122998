//! Mock jj workspace for testing

#![allow(dead_code)]

use async_trait::async_trait;
use jj_stack::error::{Error, Result};
use jj_stack::repo::{RebaseOutcome, Workspace};
use jj_stack::types::{Change, GitRemote};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Scripted workspace backed by a temporary directory
///
/// `changes` returns the configured batch for any revset except `trunk()`,
/// which returns the trunk revision. Pushes, fetches and rebases are
/// recorded rather than performed.
pub struct MockWorkspace {
    dir: TempDir,
    changes: Mutex<Vec<Change>>,
    remotes: Vec<GitRemote>,
    stack_roots: Mutex<Vec<Change>>,
    rebase_outcomes: Mutex<HashMap<String, RebaseOutcome>>,
    // Call tracking
    changes_calls: Mutex<Vec<String>>,
    push_calls: Mutex<Vec<String>>,
    fetch_calls: Mutex<Vec<String>>,
    rebase_calls: Mutex<Vec<(String, String)>>,
    // Error injection
    error_on_changes: Mutex<Option<String>>,
    error_on_push: Mutex<HashMap<String, String>>,
    error_on_fetch: Mutex<Option<String>>,
    error_on_rebase: Mutex<HashMap<String, String>>,
}

impl MockWorkspace {
    /// Workspace returning `changes` for every query
    pub fn new(changes: Vec<Change>) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            changes: Mutex::new(changes),
            remotes: vec![GitRemote {
                name: "origin".to_string(),
                url: "git@github.com:test/repo.git".to_string(),
            }],
            stack_roots: Mutex::new(Vec::new()),
            rebase_outcomes: Mutex::new(HashMap::new()),
            changes_calls: Mutex::new(Vec::new()),
            push_calls: Mutex::new(Vec::new()),
            fetch_calls: Mutex::new(Vec::new()),
            rebase_calls: Mutex::new(Vec::new()),
            error_on_changes: Mutex::new(None),
            error_on_push: Mutex::new(HashMap::new()),
            error_on_fetch: Mutex::new(None),
            error_on_rebase: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the revision batch (e.g. after a squash merge)
    pub fn set_changes(&self, changes: Vec<Change>) {
        *self.changes.lock().unwrap() = changes;
    }

    /// Configure the roots returned by `stack_roots`
    pub fn set_stack_roots(&self, roots: Vec<Change>) {
        *self.stack_roots.lock().unwrap() = roots;
    }

    /// Configure the outcome of rebasing one root
    pub fn set_rebase_outcome(&self, change_id: &str, outcome: RebaseOutcome) {
        self.rebase_outcomes
            .lock()
            .unwrap()
            .insert(change_id.to_string(), outcome);
    }

    /// Path of the fake workspace root
    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    // === Error injection methods ===

    /// Make `changes` fail
    pub fn fail_changes(&self, msg: &str) {
        *self.error_on_changes.lock().unwrap() = Some(msg.to_string());
    }

    /// Make pushing one change fail
    pub fn fail_push_for(&self, change_id: &str, msg: &str) {
        self.error_on_push
            .lock()
            .unwrap()
            .insert(change_id.to_string(), msg.to_string());
    }

    /// Make `git_fetch` fail
    pub fn fail_fetch(&self, msg: &str) {
        *self.error_on_fetch.lock().unwrap() = Some(msg.to_string());
    }

    /// Make rebasing one root fail
    pub fn fail_rebase_for(&self, change_id: &str, msg: &str) {
        self.error_on_rebase
            .lock()
            .unwrap()
            .insert(change_id.to_string(), msg.to_string());
    }

    // === Call verification methods ===

    /// Revsets passed to `changes`
    pub fn get_changes_calls(&self) -> Vec<String> {
        self.changes_calls.lock().unwrap().clone()
    }

    /// Change IDs pushed, in order
    pub fn get_push_calls(&self) -> Vec<String> {
        self.push_calls.lock().unwrap().clone()
    }

    /// Remotes fetched
    pub fn get_fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }

    /// `(change_id, destination)` pairs rebased, in order
    pub fn get_rebase_calls(&self) -> Vec<(String, String)> {
        self.rebase_calls.lock().unwrap().clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.changes_calls.lock().unwrap().clear();
        self.push_calls.lock().unwrap().clear();
        self.fetch_calls.lock().unwrap().clear();
        self.rebase_calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Workspace for MockWorkspace {
    fn workspace_root(&self) -> &Path {
        self.dir.path()
    }

    async fn changes(&self, revset: &str) -> Result<Vec<Change>> {
        self.changes_calls.lock().unwrap().push(revset.to_string());

        if let Some(msg) = self.error_on_changes.lock().unwrap().as_ref() {
            return Err(Error::Query(msg.clone()));
        }

        let changes = self.changes.lock().unwrap();
        if revset == "trunk()" {
            return Ok(changes.iter().filter(|c| c.immutable).take(1).cloned().collect());
        }
        Ok(changes.clone())
    }

    async fn push_change(&self, change_id: &str, _remote: &str) -> Result<()> {
        self.push_calls.lock().unwrap().push(change_id.to_string());

        if let Some(msg) = self.error_on_push.lock().unwrap().get(change_id) {
            return Err(Error::Push {
                change_id: change_id.to_string(),
                message: msg.clone(),
            });
        }
        Ok(())
    }

    async fn git_fetch(&self, remote: &str) -> Result<()> {
        self.fetch_calls.lock().unwrap().push(remote.to_string());

        if let Some(msg) = self.error_on_fetch.lock().unwrap().as_ref() {
            return Err(Error::Jj(msg.clone()));
        }
        Ok(())
    }

    async fn git_remotes(&self) -> Result<Vec<GitRemote>> {
        Ok(self.remotes.clone())
    }

    async fn stack_roots(&self) -> Result<Vec<Change>> {
        Ok(self.stack_roots.lock().unwrap().clone())
    }

    async fn rebase(&self, change_id: &str, destination: &str) -> Result<RebaseOutcome> {
        self.rebase_calls
            .lock()
            .unwrap()
            .push((change_id.to_string(), destination.to_string()));

        if let Some(msg) = self.error_on_rebase.lock().unwrap().get(change_id) {
            return Err(Error::Jj(msg.clone()));
        }
        Ok(self
            .rebase_outcomes
            .lock()
            .unwrap()
            .get(change_id)
            .copied()
            .unwrap_or_default())
    }
}
