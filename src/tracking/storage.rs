//! Persistence for the association store in `.jj/repo/jj-stack/`.

use super::{AssociationStore, STATE_VERSION};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory name for jj-stack metadata within `.jj/repo/`.
const STATE_DIR: &str = "jj-stack";

/// Filename for the association store.
const STATE_FILE: &str = "state.json";

/// Resolve the `.jj/repo` path, handling jj workspace indirection.
///
/// In secondary workspaces (`jj workspace add`), `.jj/repo` is a plain text
/// file holding the absolute path of the main workspace's `.jj/repo`.
/// Falls back to the original path if resolution fails.
pub(super) fn resolve_repo_path(workspace_root: &Path) -> PathBuf {
    let repo_path = workspace_root.join(".jj").join("repo");

    if repo_path.is_file() {
        if let Ok(contents) = fs::read_to_string(&repo_path) {
            let target = PathBuf::from(contents.trim());
            if target.is_dir() {
                return fs::canonicalize(&target).unwrap_or(target);
            }
        }
        // Invalid pointer file: return as-is so the write surfaces the error
        return repo_path;
    }

    repo_path
}

fn state_dir(workspace_root: &Path) -> PathBuf {
    resolve_repo_path(workspace_root).join(STATE_DIR)
}

/// Get path to the state file.
pub fn state_path(workspace_root: &Path) -> PathBuf {
    state_dir(workspace_root).join(STATE_FILE)
}

/// Load the association store.
///
/// Never fails: a missing, unreadable or corrupt file yields an empty store.
pub fn load_state(workspace_root: &Path) -> AssociationStore {
    let path = state_path(workspace_root);

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state file, starting empty");
            return AssociationStore::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read state file, starting empty");
            return AssociationStore::new();
        }
    };

    match serde_json::from_str::<AssociationStore>(&content) {
        Ok(mut store) => {
            debug!(entries = store.len(), "loaded state");
            store.version = STATE_VERSION;
            store
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "state file is corrupt, starting empty");
            AssociationStore::new()
        }
    }
}

/// Save the association store.
///
/// Writes a temporary file next to the target and renames it into place.
pub fn save_state(workspace_root: &Path, store: &AssociationStore) -> Result<()> {
    let dir = state_dir(workspace_root);
    let path = dir.join(STATE_FILE);

    fs::create_dir_all(&dir)
        .map_err(|e| Error::State(format!("failed to create {}: {e}", dir.display())))?;

    let mut to_save = store.clone();
    to_save.version = STATE_VERSION;

    let content = serde_json::to_string_pretty(&to_save)
        .map_err(|e| Error::State(format!("failed to serialize state: {e}")))?;

    let tmp = dir.join(format!("{STATE_FILE}.tmp"));
    fs::write(&tmp, content)
        .map_err(|e| Error::State(format!("failed to write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, &path)
        .map_err(|e| Error::State(format!("failed to replace {}: {e}", path.display())))?;

    debug!(path = %path.display(), entries = store.len(), "saved state");
    Ok(())
}
