//! `jj` subprocess implementation of [`Workspace`]

use super::{RebaseOutcome, Workspace};
use crate::error::{Error, Result};
use crate::types::{Change, GitRemote};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// jj's built-in push bookmark template, used when the user has not configured one
const DEFAULT_PUSH_TEMPLATE: &str = r#""push-" ++ change_id.short()"#;

/// Roots of the user's mutable work that do not already sit on trunk
const STACK_ROOTS_REVSET: &str = "roots(trunk()..(mutable() & mine())) ~ children(trunk())";

/// One JSON object per change; `{push}` is replaced with the push bookmark template
const LOG_TEMPLATE: &str = r#""{\"id\": \"" ++ change_id ++ "\", \"commit_id\": \"" ++ commit_id ++ "\", \"immutable\": " ++ immutable ++ ", \"description\": " ++ json(description) ++ ", \"bookmarks\": " ++ json(bookmarks) ++ ", \"git_push_bookmark\": \"" ++ {push} ++ "\", \"parents\": " ++ json(parents) ++ "}\n""#;

#[derive(Deserialize)]
struct RawChange {
    id: String,
    commit_id: String,
    immutable: bool,
    description: String,
    #[serde(default)]
    bookmarks: Vec<RawRef>,
    git_push_bookmark: String,
    #[serde(default)]
    parents: Vec<RawParent>,
}

#[derive(Deserialize)]
struct RawRef {
    name: String,
    #[serde(default)]
    remote: Option<String>,
}

#[derive(Deserialize)]
struct RawParent {
    change_id: String,
}

impl From<RawChange> for Change {
    fn from(raw: RawChange) -> Self {
        let mut local: Vec<String> = raw
            .bookmarks
            .iter()
            .filter(|b| b.remote.is_none())
            .map(|b| b.name.clone())
            .collect();
        // Trunk is frequently only known through its remote bookmark
        if local.is_empty() {
            local = raw.bookmarks.into_iter().map(|b| b.name).collect();
            local.dedup();
        }

        Self {
            change_id: raw.id,
            commit_id: raw.commit_id,
            immutable: raw.immutable,
            description: raw.description,
            bookmarks: local,
            push_branch: raw.git_push_bookmark,
            parents: raw.parents.into_iter().map(|p| p.change_id).collect(),
        }
    }
}

/// Decode the output of `jj log` rendered with [`LOG_TEMPLATE`]
pub(crate) fn parse_log_output(output: &[u8]) -> Result<Vec<Change>> {
    serde_json::Deserializer::from_slice(output)
        .into_iter::<RawChange>()
        .map(|raw| {
            raw.map(Change::from)
                .map_err(|e| Error::Query(format!("malformed jj log output: {e}")))
        })
        .collect()
}

/// A jj workspace driven through the `jj` CLI
pub struct JjWorkspace {
    root: PathBuf,
    push_template: String,
}

impl JjWorkspace {
    /// Open the workspace containing `path`
    pub async fn open(path: &Path) -> Result<Self> {
        let output = run_jj(path, &["root"]).await.map_err(Error::Query)?;
        let root = PathBuf::from(String::from_utf8_lossy(&output).trim());

        let push_template = match run_jj(&root, &["config", "get", "templates.git_push_bookmark"])
            .await
        {
            Ok(out) => {
                let template = String::from_utf8_lossy(&out).trim().to_string();
                if template.is_empty() {
                    DEFAULT_PUSH_TEMPLATE.to_string()
                } else {
                    template
                }
            }
            Err(e) => {
                debug!(error = %e, "no git_push_bookmark template configured, using default");
                DEFAULT_PUSH_TEMPLATE.to_string()
            }
        };

        debug!(root = %root.display(), push_template, "opened jj workspace");
        Ok(Self {
            root,
            push_template,
        })
    }

    async fn jj(&self, args: &[&str]) -> std::result::Result<Vec<u8>, String> {
        run_jj(&self.root, args).await
    }
}

/// Run `jj` in `dir`, returning stdout or a message built from stderr
async fn run_jj(dir: &Path, args: &[&str]) -> std::result::Result<Vec<u8>, String> {
    debug!(?args, "running jj");
    let output = Command::new("jj")
        .args(args)
        .arg("--color=never")
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| format!("failed to run jj: {e}"))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!(
            "jj {} exited with {}: {}",
            args.first().copied().unwrap_or_default(),
            output.status,
            stderr.trim()
        ))
    }
}

#[async_trait]
impl Workspace for JjWorkspace {
    fn workspace_root(&self) -> &Path {
        &self.root
    }

    async fn changes(&self, revset: &str) -> Result<Vec<Change>> {
        let template = LOG_TEMPLATE.replace("{push}", &self.push_template);
        let output = self
            .jj(&["log", "--no-graph", "--reversed", "-r", revset, "-T", &template])
            .await
            .map_err(Error::Query)?;
        let changes = parse_log_output(&output)?;
        debug!(revset, count = changes.len(), "loaded changes");
        Ok(changes)
    }

    async fn push_change(&self, change_id: &str, remote: &str) -> Result<()> {
        debug!(change_id, remote, "pushing change");
        self.jj(&["git", "push", "--remote", remote, "--change", change_id])
            .await
            .map_err(|message| Error::Push {
                change_id: change_id.to_string(),
                message,
            })?;
        Ok(())
    }

    async fn git_fetch(&self, remote: &str) -> Result<()> {
        debug!(remote, "fetching");
        self.jj(&["git", "fetch", "--remote", remote])
            .await
            .map_err(Error::Jj)?;
        Ok(())
    }

    async fn git_remotes(&self) -> Result<Vec<GitRemote>> {
        let output = self
            .jj(&["git", "remote", "list"])
            .await
            .map_err(Error::Jj)?;
        parse_remote_list(&String::from_utf8_lossy(&output))
    }

    async fn stack_roots(&self) -> Result<Vec<Change>> {
        self.changes(STACK_ROOTS_REVSET).await
    }

    async fn rebase(&self, change_id: &str, destination: &str) -> Result<RebaseOutcome> {
        // Captured up front: once the root is abandoned, `root::` no longer
        // reaches the descendants that moved with it.
        let subtree: Vec<String> = self
            .changes(&format!("({change_id})::"))
            .await?
            .into_iter()
            .map(|c| c.change_id)
            .collect();

        debug!(change_id, destination, descendants = subtree.len(), "rebasing");
        self.jj(&[
            "rebase",
            "-s",
            change_id,
            "-d",
            destination,
            "--skip-emptied",
        ])
        .await
        .map_err(Error::Jj)?;

        let skipped_empty = self
            .changes(&format!("present({change_id})"))
            .await?
            .is_empty();
        let conflicted = self.changes(&conflicts_revset(&subtree)).await?;

        Ok(RebaseOutcome {
            has_conflict: !conflicted.is_empty(),
            skipped_empty,
        })
    }
}

/// Conflicted changes among `change_ids`, tolerating ones that were abandoned
fn conflicts_revset(change_ids: &[String]) -> String {
    if change_ids.is_empty() {
        return "none()".to_string();
    }
    let members: Vec<String> = change_ids
        .iter()
        .map(|id| format!("present({id})"))
        .collect();
    format!("({}) & conflicts()", members.join(" | "))
}

/// Parse `jj git remote list` output (`<name> <url>` per line)
pub(crate) fn parse_remote_list(output: &str) -> Result<Vec<GitRemote>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_once(char::is_whitespace)
                .map(|(name, url)| GitRemote {
                    name: name.to_string(),
                    url: url.trim().to_string(),
                })
                .ok_or_else(|| Error::Parse(format!("unknown remote format {line:?}")))
        })
        .collect()
}
