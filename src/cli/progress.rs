//! Terminal progress callback

use crate::cli::style::{Stylize, check, cross};
use anstream::{eprintln, println};
use async_trait::async_trait;
use jj_stack::error::Error;
use jj_stack::submit::{CommentOutcome, ProgressCallback, PushStatus, SyncPhase};
use jj_stack::types::PullRequest;

/// Progress callback that prints submit progress to stdout
pub struct CliProgress;

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: SyncPhase) {
        match phase {
            SyncPhase::Loading | SyncPhase::Syncing | SyncPhase::UpdatingComments => {
                println!("{}...", phase.muted());
            }
            _ => {}
        }
    }

    async fn on_push(&self, branch: &str, status: PushStatus) {
        match &status {
            PushStatus::Started => println!("  Pushing {}...", branch.accent()),
            PushStatus::Success => println!("  {} Pushed {}", check(), branch.accent()),
            PushStatus::Failed(msg) => {
                println!("  {} Failed to push {}: {msg}", cross(), branch.accent());
            }
        }
    }

    async fn on_pr_created(&self, branch: &str, pr: &PullRequest) {
        println!(
            "  {} Created PR {} for {}",
            check(),
            format!("#{}", pr.number).accent(),
            branch
        );
        println!("    {}", pr.html_url.muted());
    }

    async fn on_pr_updated(&self, branch: &str, pr: &PullRequest) {
        println!(
            "  {} Updated PR {} for {}",
            check(),
            format!("#{}", pr.number).accent(),
            branch
        );
    }

    async fn on_comment(&self, pr_number: u64, outcome: CommentOutcome) {
        match outcome {
            CommentOutcome::Created => {
                println!("  {} Added stack comment to #{pr_number}", check());
            }
            CommentOutcome::Updated => {
                println!("  {} Updated stack comment on #{pr_number}", check());
            }
            CommentOutcome::Unchanged => {}
        }
    }

    async fn on_error(&self, error: &Error) {
        eprintln!("  {} {error}", "Error:".error());
    }

    async fn on_message(&self, message: &str) {
        println!("{message}");
    }
}
