//! Submit command - reconcile the stack with its pull requests

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::render::{print_plan, print_stack};
use crate::cli::style::{CHECK, CROSS, Stylize};
use anstream::{eprintln, println};
use async_trait::async_trait;
use jj_stack::config::Config;
use jj_stack::error::{Error, Result};
use jj_stack::submit::{
    Confirm, Evaluation, Stack, SubmitOptions, SubmitReport, SyncPhase, run_submit as run_session,
};
use std::path::Path;

/// Flags for the submit command
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitArgs {
    /// Skip the confirmation prompt
    pub yes: bool,
    /// Show the plan and stop
    pub dry_run: bool,
}

/// Confirmation through the terminal
struct CliConfirm {
    args: SubmitArgs,
}

#[async_trait]
impl Confirm for CliConfirm {
    async fn confirm(&self, evaluation: &Evaluation, stack: &Stack) -> Result<bool> {
        println!();
        print_stack(stack);
        println!();
        print_plan(evaluation);
        println!();

        if self.args.dry_run {
            return Ok(false);
        }
        if self.args.yes {
            return Ok(true);
        }

        dialoguer::Confirm::new()
            .with_prompt("Proceed with sync?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("failed to read confirmation: {e}")))
    }
}

/// Run the submit command
pub async fn run_submit(
    path: &Path,
    revset: Option<&str>,
    remote: Option<&str>,
    args: SubmitArgs,
    config: &Config,
) -> Result<()> {
    let ctx = CommandContext::new(path, remote, config).await?;
    let platform = ctx.platform().await?;

    let options = SubmitOptions {
        revset: revset.unwrap_or(&config.default_revset).to_string(),
        remote: ctx.remote_name.clone(),
        concurrency: config.concurrency(),
    };

    let confirm = CliConfirm { args };
    let progress = CliProgress;
    let report = run_session(
        &ctx.workspace,
        platform.as_ref(),
        &confirm,
        &progress,
        &options,
    )
    .await;

    print_outcome(&report, args)
}

fn print_outcome(report: &SubmitReport, args: SubmitArgs) -> Result<()> {
    match report.phase() {
        SyncPhase::UpToDate => {
            print_stack(&report.stack);
            println!();
            println!("{}", format!("{CHECK} All pull requests are up to date").success());
        }
        SyncPhase::Confirmation => {
            if args.dry_run {
                println!("{}", "Dry run: no changes made".muted());
            } else {
                println!("{}", "Aborted".muted());
            }
        }
        SyncPhase::Complete => {
            println!();
            print_stack(&report.stack);
            println!();

            let (created, updated) = report
                .sync
                .as_ref()
                .map_or((0, 0), |s| (s.created().count(), s.updated().count()));
            let pushed = report.sync.as_ref().map_or(0, |s| s.pushed.len());
            let comments = report.comments.map_or(0, |c| c.writes());
            println!(
                "{} {} pushed, {} created, {} updated, {} comments written",
                format!("{CHECK} Sync complete:").success(),
                pushed.accent(),
                created.accent(),
                updated.accent(),
                comments.accent()
            );
            if !report.refresh.merged.is_empty() {
                println!(
                    "  {}",
                    format!("{} PR(s) merged since last run", report.refresh.merged.len()).muted()
                );
            }
        }
        SyncPhase::Failed => {
            if !report.stack.rows().is_empty() {
                println!();
                print_stack(&report.stack);
                println!();
            }
            let error = report
                .error()
                .cloned()
                .unwrap_or_else(|| Error::Internal("submit failed without an error".to_string()));
            eprintln!("{} {error}", format!("{CROSS} Sync failed:").error());
            if matches!(error, Error::AmbiguousRemoteState { .. }) {
                eprintln!(
                    "{}",
                    "Close the duplicate pull requests on the remote, then re-run.".muted()
                );
            }
            return Err(error);
        }
        SyncPhase::Loading | SyncPhase::Syncing | SyncPhase::UpdatingComments => {
            return Err(Error::Internal(format!(
                "submit stopped in phase {:?}",
                report.phase()
            )));
        }
    }

    Ok(())
}
