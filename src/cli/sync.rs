//! Sync command - fetch and rebase local stacks onto trunk

use crate::cli::context::CommandContext;
use crate::cli::style::{CHECK, Stylize, check, cross, spinner_style};
use anstream::println;
use indicatif::ProgressBar;
use jj_stack::config::Config;
use jj_stack::error::{Error, Result};
use jj_stack::rebase::{RebaseStatus, sync_stacks};
use jj_stack::submit::NoopProgress;
use std::path::Path;
use std::time::Duration;

/// Run the sync command
pub async fn run_sync(path: &Path, remote: Option<&str>, config: &Config) -> Result<()> {
    let ctx = CommandContext::new(path, remote, config).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("Syncing with {}...", ctx.remote_name.emphasis()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    // Per-root results are printed from the report once the spinner is gone
    let result = sync_stacks(&ctx.workspace, &ctx.remote_name, &NoopProgress).await;
    spinner.finish_and_clear();
    let report = result?;

    if report.is_up_to_date() {
        println!(
            "{} All stacks are already on {}",
            check(),
            report.trunk.accent()
        );
        return Ok(());
    }

    println!("{} onto {}:", "Rebased".emphasis(), report.trunk.accent());
    for item in &report.items {
        let symbol = match item.status {
            RebaseStatus::Rebased | RebaseStatus::SkippedEmpty => check(),
            RebaseStatus::Conflict | RebaseStatus::SkippedEmptyWithConflict => "!".warning(),
            RebaseStatus::Failed(_) => cross(),
        };
        let short: String = item.change_id.chars().take(8).collect();
        println!(
            "  {symbol} {} {} {}",
            short.accent(),
            item.title,
            item.status.muted()
        );
    }

    println!();
    println!(
        "{} {} rebased, {} abandoned, {} with conflicts, {} failed",
        format!("{CHECK} Sync complete:").success(),
        report.rebased().accent(),
        report.skipped().accent(),
        report.conflicts().accent(),
        report.failed().accent()
    );

    if report.conflicts() > 0 {
        println!(
            "{}",
            "Resolve conflicts with `jj resolve`, then run `jj-stack submit`.".warning()
        );
    }

    if report.failed() > 0 {
        return Err(Error::Jj(format!(
            "{} stack(s) could not be rebased",
            report.failed()
        )));
    }
    Ok(())
}
