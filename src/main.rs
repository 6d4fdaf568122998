//! jj-stack - stacked pull requests for Jujutsu

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use jj_stack::config::load_config;
use jj_stack::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "jj-stack")]
#[command(about = "Keep a stack of jj changes in sync with GitHub pull requests")]
#[command(version)]
struct Cli {
    /// Path to jj repository (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update one pull request per change in the stack
    Submit {
        /// Revset whose ancestors down to trunk are submitted
        revset: Option<String>,

        /// Git remote to push to
        #[arg(long)]
        remote: Option<String>,

        /// Proceed without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,

        /// Show what would be done without making changes
        #[arg(long, conflicts_with = "yes")]
        dry_run: bool,
    },

    /// Fetch and rebase every local stack onto trunk
    Sync {
        /// Git remote to fetch from
        #[arg(long)]
        remote: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = cli.path.unwrap_or_else(|| PathBuf::from("."));
    let config = load_config()?;

    let command = async {
        match cli.command {
            Commands::Submit {
                revset,
                remote,
                yes,
                dry_run,
            } => {
                cli::run_submit(
                    &path,
                    revset.as_deref(),
                    remote.as_deref(),
                    cli::SubmitArgs { yes, dry_run },
                    &config,
                )
                .await
            }
            Commands::Sync { remote } => cli::run_sync(&path, remote.as_deref(), &config).await,
        }
    };

    tokio::select! {
        result = command => result?,
        _ = tokio::signal::ctrl_c() => return Err(Error::Interrupted.into()),
    }

    Ok(())
}
