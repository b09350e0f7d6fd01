//! Usage command - fetch and display this month's premium-request usage.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tallybar_core::UsageSnapshot;
use tallybar_store::{RefreshState, RefreshStatus, SnapshotStore};
use tracing::{debug, info};

use crate::commands::AppContext;
use crate::output::{JsonFormatter, StatusOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the usage command.
#[derive(Args, Default)]
pub struct UsageArgs {
    /// Show the cached snapshot only; do not contact GitHub.
    #[arg(long)]
    pub cached: bool,
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli) -> Result<ExitCode> {
    let ctx = AppContext::load(cli).await?;

    if args.cached {
        let snapshot = ctx.snapshots.load().await;
        print_cached(snapshot.as_ref(), cli)?;
        return Ok(ExitCode::Success);
    }

    let controller = ctx.controller(ctx.config.clone())?;
    info!("Fetching usage");
    controller.refresh().await;

    let mut status = controller.status().await;
    let code = match &status.state {
        RefreshState::Failed { kind, .. } => ExitCode::from(*kind),
        _ => ExitCode::Success,
    };

    // Fall back to the last good snapshot so a failed fetch still shows data
    if status.snapshot.is_none() {
        status.snapshot = ctx.snapshots.load().await;
        debug!(cached = status.snapshot.is_some(), "Using cached snapshot after failure");
    }

    print_status(&status, cli)?;
    Ok(code)
}

fn print_status(status: &RefreshStatus, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_status(status, Utc::now()));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&StatusOutput::from_status(status))?);
        }
    }
    Ok(())
}

/// Prints a snapshot read from the cache, or a note that there is none.
pub fn print_cached(snapshot: Option<&UsageSnapshot>, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            match snapshot {
                Some(snapshot) => println!("{}", formatter.format_snapshot(snapshot, Utc::now())),
                None => println!("No cached snapshot"),
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&StatusOutput::cached(snapshot))?);
        }
    }
    Ok(())
}
