//! Cache command - inspect or remove the cached snapshot.

use anyhow::Result;
use clap::{Args, Subcommand};
use tallybar_store::SnapshotStore;

use crate::commands::AppContext;
use crate::commands::usage::print_cached;
use crate::{Cli, ExitCode};

/// Arguments for the cache command.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub enum CacheAction {
    /// Print the cached snapshot.
    Show,

    /// Delete the cached snapshot.
    Clear,
}

/// Runs the cache command.
pub async fn run(args: &CacheArgs, cli: &Cli) -> Result<ExitCode> {
    let ctx = AppContext::load(cli).await?;

    match args.action {
        CacheAction::Show => {
            let snapshot = ctx.snapshots.load().await;
            print_cached(snapshot.as_ref(), cli)?;
        }
        CacheAction::Clear => {
            if ctx.snapshots.clear().await? {
                println!("Removed {}", ctx.snapshots.path().display());
            } else {
                println!("No cached snapshot");
            }
        }
    }

    Ok(ExitCode::Success)
}
