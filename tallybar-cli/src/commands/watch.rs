//! Watch command - keep polling and redraw on every change.

use std::io::{Write, stdout};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tallybar_store::{ConfigStore, MemoryConfigStore, RefreshStatus};
use tokio::time::{Duration, interval};
use tracing::{info, warn};

use crate::commands::AppContext;
use crate::output::{JsonFormatter, StatusOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// The countdown line goes stale without a state change, so redraw anyway.
const REDRAW_EVERY: Duration = Duration::from_secs(60);

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Poll interval in minutes for this session (0 = fetch once). Not saved.
    #[arg(long, short)]
    pub interval: Option<u32>,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<ExitCode> {
    let ctx = AppContext::load(cli).await?;

    let mut config = ctx.config.get().await;
    if let Some(minutes) = args.interval {
        config.refresh_interval_minutes = minutes;
    }
    info!(minutes = config.refresh_interval_minutes, "Starting watch mode");

    let minutes = config.refresh_interval_minutes;
    let session_config = Arc::new(MemoryConfigStore::new(config));
    let controller = ctx.controller(session_config)?;
    if !controller.is_configured().await {
        warn!("Username or token missing; run `tallybar config` first");
    }

    let mut updates = controller.subscribe();
    controller.start().await;

    let mut redraw = interval(REDRAW_EVERY);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = redraw.tick(), if cli.format == OutputFormat::Text => {}
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping watch mode");
                break;
            }
        }

        let status = updates.borrow_and_update().clone();
        render(&status, minutes, cli)?;
    }

    controller.stop();
    Ok(ExitCode::Success)
}

fn render(status: &RefreshStatus, minutes: u32, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            // Clear screen
            print!("\x1b[2J\x1b[H");
            stdout().flush()?;

            let now = chrono::Local::now();
            let cadence = if minutes == 0 {
                "manual".to_string()
            } else {
                format!("every {minutes}m")
            };
            println!(
                "TallyBar Watch Mode - {} (refresh: {})",
                now.format("%H:%M:%S"),
                cadence
            );
            println!("{}", "─".repeat(50));
            println!();

            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_status(status, Utc::now()));
            println!();
            println!("Press Ctrl+C to exit");
        }
        OutputFormat::Json => {
            // One document per line
            let formatter = JsonFormatter::new(false);
            println!("{}", formatter.format(&StatusOutput::from_status(status))?);
        }
    }
    Ok(())
}
