//! Config command - manage username, allowance, poll interval, and token.

use std::io::BufRead;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use serde::Serialize;
use tallybar_store::credentials::load_token;
use tallybar_store::{ConfigStore, SnapshotStore};
use tracing::info;

use crate::commands::AppContext;
use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Set the GitHub login whose usage is tracked.
    SetUsername {
        /// GitHub login.
        username: String,
    },

    /// Set the monthly included premium-request allowance.
    SetAllowance {
        /// Included requests per month (e.g. 300 for Pro, 1500 for Pro+).
        allowance: i64,
    },

    /// Set the poll interval used by `watch`.
    SetInterval {
        /// Minutes between fetches; 0 disables polling.
        minutes: u32,
    },

    /// Store a token in the system keychain.
    SetToken {
        /// Token value. Read from stdin when omitted.
        token: Option<String>,
    },

    /// Remove the stored token.
    ClearToken,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<ExitCode> {
    let ctx = AppContext::load(cli).await?;

    match &args.action {
        ConfigAction::Show => show_config(&ctx, cli).await?,
        ConfigAction::SetUsername { username } => set_username(&ctx, username).await?,
        ConfigAction::SetAllowance { allowance } => set_allowance(&ctx, *allowance).await?,
        ConfigAction::SetInterval { minutes } => set_interval(&ctx, *minutes).await?,
        ConfigAction::SetToken { token } => set_token(&ctx, token.as_deref()).await?,
        ConfigAction::ClearToken => {
            let controller = ctx.controller(ctx.config.clone())?;
            controller.set_token(None).await?;
            info!("Token removed");
            println!("Token removed");
        }
    }

    Ok(ExitCode::Success)
}

#[derive(Serialize)]
struct ConfigOutput {
    username: String,
    included_allowance: i64,
    refresh_interval_minutes: u32,
    token_stored: bool,
    config_file: String,
    snapshot_file: String,
}

async fn show_config(ctx: &AppContext, cli: &Cli) -> Result<()> {
    let config = ctx.config.get().await;
    let output = ConfigOutput {
        token_stored: load_token(&*ctx.secrets).await.is_some(),
        username: config.username,
        included_allowance: config.included_allowance,
        refresh_interval_minutes: config.refresh_interval_minutes,
        config_file: ctx.config.path().display().to_string(),
        snapshot_file: ctx.snapshots.path().display().to_string(),
    };

    match cli.format {
        OutputFormat::Text => {
            println!("TallyBar Configuration");
            println!("{}", "─".repeat(40));
            println!();
            let username = if output.username.is_empty() {
                "(not set)"
            } else {
                output.username.as_str()
            };
            println!("Username:          {username}");
            println!("Included requests: {}", output.included_allowance);
            if output.refresh_interval_minutes == 0 {
                println!("Poll interval:     manual");
            } else {
                println!("Poll interval:     {}m", output.refresh_interval_minutes);
            }
            println!(
                "Token:             {}",
                if output.token_stored {
                    "stored in keychain"
                } else {
                    "(not set)"
                }
            );
            println!();
            println!("Config file:   {}", output.config_file);
            println!("Snapshot file: {}", output.snapshot_file);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(())
}

async fn set_username(ctx: &AppContext, username: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }

    let controller = ctx.controller(ctx.config.clone())?;
    controller.set_username(username).await?;

    println!("Username: {username}");
    Ok(())
}

async fn set_allowance(ctx: &AppContext, allowance: i64) -> Result<()> {
    if allowance < 0 {
        bail!("Allowance must not be negative");
    }

    let controller = ctx.controller(ctx.config.clone())?;
    controller.set_allowance(allowance).await?;

    // The controller holds no snapshot here, so patch the cache file directly
    if let Some(cached) = ctx.snapshots.load().await {
        ctx.snapshots.save(&cached.with_allowance(allowance)).await?;
        info!(allowance, "Re-derived cached snapshot");
    }

    println!("Included requests: {allowance}");
    Ok(())
}

/// Written straight to the store: the controller variant would also kick off
/// a fetch.
async fn set_interval(ctx: &AppContext, minutes: u32) -> Result<()> {
    let mut config = ctx.config.get().await;
    config.refresh_interval_minutes = minutes;
    ctx.config.set(config).await?;

    if minutes == 0 {
        println!("Poll interval: manual");
    } else {
        println!("Poll interval: {minutes}m");
    }
    Ok(())
}

async fn set_token(ctx: &AppContext, token: Option<&str>) -> Result<()> {
    let token = match token {
        Some(token) => token.to_string(),
        None => {
            eprintln!("Paste token and press Enter:");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line
        }
    };

    let controller = ctx.controller(ctx.config.clone())?;
    controller.set_token(Some(token.as_str())).await?;
    info!(service = ctx.secrets.service(), "Token saved");
    println!("Token stored in keychain");
    Ok(())
}
