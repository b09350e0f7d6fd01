// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `TallyBar` CLI - GitHub Copilot premium-request usage from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Fetch and show this month's usage
//! tallybar
//!
//! # Show the last cached snapshot without touching the network
//! tallybar usage --cached
//!
//! # JSON output
//! tallybar --format json --pretty
//!
//! # Keep polling and redraw on every change
//! tallybar watch --interval 5
//!
//! # First-time setup
//! tallybar config set-username octocat
//! tallybar config set-token
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tallybar_core::ErrorKind;
use tallybar_providers::ProviderRegistry;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{cache, config, usage, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// `TallyBar` CLI - GitHub Copilot premium-request usage.
#[derive(Parser)]
#[command(name = "tallybar")]
#[command(about = "GitHub Copilot premium-request usage tracker")]
#[command(long_about = r#"
TallyBar tracks GitHub Copilot premium requests for the current billing
month: how much of the included allowance is used, what has been billed
beyond it, and when the counter resets (00:00 UTC on the 1st).

Setup:
  tallybar config set-username <login>
  tallybar config set-token            # fine-grained PAT with 'Plan (read)'

Examples:
  tallybar                       # Fetch and show usage
  tallybar usage --cached        # Last known snapshot, no network
  tallybar --format json         # JSON output
  tallybar watch                 # Poll and redraw until Ctrl+C
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Provider to query, by name or alias.
    #[arg(
        long,
        short = 'p',
        global = true,
        default_value_t = ProviderRegistry::default_provider().cli_name.to_string()
    )]
    pub provider: String,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch current usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Poll on the configured interval and redraw on every change.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage username, allowance, interval, and token.
    Config(config::ConfigArgs),

    /// Inspect or remove the cached snapshot.
    Cache(cache::CacheArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error, including unexpected HTTP statuses.
    Error = 1,
    /// Username or token missing.
    NotConfigured = 2,
    /// Response could not be parsed.
    ParseError = 3,
    /// Transport failure or timeout.
    Network = 4,
    /// Token rejected.
    Unauthorized = 5,
}

impl From<ErrorKind> for ExitCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotConfigured => Self::NotConfigured,
            ErrorKind::Unauthorized => Self::Unauthorized,
            ErrorKind::InvalidResponse(_) => Self::Error,
            ErrorKind::Network => Self::Network,
            ErrorKind::Decode => Self::ParseError,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("tallybar=debug,info")
    } else {
        EnvFilter::new("tallybar=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Usage(args)) => usage::run(args, &cli).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        Some(Commands::Cache(args)) => cache::run(args, &cli).await,
        None => usage::run(&usage::UsageArgs::default(), &cli).await,
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}
