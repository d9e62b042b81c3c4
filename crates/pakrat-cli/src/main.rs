//! # pakrat
//!
//! Local binary package repository manager.
//!
//! This is the main entry point for the pakrat CLI tool. It handles command
//! parsing, sets up logging and error handling, and dispatches to the
//! appropriate command handlers.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use pakrat_core::error::{PakratError, PakratResult};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Manage a local binary package repository
#[derive(Parser)]
#[command(name = "pakrat", version, about = "Manage a local binary package repository")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Anything that is not a known command
    #[arg(value_name = "COMMAND", hide = true)]
    pub unknown: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Repository index to use, e.g. /srv/repo/custom.db.tar.gz
    #[arg(short, long, global = true, value_name = "DB")]
    pub repo: Option<Utf8PathBuf>,

    /// Registry base URL
    #[arg(long, global = true, value_name = "URL")]
    pub registry_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show pending index updates, removals and obsolete archives
    Status {
        /// Also compare against the registry
        #[arg(long)]
        registry: bool,
    },
    /// List packages in the repository
    List {
        /// Show versions
        #[arg(long)]
        versions: bool,
        /// Only packages with pending index changes
        #[arg(long)]
        pending: bool,
    },
    /// Bring the index in line with the archives on disk
    Update {
        /// Show what would change without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Limit the update to these packages
        names: Vec<String>,
    },
    /// Copy archives into the repository and index them
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove packages from the index and the directory
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List packages with a newer registry version
    Upgrades,
    /// Resolve registry dependencies into a build order
    Depends {
        /// Resolve every package with a newer registry version
        #[arg(long)]
        upgrades: bool,
        /// Leave installed packages out
        #[arg(long)]
        skip_installed: bool,
        /// Requested packages available from mirrors are not expanded
        #[arg(long)]
        truncate_at_mirror: bool,
        /// Write the build order to a file, one name per line
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        names: Vec<String>,
    },
    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    debug!("Starting pakrat v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run_cli(cli) {
        eprintln!("{}", ErrorFormatter::new().format_error(&err));
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> PakratResult<()> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| PakratError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::from_cli(&cli)?;

        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupted, cancelling");
                cancel.cancel();
            }
        });

        match cli.command {
            Some(command) => commands::dispatch_command(command, &ctx).await,
            None => match cli.unknown {
                Some(unknown) => commands::unknown_command(&unknown, &ctx),
                None => commands::show_help(&ctx),
            },
        }
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pakrat={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("pakrat encountered an unexpected error: {}", panic_info);
        eprintln!("pakrat crashed! This is a bug.");
        eprintln!("Please report this at: {}/issues", env!("CARGO_PKG_REPOSITORY"));
        eprintln!("Error: {}", panic_info);
    }));
}
