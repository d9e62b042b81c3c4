//! Command implementations and dispatch logic.
//!
//! Each command is implemented as an async function that takes a
//! [`CommandContext`]. Configuration is loaded per command so that `version`
//! and `help` work without a config file.

use std::collections::HashMap;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use clap::CommandFactory;
use pakrat_config::{ConfigLayering, ConfigLoader, Overrides, ResolvedProfile};
use pakrat_core::error::{PakratError, PakratResult};
use pakrat_registry::{ClientConfig, RegistryClient};
use pakrat_repo::{IndexTools, ObsoletePolicy, Repository, DEFAULT_PACMAN_DB};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub mod add;
pub mod depends;
pub mod list;
pub mod remove;
pub mod status;
pub mod update;
pub mod upgrades;


use crate::{output::OutputHandler, Cli, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: PathBuf,
    pub output: OutputHandler,
    /// `--config`
    pub config_file: Option<Utf8PathBuf>,
    /// Command-line values layered over the config file
    pub overrides: Overrides,
    /// `PAKRAT_*` environment variables
    pub env: HashMap<String, String>,
    /// Index mutation commands, before profile parameters are applied
    pub tools: IndexTools,
    /// Cancelled on Ctrl-C
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Create a command context from parsed arguments
    pub fn from_cli(cli: &Cli) -> PakratResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| PakratError::io("Failed to get current directory".to_string(), e))?;

        // A relative --repo is taken from the working directory
        let repo = cli.repo.clone().map(|repo| match Utf8Path::from_path(&cwd) {
            Some(cwd) if repo.is_relative() => cwd.join(repo),
            _ => repo,
        });

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            config_file: cli.config.clone(),
            overrides: Overrides {
                profile: cli.profile.clone(),
                repo,
                registry_url: cli.registry_url.clone(),
            },
            env: ConfigLayering::collect_env_overrides(),
            tools: IndexTools::default(),
            cancel: CancellationToken::new(),
        })
    }

    /// Load the config file and layer environment and flags over it
    pub async fn profile(&self) -> PakratResult<ResolvedProfile> {
        let (config, source) = ConfigLoader::new()
            .with_env(self.env.clone())
            .with_config_file(self.config_file.clone())
            .load()
            .await?;
        debug!(?source, "configuration loaded");

        let profile = ConfigLayering::new(self.env.clone(), self.overrides.clone()).resolve(&config)?;
        debug!(profile = ?profile.name, repo = %profile.repo, "using repository");
        Ok(profile)
    }

    pub fn repository(&self, profile: &ResolvedProfile) -> PakratResult<Repository> {
        let tools = self
            .tools
            .clone()
            .with_params(profile.add_params.clone(), profile.rm_params.clone());
        Ok(Repository::open(profile.repo.as_std_path())?.with_tools(tools))
    }

    pub fn registry(&self, profile: &ResolvedProfile) -> PakratResult<RegistryClient> {
        let mut config = ClientConfig::default();
        if let Some(url) = &profile.registry_url {
            config = config.with_base_url(url.as_str());
        }
        if let Some(max) = profile.max_names_per_request {
            config.max_names_per_request = max;
        }
        if let Some(timeout) = profile.timeout {
            config.timeout = timeout;
        }
        RegistryClient::with_config(config)
    }

    /// Delete obsolete archives, or move them to the backup directory
    pub fn obsolete_policy(&self, profile: &ResolvedProfile) -> ObsoletePolicy {
        match &profile.backup_dir {
            Some(dir) => ObsoletePolicy::Backup(dir.clone().into_std_path_buf()),
            None => ObsoletePolicy::Delete,
        }
    }

    pub fn pacman_db(&self, profile: &ResolvedProfile) -> PathBuf {
        profile
            .pacman_db
            .clone()
            .map(Utf8PathBuf::into_std_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PACMAN_DB))
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> PakratResult<()> {
    match command {
        Commands::Status { registry } => {
            debug!("Showing repository status (registry: {})", registry);
            status::execute(registry, ctx).await
        },
        Commands::List { versions, pending } => list::execute(versions, pending, ctx).await,
        Commands::Update { dry_run, names } => {
            info!("Updating repository index (dry_run: {})", dry_run);
            update::execute(dry_run, names, ctx).await
        },
        Commands::Add { files } => {
            info!("Adding {} archives", files.len());
            add::execute(files, ctx).await
        },
        Commands::Remove { names } => {
            info!("Removing packages: {}", names.join(", "));
            remove::execute(names, ctx).await
        },
        Commands::Upgrades => upgrades::execute(ctx).await,
        Commands::Depends {
            upgrades,
            skip_installed,
            truncate_at_mirror,
            output,
            names,
        } => {
            let args = depends::DependsArgs {
                upgrades,
                skip_installed,
                truncate_at_mirror,
                output,
                names,
            };
            depends::execute(args, ctx).await
        },
        Commands::Version => show_version(ctx),
    }
}

/// Report a word that is neither a command nor an option
pub fn unknown_command(input: &str, ctx: &CommandContext) -> PakratResult<()> {
    ctx.output.error(&format!("Unknown command '{}'", input));
    if let Some(suggestion) = suggest_similar_command(input) {
        ctx.output.info(&format!("Did you mean '{}'?", suggestion));
    }
    ctx.output.info("Run 'pakrat help' to see available commands.");
    Err(PakratError::ConfigValidation {
        field: "command".to_string(),
        reason: format!("Unknown command: {}", input),
    })
}

/// Show help information
pub fn show_help(ctx: &CommandContext) -> PakratResult<()> {
    ctx.output.line(&Cli::command().render_help().to_string());
    Ok(())
}

pub fn show_version(ctx: &CommandContext) -> PakratResult<()> {
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.line(&format!("pakrat v{}", env!("CARGO_PKG_VERSION")));
    ctx.output.line(&format!("Built: {}", env!("BUILD_DATE")));
    ctx.output.line(&format!("Target: {}", target));
    ctx.output.line(&format!("Rust: {}", env!("RUSTC_VERSION")));

    Ok(())
}

/// Suggest similar commands based on edit distance
pub fn suggest_similar_command(input: &str) -> Option<String> {
    let commands = [
        "status", "list", "update", "add", "remove", "upgrades", "depends", "version", "help",
    ];

    commands
        .iter()
        .map(|&command| (edit_distance(input, command), command))
        .filter(|&(distance, _)| distance <= 2)
        .min_by_key(|&(distance, _)| distance)
        .map(|(_, command)| command.to_string())
}

/// Levenshtein distance over chars
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, a_char) in a.chars().enumerate() {
        let mut current = vec![i + 1; b_chars.len() + 1];
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != *b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }

    previous[b_chars.len()]
}
