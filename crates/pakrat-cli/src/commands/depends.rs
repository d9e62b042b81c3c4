//! `pakrat depends` command implementation.
//!
//! Resolves registry packages and everything they need to build into a
//! dependency-first build order. Packages that are installed or available
//! from a mirror are leaves and are not built.

use std::path::PathBuf;

use pakrat_core::error::{PakratError, PakratResult};
use pakrat_core::types::PackageSet;
use pakrat_repo::{read_local_db, read_sync_dbs};
use pakrat_resolver::{DependencyGraph, ResolveOptions, Resolution, Resolver};

use super::upgrades::upgradeable_names;
use super::CommandContext;

/// Arguments of `pakrat depends`
#[derive(Debug, Default)]
pub struct DependsArgs {
    pub upgrades: bool,
    pub skip_installed: bool,
    pub truncate_at_mirror: bool,
    pub output: Option<PathBuf>,
    pub names: Vec<String>,
}

/// Execute the `pakrat depends` command
pub async fn execute(args: DependsArgs, ctx: &CommandContext) -> PakratResult<()> {
    let profile = ctx.profile().await?;
    let client = ctx.registry(&profile)?;

    let mut roots = args.names.clone();
    if args.upgrades {
        let loaded = ctx.repository(&profile)?.load_state()?;
        for error in &loaded.scan_errors {
            ctx.output.warn(&error.to_string());
        }
        let mut state = loaded.state;
        state.attach_registry(&client).await?;
        for name in upgradeable_names(&state, &profile) {
            if !roots.iter().any(|root| root == name) {
                roots.push(name.to_string());
            }
        }
    }

    if roots.is_empty() {
        if args.upgrades {
            ctx.output.success("All packages are up to date");
            return Ok(());
        }
        return Err(PakratError::ConfigValidation {
            field: "names".to_string(),
            reason: "no package names given; pass names or --upgrades".to_string(),
        });
    }

    let options = ResolveOptions {
        skip_installed: args.skip_installed || profile.skip_installed,
        truncate_at_mirror: args.truncate_at_mirror || profile.truncate_at_mirror,
    };

    let pacman_db = ctx.pacman_db(&profile);
    let installed = if options.skip_installed {
        read_local_db(&pacman_db)?
    } else {
        PackageSet::new()
    };
    let mirrors = read_sync_dbs(&pacman_db, &profile.mirror_repos)?;

    let resolution = Resolver::new(&client)
        .with_installed(installed)
        .with_mirrors(mirrors)
        .with_cancellation(ctx.cancel.clone())
        .resolve(&roots, options)
        .await?;

    report(&resolution, ctx);

    let order = resolution.remote_build_order();
    for name in &order {
        ctx.output.line(name);
    }
    if let Some(path) = &args.output {
        let path = ctx.cwd.join(path);
        tokio::fs::write(&path, build_order_file(&order))
            .await
            .map_err(|e| PakratError::io(format!("Failed to write {}", path.display()), e))?;
        ctx.output.info(&format!("Build order written to {}", path.display()));
    }

    Ok(())
}

fn report(resolution: &Resolution, ctx: &CommandContext) {
    let leaves: Vec<&str> = resolution
        .build_order
        .iter()
        .map(String::as_str)
        .filter(|name| !resolution.graph.is_remote(name))
        .collect();
    if !leaves.is_empty() {
        ctx.output.info(&format!("Available from mirrors: {}", leaves.join(", ")));
    }

    for cycle in &resolution.cycles {
        ctx.output.warn(&format!(
            "dependency cycle, build order is a best guess: {}",
            DependencyGraph::format_cycle(cycle)
        ));
    }
    if !resolution.unresolved.is_empty() {
        ctx.output.warn(&format!(
            "unresolved dependencies: {}",
            resolution.unresolved.join(", ")
        ));
    }
}

/// One name per line
pub fn build_order_file(order: &[&str]) -> String {
    order.iter().map(|name| format!("{}\n", name)).collect()
}
