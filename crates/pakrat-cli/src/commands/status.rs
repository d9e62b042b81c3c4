//! `pakrat status` command implementation.
//!
//! Reports everything that is out of line between the archives, the index
//! and, optionally, the registry.

use pakrat_config::ResolvedProfile;
use pakrat_core::error::PakratResult;
use pakrat_repo::{LoadedState, MetaPackage, RepositoryState};

use super::CommandContext;

/// Execute the `pakrat status` command
pub async fn execute(registry: bool, ctx: &CommandContext) -> PakratResult<()> {
    let profile = ctx.profile().await?;
    let repo = ctx.repository(&profile)?;
    let LoadedState {
        mut state,
        scan_errors,
    } = repo.load_state()?;

    for error in &scan_errors {
        ctx.output.warn(&error.to_string());
    }

    let mut missing = Vec::new();
    if registry {
        let client = ctx.registry(&profile)?;
        missing = state.attach_registry(&client).await?;
    }

    let lines = status_lines(&state, &profile);
    for line in &lines {
        ctx.output.line(line);
    }
    if !missing.is_empty() {
        ctx.output.info(&format!("Not in registry: {}", missing.join(", ")));
    }
    if lines.is_empty() {
        ctx.output.success(&format!(
            "{} packages in {}, nothing to do",
            state.len(),
            repo.db_path().display()
        ));
    }

    Ok(())
}

/// One line per pending action, grouped by package name
pub fn status_lines(state: &RepositoryState, profile: &ResolvedProfile) -> Vec<String> {
    state
        .iter()
        .flat_map(|meta| describe(meta, profile))
        .collect()
}

fn describe(meta: &MetaPackage, profile: &ResolvedProfile) -> Vec<String> {
    let name = meta.name();
    let mut lines = Vec::new();

    if meta.has_unreadable() {
        lines.push(format!(
            "{}: {} unreadable archive(s), left untouched",
            name,
            meta.unreadable().len()
        ));
    } else if let Some(file) = meta.newest_file() {
        match meta.database() {
            None => lines.push(format!("{}: {} is not indexed", name, file.version)),
            Some(db) if meta.has_pending_update() => lines.push(format!(
                "{}: index has {}, newest archive is {}",
                name, db.version, file.version
            )),
            Some(_) if meta.needs_indexing() => lines.push(format!(
                "{}: index entry does not match {}",
                name,
                file.filename().unwrap_or(name)
            )),
            Some(_) => {},
        }
    }

    if meta.has_pending_removal() {
        if let Some(db) = meta.database() {
            lines.push(format!("{}: {} is indexed but has no archive", name, db.version));
        }
    }

    if meta.has_obsolete() {
        lines.push(format!("{}: {} obsolete archive(s)", name, meta.obsolete().len()));
    }

    if meta.has_upstream_upgrade() && !profile.ignores_upgrade(name) {
        if let (Some(registry), Some(current)) = (meta.registry(), meta.current_version()) {
            lines.push(format!(
                "{}: registry has {} (current {})",
                name, registry.version, current
            ));
        }
    }

    lines
}
