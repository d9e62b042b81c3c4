//! `pakrat list` command implementation.

use pakrat_core::error::PakratResult;
use pakrat_repo::{MetaPackage, RepositoryState};

use super::CommandContext;

/// Execute the `pakrat list` command
pub async fn execute(versions: bool, pending: bool, ctx: &CommandContext) -> PakratResult<()> {
    let profile = ctx.profile().await?;
    let loaded = ctx.repository(&profile)?.load_state()?;

    for error in &loaded.scan_errors {
        ctx.output.warn(&error.to_string());
    }
    for line in listing(&loaded.state, versions, pending) {
        ctx.output.line(&line);
    }
    Ok(())
}

/// Package names, optionally with versions and limited to pending ones
pub fn listing(state: &RepositoryState, versions: bool, pending: bool) -> Vec<String> {
    state
        .iter()
        .filter(|meta| !pending || is_pending(meta))
        .map(|meta| match (versions, meta.current_version()) {
            (true, Some(version)) => format!("{} {}", meta.name(), version),
            _ => meta.name().to_string(),
        })
        .collect()
}

fn is_pending(meta: &MetaPackage) -> bool {
    meta.needs_indexing() || meta.has_pending_removal() || meta.has_obsolete()
}
