//! `pakrat remove` command implementation.

use pakrat_core::error::PakratResult;
use pakrat_repo::DispatchSummary;

use super::CommandContext;

/// Execute the `pakrat remove` command
pub async fn execute(names: Vec<String>, ctx: &CommandContext) -> PakratResult<()> {
    let profile = ctx.profile().await?;
    let repo = ctx.repository(&profile)?;
    let loaded = repo.load_state()?;
    for error in &loaded.scan_errors {
        ctx.output.warn(&error.to_string());
    }

    let policy = ctx.obsolete_policy(&profile);
    let summary = repo.remove_packages(&loaded.state, &names, &policy)?;

    ctx.output.success(&summary_line(&summary));
    Ok(())
}

/// `copied` counts moves that fell back to a copy, so it is part of `moved`
pub fn summary_line(summary: &DispatchSummary) -> String {
    format!(
        "Removed {} archive(s) ({} deleted, {} moved to backup)",
        summary.deleted + summary.moved,
        summary.deleted,
        summary.moved
    )
}
