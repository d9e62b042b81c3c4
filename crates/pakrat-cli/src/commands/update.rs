//! `pakrat update` command implementation.
//!
//! Dispatches obsolete archives, adds new archives to the index and purges
//! names without archives.

use pakrat_core::error::PakratResult;
use pakrat_repo::{ObsoletePolicy, UpdateOptions, UpdateReport};

use super::CommandContext;

/// Execute the `pakrat update` command
pub async fn execute(dry_run: bool, names: Vec<String>, ctx: &CommandContext) -> PakratResult<()> {
    let profile = ctx.profile().await?;
    let repo = ctx.repository(&profile)?;
    let loaded = repo.load_state()?;

    for error in &loaded.scan_errors {
        ctx.output.warn(&error.to_string());
    }
    for name in names.iter().filter(|name| loaded.state.get(name).is_none()) {
        ctx.output.warn(&format!("{} is not in the repository", name));
    }

    let options = UpdateOptions {
        dry_run,
        obsolete: ctx.obsolete_policy(&profile),
        only: names,
    };
    let report = repo.update(&loaded.state, &options)?;

    if report.is_empty() {
        ctx.output.success("Index is up to date");
        return Ok(());
    }

    for line in plan_lines(&report, &options.obsolete) {
        ctx.output.line(&line);
    }
    if dry_run {
        ctx.output.info("Dry run, nothing was changed");
    } else {
        ctx.output.success(&format!(
            "Indexed {}, removed {}, dispatched {} obsolete archive(s)",
            report.indexed.len(),
            report.removed.len(),
            report.obsolete.len()
        ));
    }
    Ok(())
}

/// Describe every action of an update, in the order it is applied
pub fn plan_lines(report: &UpdateReport, policy: &ObsoletePolicy) -> Vec<String> {
    let verb = match policy {
        ObsoletePolicy::Delete => "delete",
        ObsoletePolicy::Backup(_) => "backup",
    };

    let obsolete = report
        .obsolete
        .iter()
        .map(|path| format!("{} {}", verb, path.display()));
    let indexed = report
        .indexed
        .iter()
        .map(|path| format!("add {}", path.display()));
    let removed = report.removed.iter().map(|name| format!("remove {}", name));

    obsolete.chain(indexed).chain(removed).collect()
}
