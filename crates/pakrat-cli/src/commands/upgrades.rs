//! `pakrat upgrades` command implementation.

use pakrat_config::ResolvedProfile;
use pakrat_core::error::PakratResult;
use pakrat_repo::RepositoryState;

use super::CommandContext;

/// Execute the `pakrat upgrades` command
pub async fn execute(ctx: &CommandContext) -> PakratResult<()> {
    let profile = ctx.profile().await?;
    let loaded = ctx.repository(&profile)?.load_state()?;
    for error in &loaded.scan_errors {
        ctx.output.warn(&error.to_string());
    }
    let mut state = loaded.state;

    let client = ctx.registry(&profile)?;
    let missing = state.attach_registry(&client).await?;

    let lines = upgrade_lines(&state, &profile);
    for line in &lines {
        ctx.output.line(line);
    }
    if !missing.is_empty() {
        ctx.output.info(&format!("Not in registry: {}", missing.join(", ")));
    }
    if lines.is_empty() {
        ctx.output.success("All packages are up to date");
    }
    Ok(())
}

/// Names with a newer registry version that are not ignored
pub fn upgradeable_names<'s>(state: &'s RepositoryState, profile: &ResolvedProfile) -> Vec<&'s str> {
    state
        .upgradeable()
        .into_iter()
        .filter(|name| !profile.ignores_upgrade(name))
        .collect()
}

/// `name current -> new` for every upgrade
pub fn upgrade_lines(state: &RepositoryState, profile: &ResolvedProfile) -> Vec<String> {
    upgradeable_names(state, profile)
        .into_iter()
        .filter_map(|name| {
            let meta = state.get(name)?;
            Some(format!(
                "{} {} -> {}",
                name,
                meta.current_version()?,
                meta.registry()?.version
            ))
        })
        .collect()
}
