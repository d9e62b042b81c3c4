//! `pakrat add` command implementation.
//!
//! Copies archives into the repository directory and adds them to the index.

use std::path::PathBuf;

use pakrat_core::error::PakratResult;

use super::CommandContext;

/// Execute the `pakrat add` command
pub async fn execute(files: Vec<PathBuf>, ctx: &CommandContext) -> PakratResult<()> {
    let profile = ctx.profile().await?;
    let repo = ctx.repository(&profile)?;

    // Relative paths are taken from the working directory
    let files: Vec<PathBuf> = files.into_iter().map(|file| ctx.cwd.join(file)).collect();
    let added = repo.add_files(&files)?;

    for path in &added {
        ctx.output.line(&format!("add {}", path.display()));
    }
    ctx.output.success(&format!(
        "Added {} package(s) to {}",
        added.len(),
        repo.db_path().display()
    ));
    Ok(())
}
