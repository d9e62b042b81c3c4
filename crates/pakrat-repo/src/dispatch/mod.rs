//! Obsolete archive dispatch
//!
//! Obsolete archives are either deleted or moved to a backup directory. A
//! detached signature (`<archive>.sig`) always follows its archive.

use pakrat_core::error::PakratError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::RepoResult;

/// What to do with archives superseded by a newer build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObsoletePolicy {
    Delete,
    /// Move into this directory, creating it when needed
    Backup(PathBuf),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub deleted: usize,
    pub moved: usize,
    /// Moves that had to copy because rename failed (e.g. across filesystems)
    pub copied: usize,
}

/// Dispatch archives according to `policy`
pub fn dispatch_obsolete(paths: &[&Path], policy: &ObsoletePolicy) -> RepoResult<DispatchSummary> {
    let mut summary = DispatchSummary::default();

    if let ObsoletePolicy::Backup(dir) = policy {
        if !paths.is_empty() {
            fs::create_dir_all(dir).map_err(|e| {
                PakratError::io(format!("Failed to create backup directory {}", dir.display()), e)
            })?;
        }
    }

    for path in paths {
        for file in with_signature(path) {
            match policy {
                ObsoletePolicy::Delete => {
                    fs::remove_file(&file).map_err(|e| {
                        PakratError::io(format!("Failed to delete {}", file.display()), e)
                    })?;
                    summary.deleted += 1;
                },
                ObsoletePolicy::Backup(dir) => {
                    let copied = move_into(&file, dir)?;
                    if copied {
                        summary.copied += 1;
                    }
                    summary.moved += 1;
                },
            }
        }
    }

    info!(
        deleted = summary.deleted,
        moved = summary.moved,
        "dispatched obsolete archives"
    );
    Ok(summary)
}

/// The archive itself plus its signature when one exists
fn with_signature(path: &Path) -> Vec<PathBuf> {
    let mut files = vec![path.to_path_buf()];
    let mut sig = path.as_os_str().to_owned();
    sig.push(".sig");
    let sig = PathBuf::from(sig);
    if sig.is_file() {
        files.push(sig);
    }
    files
}

/// Move a file into `dir`, returns whether a copy fallback was needed
fn move_into(file: &Path, dir: &Path) -> RepoResult<bool> {
    let name = file
        .file_name()
        .ok_or_else(|| PakratError::io(format!("Not a file: {}", file.display()), io::ErrorKind::InvalidInput.into()))?;
    let dest = dir.join(name);

    match fs::rename(file, &dest) {
        Ok(()) => Ok(false),
        Err(rename_err) => {
            debug!(error = %rename_err, file = %file.display(), "rename failed, copying instead");
            fs::copy(file, &dest)
                .map_err(|e| PakratError::io(format!("Failed to copy {}", file.display()), e))?;
            fs::remove_file(file)
                .map_err(|e| PakratError::io(format!("Failed to remove {}", file.display()), e))?;
            Ok(true)
        },
    }
}
