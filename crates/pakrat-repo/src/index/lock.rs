//! Advisory lock marker of an index database

use pakrat_core::error::PakratError;
use std::path::{Path, PathBuf};

use crate::RepoResult;

/// Path of the lock marker that index tools create next to the database:
/// `custom.db.tar.gz` is locked by `custom.db.lck`.
pub fn lock_path(db_path: &Path) -> PathBuf {
    let file_name = db_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let prefix = match file_name.find(".db") {
        Some(end) => &file_name[..end],
        None => file_name.as_str(),
    };

    db_path.with_file_name(format!("{}.db.lck", prefix))
}

/// Fail fast when another process holds the index lock
pub fn ensure_unlocked(db_path: &Path) -> RepoResult<()> {
    let lock = lock_path(db_path);
    if lock.exists() {
        return Err(PakratError::IndexLocked { path: lock });
    }
    Ok(())
}
