//! Local and sync pacman databases
//!
//! The local database lists installed packages; sync databases are the
//! snapshots of configured mirrors. Both are reduced to name/version sets.

use pakrat_core::error::PakratError;
use pakrat_core::types::PackageSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::index::{read_index, DescRecord};
use crate::RepoResult;

/// Default pacman database root
pub const DEFAULT_PACMAN_DB: &str = "/var/lib/pacman";

/// Read installed packages from `<dbpath>/local/*/desc`.
///
/// A missing local database is an empty set.
pub fn read_local_db(db_root: &Path) -> RepoResult<PackageSet> {
    let local = db_root.join("local");
    let mut installed = PackageSet::new();

    if !local.is_dir() {
        warn!(path = %local.display(), "no local package database");
        return Ok(installed);
    }

    for entry in WalkDir::new(&local).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            PakratError::io(format!("Failed to read {}", local.display()), e.into())
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let desc_path = entry.path().join("desc");
        let content = match fs::read_to_string(&desc_path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %desc_path.display(), error = %e, "skipping local entry");
                continue;
            },
        };

        let record = DescRecord::parse(&content);
        if let (Some(name), Some(version)) = (record.name(), record.version()) {
            installed.insert(name, version);
        }
    }

    debug!(count = installed.len(), "read local package database");
    Ok(installed)
}

/// Read the sync snapshots `<dbpath>/sync/<repo>.db` of the given repos.
///
/// When several repos provide a name, the first repo listed wins. A repo
/// without a snapshot is skipped with a warning.
pub fn read_sync_dbs(db_root: &Path, repos: &[String]) -> RepoResult<PackageSet> {
    let mut available = PackageSet::new();

    for repo in repos {
        let path = db_root.join("sync").join(format!("{}.db", repo));
        if !path.exists() {
            warn!(repo = %repo, path = %path.display(), "sync database not found");
            continue;
        }

        let set: PackageSet = read_index(&path)?.into_iter().collect();
        debug!(repo = %repo, count = set.len(), "read sync database");
        available.extend_missing(set);
    }

    Ok(available)
}
