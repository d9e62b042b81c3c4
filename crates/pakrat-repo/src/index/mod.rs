//! Compiled repository index
//!
//! The index is a compressed tarball holding one directory per package, each
//! with a `desc` file (and, in older databases, a separate `depends` file).

use indexmap::IndexMap;
use pakrat_core::error::PakratError;
use pakrat_core::types::{Origin, Package};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::archive::open_archive;
use crate::RepoResult;

pub mod desc;
pub mod lock;
pub mod tools;

pub use desc::DescRecord;
pub use lock::{ensure_unlocked, lock_path};
pub use tools::IndexTools;

/// Read every entry of an index database.
///
/// A database that does not exist yet is an empty index.
pub fn read_index(db_path: &Path) -> RepoResult<Vec<Package>> {
    if !db_path.exists() {
        debug!(db = %db_path.display(), "index does not exist yet");
        return Ok(Vec::new());
    }

    let mut records: IndexMap<String, DescRecord> = IndexMap::new();
    let mut archive = open_archive(db_path)?;
    let entries = archive
        .entries()
        .map_err(|e| PakratError::archive(db_path, format!("Failed to read index: {}", e)))?;

    for entry in entries {
        let mut entry = entry
            .map_err(|e| PakratError::archive(db_path, format!("Failed to read entry: {}", e)))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| PakratError::archive(db_path, format!("Bad entry path: {}", e)))?
            .into_owned();
        let mut components = path.iter();
        let (Some(dir), Some(file), None) = (components.next(), components.next(), components.next())
        else {
            continue;
        };
        if file != "desc" && file != "depends" {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| PakratError::archive(db_path, format!("Failed to read {}: {}", path.display(), e)))?;

        records
            .entry(dir.to_string_lossy().into_owned())
            .or_default()
            .merge(&content);
    }

    let mut packages = Vec::with_capacity(records.len());
    for (dir, record) in records {
        let filename = record.value("FILENAME").unwrap_or_default().to_string();
        let package = record
            .into_package(Origin::Database { filename })
            .ok_or_else(|| PakratError::archive(db_path, format!("entry {} lacks NAME or VERSION", dir)))?;
        packages.push(package);
    }

    debug!(db = %db_path.display(), entries = packages.len(), "read index");
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Compression;
    use crate::testutil::{compress, desc, tar_bytes, write_index};
    use tempfile::tempdir;

    #[test]
    fn test_missing_index_is_empty() {
        let dir = tempdir().unwrap();
        let packages = read_index(&dir.path().join("custom.db.tar.gz")).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_read_index_entries() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("custom.db.tar.gz");
        write_index(
            &db,
            &[
                ("foo", "1.0-1", "foo-1.0-1-any.pkg.tar.zst"),
                ("bar", "2:0.5-3", "bar-2:0.5-3-x86_64.pkg.tar.xz"),
            ],
        );

        let packages = read_index(&db).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "foo");
        assert_eq!(packages[0].filename(), Some("foo-1.0-1-any.pkg.tar.zst"));
        assert_eq!(packages[1].version.as_str(), "2:0.5-3");
        assert!(matches!(packages[1].origin, Origin::Database { .. }));
    }

    #[test]
    fn test_separate_depends_file() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("legacy.db");
        let tar = tar_bytes(&[
            (
                "foo-1.0-1/desc".to_string(),
                desc("foo", "1.0-1", "foo-1.0-1-any.pkg.tar.xz"),
            ),
            (
                "foo-1.0-1/depends".to_string(),
                "%DEPENDS%\nglibc\n\n".to_string(),
            ),
            ("foo-1.0-1/files".to_string(), "%FILES%\nusr/\n".to_string()),
        ]);
        std::fs::write(&db, compress(tar, Compression::Zstd)).unwrap();

        let packages = read_index(&db).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].depends, vec!["glibc"]);
    }

    #[test]
    fn test_entry_without_name_is_error() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("broken.db");
        let tar = tar_bytes(&[("foo-1.0-1/desc".to_string(), "%VERSION%\n1.0-1\n".to_string())]);
        std::fs::write(&db, compress(tar, Compression::None)).unwrap();

        assert!(matches!(read_index(&db), Err(PakratError::Archive { .. })));
    }
}
