//! Repository directory scanning
//!
//! [`scan_directory`] is a lazy sequence of per-archive results. What happens
//! to a corrupt archive is decided by folding the sequence with a
//! [`ScanPolicy`], not by the scanner.

use pakrat_core::error::PakratError;
use pakrat_core::types::{Package, PackageFilename};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::archive::read_pkginfo;
use crate::RepoResult;

/// How per-archive errors affect a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPolicy {
    /// Keep going and return the errors next to the packages
    #[default]
    CollectErrors,
    /// Keep going, log each error and drop it
    LogAndSkip,
    /// Stop at the first error and return it
    AbortOnFirst,
}

/// Packages read by a scan plus the errors kept by the policy
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub packages: Vec<Package>,
    pub errors: Vec<PakratError>,
    /// Archives that failed to read, whatever the policy did with the error
    pub unreadable: Vec<PathBuf>,
}

impl ScanPolicy {
    /// Fold a result sequence according to this policy
    pub fn fold<I>(self, results: I) -> RepoResult<ScanOutcome>
    where
        I: IntoIterator<Item = RepoResult<Package>>,
    {
        let mut outcome = ScanOutcome::default();
        for result in results {
            match (result, self) {
                (Ok(package), _) => outcome.packages.push(package),
                (Err(error), ScanPolicy::AbortOnFirst) => return Err(error),
                (Err(error), ScanPolicy::LogAndSkip) => warn!("skipping archive: {}", error),
                (Err(error), ScanPolicy::CollectErrors) => outcome.errors.push(error),
            }
        }
        Ok(outcome)
    }
}

/// Lazy scan over the package archives of one directory
pub struct PackageScan {
    entries: walkdir::IntoIter,
}

/// Scan `dir` (not recursively) for package archives
pub fn scan_directory(dir: &Path) -> PackageScan {
    PackageScan {
        entries: WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter(),
    }
}

impl PackageScan {
    /// Next archive path, skipping everything that is not a package
    fn next_path(&mut self) -> Option<RepoResult<PathBuf>> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let message = match e.path() {
                        Some(path) => format!("Failed to read {}", path.display()),
                        None => "Failed to read repository directory".to_string(),
                    };
                    return Some(Err(PakratError::io(message, e.into())));
                },
            };

            // Symlinked archives are followed by the archive reader
            if entry.file_type().is_dir() {
                continue;
            }
            let is_package = entry
                .file_name()
                .to_str()
                .map(PackageFilename::is_package_file)
                .unwrap_or(false);
            if is_package {
                return Some(Ok(entry.into_path()));
            }
        }
        None
    }

    /// Collect the archive paths without reading them
    pub fn paths(mut self) -> Vec<RepoResult<PathBuf>> {
        std::iter::from_fn(|| self.next_path()).collect()
    }
}

impl Iterator for PackageScan {
    type Item = RepoResult<Package>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_path()?.and_then(|path| read_pkginfo(&path)))
    }
}

/// Scan `dir` reading archives on the rayon pool. Results keep directory
/// order, so the outcome matches a sequential scan.
pub fn scan_parallel(dir: &Path, policy: ScanPolicy) -> RepoResult<ScanOutcome> {
    let results: Vec<(Option<PathBuf>, RepoResult<Package>)> = scan_directory(dir)
        .paths()
        .into_par_iter()
        .map(|path| match path {
            Ok(path) => {
                let result = read_pkginfo(&path);
                (Some(path), result)
            },
            Err(e) => (None, Err(e)),
        })
        .collect();

    let unreadable: Vec<PathBuf> = results
        .iter()
        .filter(|(_, result)| result.is_err())
        .filter_map(|(path, _)| path.clone())
        .collect();

    let mut outcome = policy.fold(results.into_iter().map(|(_, result)| result))?;
    outcome.unreadable = unreadable;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_zst;
    use std::fs;
    use tempfile::tempdir;

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        write_zst(dir.path(), "foo", "1.0-1", &[]);
        write_zst(dir.path(), "foo", "2.0-1", &[]);
        write_zst(dir.path(), "bar", "0.1-1", &["foo"]);
        fs::write(dir.path().join("bar-0.1-1-any.pkg.tar.zst.sig"), b"sig").unwrap();
        fs::write(dir.path().join("custom.db.tar.gz"), b"db").unwrap();
        fs::write(dir.path().join("broken-1.0-1-any.pkg.tar.zst"), b"not an archive").unwrap();
        fs::create_dir(dir.path().join("subdir-1.0-1-any.pkg.tar.zst")).unwrap();
        dir
    }

    #[test]
    fn test_scan_is_lazy_and_filtered() {
        let dir = fixture();
        let results: Vec<_> = scan_directory(dir.path()).collect();

        // bar, broken, foo 1.0, foo 2.0 in file name order
        assert_eq!(results.len(), 4);
        assert!(results[1].is_err());
        let names: Vec<_> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|p| (p.name.as_str(), p.version.as_str()))
            .collect();
        assert_eq!(names, vec![("bar", "0.1-1"), ("foo", "1.0-1"), ("foo", "2.0-1")]);
    }

    #[test]
    fn test_policies() {
        let dir = fixture();

        let collected = ScanPolicy::CollectErrors.fold(scan_directory(dir.path())).unwrap();
        assert_eq!(collected.packages.len(), 3);
        assert_eq!(collected.errors.len(), 1);

        let skipped = ScanPolicy::LogAndSkip.fold(scan_directory(dir.path())).unwrap();
        assert_eq!(skipped.packages.len(), 3);
        assert!(skipped.errors.is_empty());

        let aborted = ScanPolicy::AbortOnFirst.fold(scan_directory(dir.path()));
        assert!(matches!(aborted, Err(PakratError::Archive { .. })));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = fixture();

        let sequential = ScanPolicy::CollectErrors.fold(scan_directory(dir.path())).unwrap();
        let parallel = scan_parallel(dir.path(), ScanPolicy::CollectErrors).unwrap();

        assert_eq!(sequential.packages, parallel.packages);
        assert_eq!(sequential.errors.len(), parallel.errors.len());
    }

    #[test]
    fn test_parallel_records_unreadable_archives() {
        let dir = fixture();
        let broken = dir.path().join("broken-1.0-1-any.pkg.tar.zst");

        let collected = scan_parallel(dir.path(), ScanPolicy::CollectErrors).unwrap();
        assert_eq!(collected.unreadable, vec![broken.clone()]);

        let skipped = scan_parallel(dir.path(), ScanPolicy::LogAndSkip).unwrap();
        assert!(skipped.errors.is_empty());
        assert_eq!(skipped.unreadable, vec![broken]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let outcome = ScanPolicy::CollectErrors.fold(scan_directory(&missing)).unwrap();
        assert!(outcome.packages.is_empty());
        assert_eq!(outcome.errors.len(), 1);
    }
}
