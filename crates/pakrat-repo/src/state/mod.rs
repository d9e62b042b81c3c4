//! Reconciliation of archives, index and registry
//!
//! Every name seen in the repository directory or the compiled index gets one
//! [`MetaPackage`]. The predicates on it drive index updates and obsolete
//! archive dispatch; the registry record is only present after an explicit
//! [`RepositoryState::attach_registry`].

use pakrat_core::types::{Package, PackageFilename, Version};
use pakrat_registry::RegistryQuery;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::RepoResult;

/// Everything known about one package name
#[derive(Debug, Clone, PartialEq)]
pub struct MetaPackage {
    name: String,
    /// Archives, newest first
    files: Vec<Package>,
    database: Option<Package>,
    registry: Option<Package>,
    /// Archives on disk that could not be read
    unreadable: Vec<PathBuf>,
}

impl MetaPackage {
    fn new(name: String) -> Self {
        Self {
            name,
            files: Vec::new(),
            database: None,
            registry: None,
            unreadable: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Archive records sorted newest first
    pub fn files(&self) -> &[Package] {
        &self.files
    }

    /// The archive that should be in the index
    pub fn newest_file(&self) -> Option<&Package> {
        self.files.first()
    }

    /// Archives superseded by the newest one. Empty while an unreadable
    /// archive could be the real newest one.
    pub fn obsolete(&self) -> &[Package] {
        if self.has_unreadable() {
            return &[];
        }
        self.files.get(1..).unwrap_or(&[])
    }

    /// Archives of this name that failed to scan
    pub fn unreadable(&self) -> &[PathBuf] {
        &self.unreadable
    }

    pub fn has_unreadable(&self) -> bool {
        !self.unreadable.is_empty()
    }

    pub fn database(&self) -> Option<&Package> {
        self.database.as_ref()
    }

    pub fn registry(&self) -> Option<&Package> {
        self.registry.as_ref()
    }

    /// Version of the newest archive, else of the index entry
    pub fn current_version(&self) -> Option<&Version> {
        self.newest_file()
            .or(self.database.as_ref())
            .map(|pkg| &pkg.version)
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn has_obsolete(&self) -> bool {
        !self.obsolete().is_empty()
    }

    /// The index entry describes exactly the newest archive
    pub fn is_registered(&self) -> bool {
        match (&self.database, self.newest_file()) {
            (Some(db), Some(file)) => db.identity() == file.identity(),
            _ => false,
        }
    }

    /// The newest archive is not in the index yet, or the index lags behind
    pub fn has_pending_update(&self) -> bool {
        let Some(file) = self.newest_file() else {
            return false;
        };
        match &self.database {
            None => true,
            Some(db) => db.version.compare(&file.version) == Ordering::Less,
        }
    }

    /// Indexed but no archive left on disk
    pub fn has_pending_removal(&self) -> bool {
        self.database.is_some() && self.files.is_empty() && !self.has_unreadable()
    }

    /// The registry has a strictly newer version than the current one
    pub fn has_upstream_upgrade(&self) -> bool {
        match (&self.registry, self.current_version()) {
            (Some(registry), Some(current)) => registry.version.is_newer_than(current),
            _ => false,
        }
    }

    /// The index needs the newest archive added: pending update, or an entry
    /// that points at a different build of the same version. Never while an
    /// archive of the name is unreadable.
    pub fn needs_indexing(&self) -> bool {
        if self.has_unreadable() {
            return false;
        }
        self.has_pending_update() || (self.has_files() && self.database.is_some() && !self.is_registered())
    }
}

/// Reconciled view of a repository, one [`MetaPackage`] per name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryState {
    packages: BTreeMap<String, MetaPackage>,
}

impl RepositoryState {
    /// Build the state from archive records and index records.
    ///
    /// Archive sequences are sorted newest first with file name as the tie
    /// breaker, so the result does not depend on scan order.
    pub fn from_observations<F, D>(files: F, database: D) -> Self
    where
        F: IntoIterator<Item = Package>,
        D: IntoIterator<Item = Package>,
    {
        let mut packages: BTreeMap<String, MetaPackage> = BTreeMap::new();

        for file in files {
            packages
                .entry(file.name.clone())
                .or_insert_with(|| MetaPackage::new(file.name.clone()))
                .files
                .push(file);
        }

        for record in database {
            let meta = packages
                .entry(record.name.clone())
                .or_insert_with(|| MetaPackage::new(record.name.clone()));
            let keep_existing = meta
                .database
                .as_ref()
                .is_some_and(|existing| !record.version.is_newer_than(&existing.version));
            if keep_existing {
                warn!(name = %record.name, "duplicate index entry ignored");
            } else {
                meta.database = Some(record);
            }
        }

        for meta in packages.values_mut() {
            meta.files.sort_by(|a, b| {
                b.version
                    .total_cmp(&a.version)
                    .then_with(|| a.filename().cmp(&b.filename()))
            });
        }

        debug!(names = packages.len(), "reconciled repository state");
        Self { packages }
    }

    /// Hold every name that has an archive which failed to scan, so a
    /// corrupt archive is never mistaken for a missing one.
    ///
    /// Paths whose file name does not parse, or whose name is otherwise
    /// unknown, are ignored.
    pub fn with_unreadable(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        for path in paths {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(PackageFilename::parse)
                .map(|parsed| parsed.name);
            match name.and_then(|name| self.packages.get_mut(&name)) {
                Some(meta) => {
                    warn!(name = %meta.name, path = %path.display(), "holding package with unreadable archive");
                    meta.unreadable.push(path);
                },
                None => debug!(path = %path.display(), "unreadable archive of an untracked name"),
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&MetaPackage> {
        self.packages.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetaPackage> {
        self.packages.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Paths of the newest archives that must be (re)indexed
    pub fn pending_index_files(&self) -> Vec<&Path> {
        self.iter()
            .filter(|meta| meta.needs_indexing())
            .filter_map(|meta| meta.newest_file()?.path())
            .collect()
    }

    /// Names to purge from the index
    pub fn pending_removals(&self) -> Vec<&str> {
        self.iter()
            .filter(|meta| meta.has_pending_removal())
            .map(MetaPackage::name)
            .collect()
    }

    /// Every superseded archive
    pub fn obsolete_files(&self) -> Vec<&Package> {
        self.iter().flat_map(|meta| meta.obsolete()).collect()
    }

    /// Names with a newer registry version
    pub fn upgradeable(&self) -> Vec<&str> {
        self.iter()
            .filter(|meta| meta.has_upstream_upgrade())
            .map(MetaPackage::name)
            .collect()
    }

    /// Attach registry records for every tracked name.
    ///
    /// Returns the names the registry does not know. Transport failures
    /// propagate.
    pub async fn attach_registry<R: RegistryQuery>(&mut self, registry: &R) -> RepoResult<Vec<String>> {
        let names: Vec<String> = self.packages.keys().cloned().collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let result = registry.info(&names).await?;
        self.attach_records(result.packages);
        Ok(result.missing)
    }

    /// Attach already fetched registry records; unknown names are ignored
    pub fn attach_records(&mut self, records: impl IntoIterator<Item = Package>) {
        for record in records {
            if let Some(meta) = self.packages.get_mut(&record.name) {
                meta.registry = Some(record);
            }
        }
    }
}
