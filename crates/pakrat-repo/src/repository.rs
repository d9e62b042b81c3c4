//! Repository facade tying the directory, index and tools together

use pakrat_core::error::PakratError;
use pakrat_core::types::PackageFilename;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::dispatch::{dispatch_obsolete, DispatchSummary, ObsoletePolicy};
use crate::index::{ensure_unlocked, read_index, IndexTools};
use crate::scan::{scan_parallel, ScanPolicy};
use crate::state::RepositoryState;
use crate::RepoResult;

/// A local repository: a directory of archives plus its index database
#[derive(Debug, Clone)]
pub struct Repository {
    db_path: PathBuf,
    root: PathBuf,
    tools: IndexTools,
    scan_policy: ScanPolicy,
}

/// Reconciled state plus the archives that could not be read
#[derive(Debug, Default)]
pub struct LoadedState {
    pub state: RepositoryState,
    pub scan_errors: Vec<PakratError>,
}

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Report the plan without touching anything
    pub dry_run: bool,
    pub obsolete: ObsoletePolicy,
    /// Restrict the update to these names; empty means every name
    pub only: Vec<String>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            obsolete: ObsoletePolicy::Delete,
            only: Vec::new(),
        }
    }
}

/// What an update did, or would do on a dry run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub indexed: Vec<PathBuf>,
    pub removed: Vec<String>,
    pub obsolete: Vec<PathBuf>,
    pub dispatch: DispatchSummary,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.removed.is_empty() && self.obsolete.is_empty()
    }
}

impl Repository {
    /// Open the repository whose index database lives at `db_path`
    pub fn open(db_path: impl Into<PathBuf>) -> RepoResult<Self> {
        let db_path = db_path.into();
        let root = match db_path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_path_buf(),
            None => {
                return Err(PakratError::ConfigValidation {
                    field: "repo".to_string(),
                    reason: format!("{} is not a database path", db_path.display()),
                })
            },
        };

        if !root.is_dir() {
            return Err(PakratError::ConfigValidation {
                field: "repo".to_string(),
                reason: format!("repository directory {} does not exist", root.display()),
            });
        }

        Ok(Self {
            db_path,
            root,
            tools: IndexTools::default(),
            scan_policy: ScanPolicy::default(),
        })
    }

    pub fn with_tools(mut self, tools: IndexTools) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_scan_policy(mut self, policy: ScanPolicy) -> Self {
        self.scan_policy = policy;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the directory and read the index into a reconciled state
    pub fn load_state(&self) -> RepoResult<LoadedState> {
        let outcome = scan_parallel(&self.root, self.scan_policy)?;
        let database = read_index(&self.db_path)?;

        Ok(LoadedState {
            state: RepositoryState::from_observations(outcome.packages, database)
                .with_unreadable(outcome.unreadable),
            scan_errors: outcome.errors,
        })
    }

    /// Bring the index in line with the directory: add pending archives,
    /// purge vanished names, then dispatch obsolete archives. Archives are
    /// only moved once both index commands succeeded.
    pub fn update(&self, state: &RepositoryState, options: &UpdateOptions) -> RepoResult<UpdateReport> {
        let selected = |name: &str| options.only.is_empty() || options.only.iter().any(|n| n == name);

        let mut report = UpdateReport::default();
        for meta in state.iter().filter(|meta| selected(meta.name())) {
            report
                .obsolete
                .extend(meta.obsolete().iter().filter_map(|p| p.path()).map(Path::to_path_buf));
        }
        report.indexed = state
            .pending_index_files()
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .and_then(PackageFilename::parse)
                    .map_or(true, |parsed| selected(&parsed.name))
            })
            .map(Path::to_path_buf)
            .collect();
        report.removed = state
            .pending_removals()
            .into_iter()
            .filter(|name| selected(name))
            .map(str::to_string)
            .collect();

        if options.dry_run || report.is_empty() {
            return Ok(report);
        }

        ensure_unlocked(&self.db_path)?;

        self.tools.add(&self.db_path, &report.indexed)?;
        self.tools.remove(&self.db_path, &report.removed)?;
        let obsolete: Vec<&Path> = report.obsolete.iter().map(PathBuf::as_path).collect();
        report.dispatch = dispatch_obsolete(&obsolete, &options.obsolete)?;

        info!(
            indexed = report.indexed.len(),
            removed = report.removed.len(),
            obsolete = report.obsolete.len(),
            "repository updated"
        );
        Ok(report)
    }

    /// Copy archives into the repository directory and index them.
    /// Returns the paths inside the repository.
    pub fn add_files(&self, files: &[PathBuf]) -> RepoResult<Vec<PathBuf>> {
        ensure_unlocked(&self.db_path)?;

        let mut added = Vec::with_capacity(files.len());
        for file in files {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .filter(|n| PackageFilename::is_package_file(n))
                .ok_or_else(|| PakratError::archive(file, "not a package archive name"))?;

            let dest = self.root.join(name);
            if !same_file(file, &dest) {
                fs::copy(file, &dest).map_err(|e| {
                    PakratError::io(format!("Failed to copy {} into repository", file.display()), e)
                })?;
                copy_signature(file, &dest)?;
            }
            added.push(dest);
        }

        self.tools.add(&self.db_path, &added)?;
        Ok(added)
    }

    /// Purge names from the index and dispatch all their archives
    pub fn remove_packages(
        &self,
        state: &RepositoryState,
        names: &[String],
        policy: &ObsoletePolicy,
    ) -> RepoResult<DispatchSummary> {
        ensure_unlocked(&self.db_path)?;

        let mut archives = Vec::new();
        let mut indexed = Vec::new();
        for name in names {
            match state.get(name) {
                Some(meta) => {
                    archives.extend(meta.files().iter().filter_map(|p| p.path()));
                    archives.extend(meta.unreadable().iter().map(PathBuf::as_path));
                    if meta.database().is_some() {
                        indexed.push(name.clone());
                    }
                },
                None => warn!(name = %name, "not in repository"),
            }
        }

        self.tools.remove(&self.db_path, &indexed)?;
        dispatch_obsolete(&archives, policy)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn copy_signature(file: &Path, dest: &Path) -> RepoResult<()> {
    let mut sig = file.as_os_str().to_owned();
    sig.push(".sig");
    let sig = PathBuf::from(sig);
    if !sig.is_file() {
        return Ok(());
    }

    let mut dest_sig = dest.as_os_str().to_owned();
    dest_sig.push(".sig");
    fs::copy(&sig, PathBuf::from(dest_sig))
        .map_err(|e| PakratError::io(format!("Failed to copy {}", sig.display()), e))?;
    Ok(())
}
