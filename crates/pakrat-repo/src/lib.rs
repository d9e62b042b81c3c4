//! Local repository handling for pakrat
//!
//! This crate owns everything that touches the repository on disk: package
//! archives, the compiled index and its lock, the local and sync pacman
//! databases, and the reconciliation of those observations into pending
//! actions.

pub mod archive;
pub mod dispatch;
pub mod index;
pub mod repository;
pub mod scan;
pub mod state;
pub mod system;

// Re-export main types
pub use archive::{open_archive, read_pkginfo, Compression};
pub use dispatch::{dispatch_obsolete, DispatchSummary, ObsoletePolicy};
pub use index::{ensure_unlocked, lock_path, read_index, IndexTools};
pub use repository::{LoadedState, Repository, UpdateOptions, UpdateReport};
pub use scan::{scan_directory, scan_parallel, PackageScan, ScanOutcome, ScanPolicy};
pub use state::{MetaPackage, RepositoryState};
pub use system::{read_local_db, read_sync_dbs, DEFAULT_PACMAN_DB};

use pakrat_core::error::PakratError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, PakratError>;

#[cfg(test)]
pub(crate) mod testutil;
