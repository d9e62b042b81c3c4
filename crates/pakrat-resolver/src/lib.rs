//! Dependency resolution for pakrat
//!
//! Expands requested registry packages into the full graph of registry
//! packages that have to be built, stopping at packages that are already
//! installed or available from a mirror, and derives a dependency-first
//! build order from that graph.

pub mod graph;
pub mod resolve;

// Re-export main types
pub use graph::{DependencyGraph, PackageNode};
pub use resolve::{Resolution, ResolveOptions, Resolver};

use pakrat_core::error::PakratError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, PakratError>;
