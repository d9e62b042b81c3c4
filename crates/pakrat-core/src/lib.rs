//! # pakrat-core
//!
//! Core types shared across all pakrat crates.
//!
//! This crate provides:
//! - `vercmp` and the `Version` type implementing package version ordering
//! - `Package` records with an `Origin` tag, plus dependency parsing
//! - `PakratError` enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Package, Dependency, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{PakratError, PakratResult};
pub use types::{
    dependency_name, vercmp, Dependency, DependencyKind, Origin, Package, PackageFilename,
    PackageSet, RegistryMeta, Version,
};
