//! Core data types for pakrat.
//!
//! This module provides the fundamental types shared by every pakrat crate:
//! - Version ordering and the `Version` newtype
//! - Package records tagged with their origin
//! - Dependency declarations and archive file names

pub mod dependency;
pub mod filename;
pub mod package;
pub mod set;
pub mod version;

// Re-export all public types
pub use dependency::{dependency_name, Constraint, Dependency, DependencyKind, Op};
pub use filename::PackageFilename;
pub use package::{Origin, Package, PackageIdentity, RegistryMeta};
pub use set::PackageSet;
pub use version::{vercmp, vercmp_total, Version, VersionParts};
