//! Configuration for pakrat
//!
//! This crate parses and validates the pakrat config file, picks the active
//! profile and layers environment and command-line overrides on top of it.

pub mod merge;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource, Overrides, ResolvedProfile};
pub use toml::{PakratToml, ProfileSection, RegistrySection};

use pakrat_core::error::PakratError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, PakratError>;
