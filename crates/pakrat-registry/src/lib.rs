//! Package registry client for pakrat
//!
//! This crate provides the HTTP client used to look up package metadata in the
//! remote registry. Lookups are batched, retried with exponential backoff and
//! cached for the lifetime of one client.

pub mod api;
pub mod cache;
pub mod client;

// Re-export main types
pub use api::{RegistryPackage, RpcResponse};
pub use cache::{CacheEntry, MetadataCache};
pub use client::{
    ClientConfig, InfoResult, RegistryClient, RegistryQuery, RetryConfig,
    DEFAULT_MAX_NAMES_PER_REQUEST, DEFAULT_REGISTRY_URL,
};

use pakrat_core::error::PakratError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, PakratError>;
