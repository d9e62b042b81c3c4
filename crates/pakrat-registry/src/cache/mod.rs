//! Metadata caching with TTL support

use dashmap::DashMap;
use pakrat_core::types::Package;
use std::time::{Duration, SystemTime};

/// Default lifetime of a cached record
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cached registry record
    pub package: Package,
    /// When the entry was stored
    pub stored_at: SystemTime,
    /// Time-to-live duration
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create new cache entry with the default TTL
    pub fn new(package: Package) -> Self {
        Self::with_ttl(package, DEFAULT_TTL)
    }

    /// Create cache entry with custom TTL
    pub fn with_ttl(package: Package, ttl: Duration) -> Self {
        Self {
            package,
            stored_at: SystemTime::now(),
            ttl,
        }
    }

    /// Check if cache entry is still fresh
    pub fn is_fresh(&self) -> bool {
        match self.stored_at.elapsed() {
            Ok(elapsed) => elapsed < self.ttl,
            Err(_) => false, // Clock went backwards, consider stale
        }
    }
}

/// In-memory registry record cache.
///
/// Owned by a single client, so lookups made by the reconciliation step and
/// the resolver of one invocation are shared without any process-wide state.
/// Names the registry does not know are never cached.
#[derive(Debug)]
pub struct MetadataCache {
    cache: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl MetadataCache {
    /// Create new metadata cache with the default TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Get a cached record if fresh
    pub fn get(&self, name: &str) -> Option<Package> {
        let package = {
            let entry = self.cache.get(name)?;
            entry.is_fresh().then(|| entry.package.clone())
        };
        if package.is_none() {
            // Remove stale entry
            self.cache.remove(name);
        }
        package
    }

    /// Store a record under its own name
    pub fn insert(&self, package: Package) {
        let entry = CacheEntry::with_ttl(package, self.ttl);
        self.cache.insert(entry.package.name.clone(), entry);
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}
