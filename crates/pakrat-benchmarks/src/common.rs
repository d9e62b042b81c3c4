//! Common utilities for benchmarks

use criterion::Criterion;
use pakrat_core::types::{Origin, Package, RegistryMeta};
use pakrat_registry::{InfoResult, RegistryQuery, RegistryResult};
use pprof::criterion::{Output, PProfProfiler};
use std::collections::HashMap;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Registry served from memory, so resolution runs without network calls
pub struct MemoryRegistry {
    records: HashMap<String, Package>,
}

impl MemoryRegistry {
    pub fn new(records: impl IntoIterator<Item = Package>) -> Self {
        Self {
            records: records.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }
}

impl RegistryQuery for MemoryRegistry {
    async fn info(&self, names: &[String]) -> RegistryResult<InfoResult> {
        let mut result = InfoResult::default();
        for name in names {
            match self.records.get(name) {
                Some(pkg) => result.packages.push(pkg.clone()),
                None => result.missing.push(name.clone()),
            }
        }
        Ok(result)
    }
}

/// `count` registry records where package `i` depends on up to `fan_out`
/// packages with higher indices, giving a layered acyclic graph
pub fn layered_packages(count: usize, fan_out: usize) -> Vec<Package> {
    (0..count)
        .map(|i| {
            let depends: Vec<String> = (1..=fan_out)
                .map(|step| i * fan_out + step)
                .filter(|&dep| dep < count)
                .map(|dep| format!("package-{}>=1.0", dep))
                .collect();
            Package::new(
                format!("package-{}", i),
                format!("1.{}-1", i % 7),
                Origin::Registry(RegistryMeta::default()),
            )
            .with_depends(depends)
        })
        .collect()
}

/// Version strings covering epochs, alpha segments and pkgrels
pub fn version_strings(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 5 {
            0 => format!("{}.{}.{}-{}", i % 10, (i / 10) % 10, (i / 100) % 10, i % 3 + 1),
            1 => format!("{}:{}.{}-1", i % 3, i % 10, (i / 10) % 10),
            2 => format!("{}.{}rc{}-2", i % 10, (i / 10) % 10, i % 4),
            3 => format!("r{}.g{:07x}-1", i, i * 2654435761 % 0xfffffff),
            _ => format!("{}.{}alpha-1", i % 10, (i / 10) % 10),
        })
        .collect()
}
