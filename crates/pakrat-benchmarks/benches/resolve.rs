//! Dependency resolution performance benchmarks
//!
//! Resolves layered dependency trees against an in-memory registry and
//! measures build ordering and cycle detection on prebuilt graphs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pakrat_benchmarks::{criterion_config, layered_packages, MemoryRegistry};
use pakrat_core::types::{Origin, Package};
use pakrat_resolver::{DependencyGraph, PackageNode, ResolveOptions, Resolver};
use tokio::runtime::Runtime;

/// Benchmark full resolution for different tree sizes
fn bench_dependency_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency_resolution");
    group.measurement_time(std::time::Duration::from_secs(10));
    group.sample_size(20);

    let runtime = Runtime::new().unwrap();
    for tree_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*tree_size as u64));
        let registry = MemoryRegistry::new(layered_packages(*tree_size, 3));
        let roots = vec!["package-0".to_string()];

        group.bench_with_input(BenchmarkId::new("packages", tree_size), &roots, |b, roots| {
            b.iter(|| {
                let resolver = Resolver::new(&registry);
                black_box(
                    runtime
                        .block_on(resolver.resolve(roots, ResolveOptions::default()))
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

/// Benchmark concurrent resolvers sharing one registry
fn bench_parallel_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_resolution");
    group.measurement_time(std::time::Duration::from_secs(10));

    let registry = MemoryRegistry::new(layered_packages(200, 3));
    for concurrency in [1, 2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("concurrent_resolvers", concurrency),
            concurrency,
            |b, &concurrency| {
                b.iter(|| {
                    use rayon::prelude::*;

                    let results: Vec<_> = (0..concurrency)
                        .into_par_iter()
                        .map(|i| {
                            let runtime = tokio::runtime::Builder::new_current_thread()
                                .build()
                                .unwrap();
                            let roots = vec![format!("package-{}", i)];
                            runtime
                                .block_on(Resolver::new(&registry).resolve(&roots, ResolveOptions::default()))
                                .map(|resolution| resolution.build_order.len())
                        })
                        .collect();

                    black_box(results)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark build ordering and cycle detection on a prebuilt graph
fn bench_graph_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_ordering");

    for package_count in [100, 1000, 5000].iter() {
        group.throughput(Throughput::Elements(*package_count as u64));
        let graph = create_graph(*package_count);

        group.bench_with_input(BenchmarkId::new("build_order", package_count), &graph, |b, graph| {
            b.iter(|| black_box(graph.build_order(&[])))
        });
        group.bench_with_input(BenchmarkId::new("detect_cycles", package_count), &graph, |b, graph| {
            b.iter(|| black_box(graph.detect_cycles()))
        });
    }

    group.finish();
}

fn create_graph(package_count: usize) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for i in 0..package_count {
        graph.insert(PackageNode::remote(Package::new(
            format!("package-{}", i),
            "1.0-1",
            Origin::Unknown,
        )));
    }
    for i in 0..package_count {
        for dep in [2 * i + 1, 2 * i + 2] {
            if dep < package_count {
                let _ = graph.add_dependency(&format!("package-{}", i), &format!("package-{}", dep));
            }
        }
    }
    // A back edge every hundred packages keeps cycle detection honest
    for i in (100..package_count).step_by(100) {
        let _ = graph.add_dependency(&format!("package-{}", i), &format!("package-{}", i / 2));
    }
    graph
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_dependency_resolution, bench_parallel_resolution, bench_graph_ordering
}
criterion_main!(benches);
