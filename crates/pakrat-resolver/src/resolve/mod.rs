//! Registry dependency resolution
//!
//! Resolution is a breadth-first worklist over package names. Each round
//! sends every name on the frontier to the registry in one batched lookup,
//! registers the records that came back as graph nodes and then inspects
//! their runtime and build dependencies to fill the next frontier.

use std::collections::HashMap;
use std::time::Instant;

use indexmap::IndexSet;
use pakrat_core::error::PakratError;
use pakrat_core::types::{Dependency, Origin, Package, PackageSet, Version};
use pakrat_registry::RegistryQuery;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::graph::{DependencyGraph, PackageNode};
use crate::ResolverResult;

/// Where a dependency stops being expanded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Dependencies already installed on the system get no node at all
    pub skip_installed: bool,
    /// Requested names a mirror provides become leaves instead of being
    /// looked up in the registry
    pub truncate_at_mirror: bool,
}

/// Result of dependency resolution
#[derive(Debug)]
pub struct Resolution {
    /// Resolved dependency graph
    pub graph: DependencyGraph,
    /// Every node, dependencies before their dependents
    pub build_order: Vec<String>,
    /// Names neither the registry nor a mirror could provide
    pub unresolved: Vec<String>,
    /// Groups of packages that depend on each other
    pub cycles: Vec<Vec<String>>,
    /// Resolution time in milliseconds
    pub resolution_time_ms: u64,
}

impl Resolution {
    /// Nodes that have to be fetched from the registry, in build order
    pub fn remote_build_order(&self) -> Vec<&str> {
        self.build_order
            .iter()
            .map(String::as_str)
            .filter(|name| self.graph.is_remote(name))
            .collect()
    }
}

/// Dependency resolver over a registry
#[derive(Debug)]
pub struct Resolver<'a, R> {
    /// Registry used for every lookup
    registry: &'a R,
    /// Installed packages, consulted with `skip_installed`
    installed: PackageSet,
    /// Packages available from mirrors and sync repositories
    mirrors: PackageSet,
    cancel: CancellationToken,
}

impl<'a, R: RegistryQuery> Resolver<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self {
            registry,
            installed: PackageSet::new(),
            mirrors: PackageSet::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_installed(mut self, installed: PackageSet) -> Self {
        self.installed = installed;
        self
    }

    pub fn with_mirrors(mut self, mirrors: PackageSet) -> Self {
        self.mirrors = mirrors;
        self
    }

    /// Stop between registry rounds once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolve `roots` and everything they need to build.
    ///
    /// Registry transport failures and cancellation abort resolution. Names
    /// the registry does not know end up in [`Resolution::unresolved`].
    pub async fn resolve(
        &self,
        roots: &[String],
        options: ResolveOptions,
    ) -> ResolverResult<Resolution> {
        let start = Instant::now();
        let mut graph = DependencyGraph::new();
        let mut unresolved: IndexSet<String> = IndexSet::new();
        // dependency name -> dependents waiting for its node to exist
        let mut waiting: HashMap<String, Vec<String>> = HashMap::new();
        let mut frontier: IndexSet<String> = IndexSet::new();
        for root in roots {
            match self.mirrors.version(root) {
                Some(version) if options.truncate_at_mirror => {
                    graph.insert(self.mirror_leaf(root, version));
                },
                _ => {
                    frontier.insert(root.clone());
                },
            }
        }
        let mut round = 0usize;

        while !frontier.is_empty() {
            if self.cancel.is_cancelled() {
                return Err(PakratError::Cancelled);
            }
            round += 1;

            let query: Vec<String> = frontier
                .drain(..)
                .filter(|name| !graph.contains(name) && !unresolved.contains(name))
                .collect();
            if query.is_empty() {
                break;
            }
            debug!(round, names = query.len(), "querying registry");

            let info = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(PakratError::Cancelled),
                info = self.registry.info(&query) => info?,
            };

            for name in info.missing {
                // a requested name the registry lacks can still come from a mirror
                match self.mirrors.version(&name) {
                    Some(version) => {
                        graph.insert(self.mirror_leaf(&name, version));
                    },
                    None => {
                        unresolved.insert(name);
                    },
                }
            }

            let mut expanded = Vec::new();
            for package in info.packages {
                let name = package.name.clone();
                if graph.insert(PackageNode::remote(package)).1 {
                    expanded.push(name);
                }
            }

            let mut next = IndexSet::new();
            for name in &expanded {
                if let Some(dependents) = waiting.remove(name) {
                    for dependent in dependents {
                        link(&mut graph, &dependent, name);
                    }
                }

                let requirements = match graph.get(name) {
                    Some(node) => build_requirements(&node.package),
                    None => continue,
                };
                for dependency in requirements {
                    self.visit_dependency(
                        &mut graph,
                        name,
                        &dependency,
                        options,
                        &mut waiting,
                        &unresolved,
                        &mut next,
                    );
                }
            }
            frontier = next;
        }

        let build_order = graph.build_order(roots);
        let cycles = graph.detect_cycles();
        for cycle in &cycles {
            warn!(
                "dependency cycle: {}",
                DependencyGraph::format_cycle(cycle)
            );
        }

        let resolution_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            packages = graph.package_count(),
            unresolved = unresolved.len(),
            resolution_time_ms,
            "resolution finished"
        );

        Ok(Resolution {
            graph,
            build_order,
            unresolved: unresolved.into_iter().collect(),
            cycles,
            resolution_time_ms,
        })
    }

    fn mirror_leaf(&self, name: &str, version: &Version) -> PackageNode {
        PackageNode::leaf(Package::new(name, version.clone(), Origin::Unknown))
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_dependency(
        &self,
        graph: &mut DependencyGraph,
        dependent: &str,
        dependency: &Dependency,
        options: ResolveOptions,
        waiting: &mut HashMap<String, Vec<String>>,
        unresolved: &IndexSet<String>,
        next: &mut IndexSet<String>,
    ) {
        let name = dependency.name.as_str();
        if name == dependent {
            return;
        }

        if graph.contains(name) {
            link(graph, dependent, name);
            return;
        }

        if options.skip_installed {
            if let Some(version) = self.installed.version(name) {
                check_constraint(dependent, dependency, version, "installed");
                return;
            }
        }

        if let Some(version) = self.mirrors.version(name) {
            check_constraint(dependent, dependency, version, "mirror");
            graph.insert(self.mirror_leaf(name, version));
            link(graph, dependent, name);
            return;
        }

        if unresolved.contains(name) {
            return;
        }
        waiting
            .entry(name.to_string())
            .or_default()
            .push(dependent.to_string());
        next.insert(name.to_string());
    }
}

/// Runtime and build dependencies, one entry per name
fn build_requirements(package: &Package) -> Vec<Dependency> {
    let mut requirements: Vec<Dependency> = Vec::new();
    for spec in package.depends.iter().chain(package.make_depends.iter()) {
        let dependency = Dependency::parse(spec);
        if dependency.name.is_empty() || requirements.iter().any(|d| d.name == dependency.name) {
            continue;
        }
        requirements.push(dependency);
    }
    requirements
}

fn link(graph: &mut DependencyGraph, dependent: &str, dependency: &str) {
    if let Err(e) = graph.add_dependency(dependent, dependency) {
        debug!("skipping edge {} -> {}: {}", dependent, dependency, e);
    }
}

fn check_constraint(dependent: &str, dependency: &Dependency, version: &Version, source: &str) {
    if !dependency.satisfied_by(version) {
        warn!(
            "{} requires {}, but the {} version is {}",
            dependent, dependency, source, version
        );
    }
}
