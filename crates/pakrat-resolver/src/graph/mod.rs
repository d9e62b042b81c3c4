//! Dependency graph implementation using petgraph
//!
//! Nodes are addressed by package name through a concurrent index, edges
//! point from a dependent to its dependency. A node is registered before its
//! own dependencies are looked at, so an edge back to a name that is already
//! registered never triggers another expansion.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use petgraph::Direction;

use pakrat_core::types::Package;

/// Node in the dependency graph
#[derive(Debug, Clone, PartialEq)]
pub struct PackageNode {
    pub package: Package,
    /// Must be fetched and built from the registry. `false` for leaves that
    /// are satisfied through a mirror.
    pub remote: bool,
}

impl PackageNode {
    pub fn remote(package: Package) -> Self {
        Self {
            package,
            remote: true,
        }
    }

    pub fn leaf(package: Package) -> Self {
        Self {
            package,
            remote: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }
}

/// Dependency graph keyed by package name
#[derive(Debug)]
pub struct DependencyGraph {
    /// Underlying directed graph, dependent -> dependency
    graph: DiGraph<PackageNode, ()>,
    /// Map from package name to NodeIndex for fast lookups
    node_map: DashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: DashMap::new(),
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    /// Register a node. The first node registered under a name wins; later
    /// inserts return the existing index and `false`.
    pub fn insert(&mut self, node: PackageNode) -> (NodeIndex, bool) {
        match self.node_map.entry(node.package.name.clone()) {
            Entry::Occupied(existing) => (*existing.get(), false),
            Entry::Vacant(slot) => {
                let index = self.graph.add_node(node);
                slot.insert(index);
                (index, true)
            },
        }
    }

    /// Add dependency edge between two registered packages
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<(), String> {
        let from = self
            .index_of(dependent)
            .ok_or_else(|| format!("Package not found: {}", dependent))?;
        let to = self
            .index_of(dependency)
            .ok_or_else(|| format!("Package not found: {}", dependency))?;

        self.graph.update_edge(from, to, ());
        Ok(())
    }

    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.node_map.get(name).map(|index| *index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Get package node by name
    pub fn get(&self, name: &str) -> Option<&PackageNode> {
        self.graph.node_weight(self.index_of(name)?)
    }

    /// Check whether a name is registered as a registry node
    pub fn is_remote(&self, name: &str) -> bool {
        self.get(name).map_or(false, |node| node.remote)
    }

    /// Direct dependencies of a package, in the order edges were added
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        let Some(index) = self.index_of(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .map(|dep| self.graph[dep].name())
            .collect();
        // petgraph yields the most recent edge first
        names.reverse();
        names
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &PackageNode> {
        self.graph.node_weights()
    }

    /// Get number of packages in the graph
    pub fn package_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get number of dependencies in the graph
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes nothing else depends on
    pub fn build_roots(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .neighbors_directed(index, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    /// Dependency-first order of every node.
    ///
    /// Walks depth-first from each of `roots` (or from the nodes nothing
    /// depends on when none of `roots` is in the graph) and emits a node once
    /// all its dependencies are emitted. Nodes that are only reachable
    /// through a cycle are appended the same way. Under cycles the order is
    /// best effort; every node still appears exactly once.
    pub fn build_order(&self, roots: &[String]) -> Vec<String> {
        let mut starts: Vec<NodeIndex> = roots.iter().filter_map(|name| self.index_of(name)).collect();
        if starts.is_empty() {
            starts = self.build_roots();
        }

        let mut dfs = DfsPostOrder::empty(&self.graph);
        let mut order = Vec::with_capacity(self.graph.node_count());
        for start in starts.into_iter().chain(self.graph.node_indices()) {
            dfs.move_to(start);
            while let Some(index) = dfs.next(&self.graph) {
                order.push(self.graph[index].package.name.clone());
            }
        }
        order
    }

    /// Strongly connected groups of more than one package, names sorted
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut names: Vec<String> = component
                    .into_iter()
                    .map(|index| self.graph[index].package.name.clone())
                    .collect();
                names.sort();
                names
            })
            .collect()
    }

    /// Format cycle as "a -> b -> c -> a"
    pub fn format_cycle(cycle: &[String]) -> String {
        match cycle.first() {
            None => "No cycle".to_string(),
            Some(first) if cycle.len() > 1 => {
                let mut closed = cycle.to_vec();
                closed.push(first.clone());
                closed.join(" -> ")
            },
            Some(first) => first.clone(),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use pakrat_core::types::Origin;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn build_order_respects_acyclic_edges(
            num_packages in 2usize..10,
            edges in prop::collection::vec((0usize..10, 0usize..10), 0..25)
        ) {
            let mut graph = DependencyGraph::new();
            let names: Vec<String> = (0..num_packages).map(|i| format!("pkg{}", i)).collect();
            for name in &names {
                graph.insert(PackageNode::remote(Package::new(name.as_str(), "1", Origin::Unknown)));
            }

            // Only forward edges, so the graph stays acyclic
            let mut kept = Vec::new();
            for (from, to) in edges {
                if from < to && to < num_packages {
                    graph.add_dependency(&names[from], &names[to]).unwrap();
                    kept.push((from, to));
                }
            }

            let order = graph.build_order(&names[..1]);

            prop_assert_eq!(order.len(), num_packages);
            let unique: HashSet<_> = order.iter().collect();
            prop_assert_eq!(unique.len(), order.len());

            for (from, to) in kept {
                let dependent = order.iter().position(|n| *n == names[from]).unwrap();
                let dependency = order.iter().position(|n| *n == names[to]).unwrap();
                prop_assert!(dependency < dependent, "{} must precede {}", names[to], names[from]);
            }
            prop_assert!(graph.detect_cycles().is_empty());
        }

        #[test]
        fn build_order_terminates_under_cycles(
            num_packages in 2usize..8,
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..20)
        ) {
            let mut graph = DependencyGraph::new();
            let names: Vec<String> = (0..num_packages).map(|i| format!("pkg{}", i)).collect();
            for name in &names {
                graph.insert(PackageNode::remote(Package::new(name.as_str(), "1", Origin::Unknown)));
            }
            for (from, to) in edges {
                if from < num_packages && to < num_packages && from != to {
                    graph.add_dependency(&names[from], &names[to]).unwrap();
                }
            }

            let order = graph.build_order(&names);
            let unique: HashSet<_> = order.iter().collect();
            prop_assert_eq!(order.len(), num_packages);
            prop_assert_eq!(unique.len(), num_packages);
        }
    }
}
