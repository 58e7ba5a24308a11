//! Dependency resolution
//!
//! Orders the units of one evaluation so that every unit comes after the
//! units it needs from the same batch. Dependencies outside the batch are
//! ignored; a cycle inside it is fatal.

use std::collections::{BTreeSet, HashMap};

use crate::core::record::BuildUnit;
use crate::error::ResolverError;

/// Dependency graph over derivation paths
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Node ids in insertion order
    nodes: Vec<String>,
    /// Node id -> position in `nodes`
    index: HashMap<String, usize>,
    /// Declared dependencies per node, not yet restricted to the batch
    declared: Vec<Vec<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its declared dependencies
    ///
    /// Returns `false` (and changes nothing) if the node already exists.
    pub fn add_node<I, S>(&mut self, id: &str, dependencies: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.index.contains_key(id) {
            return false;
        }
        self.index.insert(id.to_string(), self.nodes.len());
        self.nodes.push(id.to_string());
        self.declared
            .push(dependencies.into_iter().map(Into::into).collect());
        true
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dependencies of each node that are themselves nodes, minus self-edges
    fn restricted(&self) -> Vec<BTreeSet<usize>> {
        self.declared
            .iter()
            .enumerate()
            .map(|(node, deps)| {
                deps.iter()
                    .filter_map(|d| self.index.get(d).copied())
                    .filter(|&d| d != node)
                    .collect()
            })
            .collect()
    }

    /// Kahn's algorithm; ready nodes are taken lowest insertion index first
    fn order(&self) -> Result<Vec<usize>, ResolverError> {
        let deps = self.restricted();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        let mut pending: Vec<usize> = deps.iter().map(BTreeSet::len).collect();

        for (node, node_deps) in deps.iter().enumerate() {
            for &dep in node_deps {
                dependents[dep].push(node);
            }
        }

        let mut ready: BTreeSet<usize> = (0..self.nodes.len())
            .filter(|&n| pending[n] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &dependent in &dependents[node] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < self.nodes.len() {
            return Err(ResolverError::CircularDependency {
                cycle: self.find_cycle(&deps, &pending),
            });
        }

        Ok(order)
    }

    /// Walk unsorted nodes until one repeats; every unsorted node has an
    /// unsorted dependency, so the walk always closes a loop.
    fn find_cycle(&self, deps: &[BTreeSet<usize>], pending: &[usize]) -> Vec<String> {
        let Some(start) = pending.iter().position(|&p| p > 0) else {
            return Vec::new();
        };

        let mut path: Vec<usize> = Vec::new();
        let mut positions: HashMap<usize, usize> = HashMap::new();
        let mut current = start;

        loop {
            if let Some(&pos) = positions.get(&current) {
                let mut cycle: Vec<String> =
                    path[pos..].iter().map(|&n| self.nodes[n].clone()).collect();
                cycle.push(self.nodes[current].clone());
                return cycle;
            }
            positions.insert(current, path.len());
            path.push(current);

            match deps[current].iter().find(|&&d| pending[d] > 0) {
                Some(&next) => current = next,
                None => return path.iter().map(|&n| self.nodes[n].clone()).collect(),
            }
        }
    }

    /// Compute topological sort (build order)
    ///
    /// Returns node ids in order such that dependencies come before dependents.
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolverError> {
        Ok(self
            .order()?
            .into_iter()
            .map(|n| self.nodes[n].clone())
            .collect())
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        self.order().is_err()
    }
}

/// Reorder units so that in-batch predecessors come first
///
/// Predecessors are the union of `neededBuilds` and `neededSubstitutes`.
/// A repeated derivation path keeps its first occurrence.
pub fn sort_by_closure(units: Vec<BuildUnit>) -> Result<Vec<BuildUnit>, ResolverError> {
    let mut graph = DependencyGraph::new();
    let mut kept: Vec<Option<BuildUnit>> = Vec::with_capacity(units.len());

    for unit in units {
        if graph.add_node(&unit.drv_path, unit.predecessors()) {
            kept.push(Some(unit));
        } else {
            tracing::warn!("Ignoring repeated derivation {}", unit.drv_path);
        }
    }

    let order = graph.order()?;
    tracing::debug!("Ordered {} units by closure", order.len());

    Ok(order
        .into_iter()
        .filter_map(|n| kept[n].take())
        .collect())
}
