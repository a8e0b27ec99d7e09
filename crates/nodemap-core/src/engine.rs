//! Query execution: walks the store along a compiled query tree

use crate::instance::NodeInstance;
use crate::projection::Projection;
use crate::query::QueryTree;
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};

/// Execution statistics for one query run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryStats {
    pub roots: usize,
    pub nodes_projected: usize,
    pub edges_followed: usize,
    pub max_depth_reached: usize,
}

/// Projection engine
///
/// Holds no state: recursion follows the query tree, never the store graph,
/// so depth is bounded by the tree even when the data contains cycles.
pub struct QueryEngine;

impl QueryEngine {
    /// Project every instance of the tree's root type, in type-index order
    pub fn run(tree: &QueryTree, store: &GraphStore) -> Vec<Projection> {
        Self::run_with_stats(tree, store).0
    }

    pub fn run_with_stats(tree: &QueryTree, store: &GraphStore) -> (Vec<Projection>, QueryStats) {
        tracing::debug!(
            "Executing query: root={}, depth={}",
            tree.label,
            tree.depth()
        );

        let mut stats = QueryStats::default();
        let roots: Vec<Projection> = store
            .find_by_type(tree.label.as_str())
            .into_iter()
            .map(|instance| Self::project(tree, instance, store, 0, &mut stats))
            .collect();
        stats.roots = roots.len();

        tracing::debug!(
            "Query projected {} roots, {} nodes, followed {} edges",
            stats.roots,
            stats.nodes_projected,
            stats.edges_followed
        );
        (roots, stats)
    }

    fn project(
        node: &QueryTree,
        instance: &NodeInstance,
        store: &GraphStore,
        depth: usize,
        stats: &mut QueryStats,
    ) -> Projection {
        stats.nodes_projected += 1;
        stats.max_depth_reached = stats.max_depth_reached.max(depth);

        let mut projection = Projection::from_instance(node.label.clone(), instance);
        for child in &node.children {
            for handle in instance.get_links(child.label.as_str()) {
                let Some(linked) = store.resolve(*handle) else {
                    tracing::warn!(
                        "Skipping stale edge {} -[{}]-> {}",
                        instance.id(),
                        child.label,
                        handle
                    );
                    continue;
                };
                stats.edges_followed += 1;
                projection.push_child(Self::project(child, linked, store, depth + 1, stats));
            }
        }
        projection
    }
}
