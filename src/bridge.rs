//! Bridge detection by edge removal.
//!
//! Each test recomputes all-pairs distances on a copy of the graph, so
//! checking every edge of an `n`-vertex graph costs `O(n^4)`.

use crate::distance::distance_matrix;
use crate::graph::Graph;

/// Returns `true` if removing the edge `(u, v)` disconnects `u` from `v`.
///
/// A non-edge is never a bridge.
pub fn is_bridge(graph: &Graph, u: usize, v: usize) -> bool {
    if !graph.has_edge(u, v) {
        return false;
    }
    let without = graph.without_edge(u, v);
    let dist = distance_matrix(&without);
    dist.get(u, v) as usize > graph.order()
}

/// Counts the bridges of `graph`.
pub fn count_bridges(graph: &Graph) -> usize {
    graph.edges().filter(|&(u, v)| is_bridge(graph, u, v)).count()
}

// ============================================================================
// Tests
// ============================================================================
