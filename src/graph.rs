//! Simple undirected graphs on at most 64 vertices, stored as neighbor bitsets.

use std::fmt;

/// Largest order a [`Graph`] can hold: one `u64` row per vertex.
pub const MAX_ORDER: usize = 64;

/// Returns a mask with the lowest `n` bits set.
#[inline(always)]
pub const fn all_bits(n: usize) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

#[inline(always)]
pub(crate) const fn bit(v: usize) -> u64 {
    1u64 << v
}

/// Iterates over the indices of the set bits of `mask`, lowest first.
#[inline]
pub(crate) fn bits(mut mask: u64) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || {
        if mask == 0 {
            return None;
        }
        let v = mask.trailing_zeros() as usize;
        mask &= mask - 1;
        Some(v)
    })
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised when building or growing a [`Graph`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The requested order does not fit in a `u64` neighbor row.
    #[error("graph has {n} vertices; at most {max} are supported", max = MAX_ORDER)]
    TooManyVertices {
        /// Requested number of vertices.
        n: usize,
    },
    /// A vertex index is outside `0..n`.
    #[error("vertex {vertex} is out of range for a graph on {n} vertices")]
    VertexOutOfRange {
        /// Offending vertex.
        vertex: usize,
        /// Order of the graph.
        n: usize,
    },
    /// An edge `(v, v)` was requested.
    #[error("self-loop at vertex {vertex}")]
    SelfLoop {
        /// Vertex with the loop.
        vertex: usize,
    },
    /// Adding a vertex would exceed [`MAX_ORDER`].
    #[error("cannot add a vertex to a graph that already has {n} vertices")]
    OrderOverflow {
        /// Order of the graph before the addition.
        n: usize,
    },
    /// Exhaustive neighbor-subset enumeration was requested on too many vertices.
    #[error("refusing to enumerate 2^{n} neighbor subsets (limit is 2^{limit})")]
    TooManySubsets {
        /// Order of the graph.
        n: usize,
        /// Largest order accepted for exhaustive enumeration.
        limit: usize,
    },
}

// ============================================================================
// Graph
// ============================================================================

/// A simple undirected graph on vertices `0..n`.
///
/// Representation: `adj[v]` is the neighbor bitset of vertex `v`. The rows are
/// symmetric, carry no bits at or above `n`, and have a clear diagonal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Graph {
    adj: Vec<u64>,
}

impl Graph {
    /// Creates an edgeless graph on `n` vertices.
    ///
    /// # Errors
    /// Returns [`GraphError::TooManyVertices`] if `n > 64`.
    pub fn empty(n: usize) -> Result<Self, GraphError> {
        if n > MAX_ORDER {
            return Err(GraphError::TooManyVertices { n });
        }
        Ok(Self { adj: vec![0u64; n] })
    }

    /// Creates the complete graph on `n` vertices.
    ///
    /// # Errors
    /// Returns [`GraphError::TooManyVertices`] if `n > 64`.
    pub fn complete(n: usize) -> Result<Self, GraphError> {
        let mut graph = Self::empty(n)?;
        let mask = all_bits(n);
        for (v, row) in graph.adj.iter_mut().enumerate() {
            *row = mask & !bit(v);
        }
        Ok(graph)
    }

    /// Builds a graph on `n` vertices from an edge list.
    ///
    /// Repeated edges are merged.
    ///
    /// # Errors
    /// Fails on an out-of-range endpoint, a self-loop, or `n > 64`.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, GraphError> {
        let mut graph = Self::empty(n)?;
        for &(u, v) in edges {
            graph.add_edge(u, v)?;
        }
        Ok(graph)
    }

    /// Creates a graph from neighbor rows that are already known to be valid.
    ///
    /// # Panics
    /// Panics in debug builds if the rows contain out-of-range bits,
    /// self-loops, or are not symmetric.
    pub fn from_adj(adj: Vec<u64>) -> Self {
        let n = adj.len();
        debug_assert!(n <= MAX_ORDER, "at most {MAX_ORDER} vertices are supported");
        let mask = all_bits(n);
        for (i, &row) in adj.iter().enumerate() {
            debug_assert_eq!(row & !mask, 0, "adj contains bits outside n");
            debug_assert_eq!((row >> i) & 1, 0, "self-loop at vertex {i}");
            for j in bits(row) {
                debug_assert_eq!((adj[j] >> i) & 1, 1, "adj is not symmetric at ({i},{j})");
            }
        }
        Self { adj }
    }

    /// Number of vertices.
    #[inline(always)]
    pub fn order(&self) -> usize {
        self.adj.len()
    }

    /// Returns the neighbor bitsets.
    #[inline(always)]
    pub fn adj(&self) -> &[u64] {
        &self.adj
    }

    /// Returns the neighbor bitset of `v`.
    #[inline(always)]
    pub fn neighbors(&self, v: usize) -> u64 {
        self.adj[v]
    }

    /// Returns whether the edge `(u, v)` exists.
    #[inline(always)]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        debug_assert!(u < self.order() && v < self.order());
        (self.adj[u] & bit(v)) != 0
    }

    /// Returns the degree of vertex `v`.
    #[inline(always)]
    pub fn degree(&self, v: usize) -> u32 {
        self.adj[v].count_ones()
    }

    /// Returns the largest vertex degree, or 0 for the empty graph.
    #[cfg(test)]
    pub(crate) fn max_degree(&self) -> u32 {
        self.adj.iter().map(|row| row.count_ones()).max().unwrap_or(0)
    }

    /// Returns the number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        let sum: u32 = self.adj.iter().map(|row| row.count_ones()).sum();
        (sum as usize) / 2
    }

    /// Iterates over the edges as `(u, v)` with `u < v`, in row-major order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adj
            .iter()
            .enumerate()
            .flat_map(|(u, &row)| bits(row & !all_bits(u + 1)).map(move |v| (u, v)))
    }

    /// Inserts the edge `(u, v)`; inserting an existing edge is a no-op.
    ///
    /// # Errors
    /// Fails on an out-of-range endpoint or when `u == v`.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<(), GraphError> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        if u == v {
            return Err(GraphError::SelfLoop { vertex: u });
        }
        self.adj[u] |= bit(v);
        self.adj[v] |= bit(u);
        Ok(())
    }

    /// Deletes the edge `(u, v)` if present.
    #[inline]
    pub fn remove_edge(&mut self, u: usize, v: usize) {
        debug_assert!(u < self.order() && v < self.order());
        self.adj[u] &= !bit(v);
        self.adj[v] &= !bit(u);
    }

    /// Returns a copy of this graph with the edge `(u, v)` removed.
    pub fn without_edge(&self, u: usize, v: usize) -> Self {
        let mut copy = self.clone();
        copy.remove_edge(u, v);
        copy
    }

    /// Returns a copy with one more vertex `n` whose neighbors are `neighbors`.
    ///
    /// # Errors
    /// Fails if the graph already has 64 vertices or `neighbors` names a
    /// vertex outside `0..n`.
    pub fn with_vertex(&self, neighbors: u64) -> Result<Self, GraphError> {
        let n = self.order();
        if n >= MAX_ORDER {
            return Err(GraphError::OrderOverflow { n });
        }
        if neighbors & !all_bits(n) != 0 {
            return Err(GraphError::VertexOutOfRange {
                vertex: 63 - neighbors.leading_zeros() as usize,
                n,
            });
        }
        let mut adj = Vec::with_capacity(n + 1);
        adj.extend(
            self.adj
                .iter()
                .enumerate()
                .map(|(v, &row)| if neighbors & bit(v) != 0 { row | bit(n) } else { row }),
        );
        adj.push(neighbors);
        Ok(Self { adj })
    }

    fn check_vertex(&self, v: usize) -> Result<(), GraphError> {
        if v >= self.order() {
            return Err(GraphError::VertexOutOfRange {
                vertex: v,
                n: self.order(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("n", &self.order())
            .field("edges", &self.edges().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn random_graph(rng: &mut XorShiftRng, n: usize, p: f64) -> Graph {
        let mut graph = Graph::empty(n).unwrap();
        for i in 0..n {
            for j in (i + 1)..n {
                if rng.random_bool(p) {
                    graph.add_edge(i, j).unwrap();
                }
            }
        }
        graph
    }

    #[test]
    fn empty_graph_has_no_edges() {
        let g = Graph::empty(7).unwrap();
        assert_eq!(g.order(), 7);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.max_degree(), 0);
        assert_eq!(g.edges().count(), 0);
    }

    #[test]
    fn complete_graph_properties() {
        let g = Graph::complete(6).unwrap();
        assert_eq!(g.edge_count(), 15);
        for v in 0..6 {
            assert_eq!(g.degree(v), 5);
            assert!(!g.has_edge(v, v));
        }
    }

    #[test]
    fn complete_graph_on_64_vertices() {
        let g = Graph::complete(64).unwrap();
        assert_eq!(g.edge_count(), 64 * 63 / 2);
        assert_eq!(g.neighbors(63), u64::MAX >> 1);
    }

    #[test]
    fn rejects_more_than_64_vertices() {
        assert_eq!(Graph::empty(65), Err(GraphError::TooManyVertices { n: 65 }));
    }

    #[test]
    fn add_edge_rejects_self_loop_and_range() {
        let mut g = Graph::empty(3).unwrap();
        assert_eq!(g.add_edge(1, 1), Err(GraphError::SelfLoop { vertex: 1 }));
        assert_eq!(
            g.add_edge(0, 3),
            Err(GraphError::VertexOutOfRange { vertex: 3, n: 3 })
        );
    }

    #[test]
    fn edges_are_listed_once_in_row_major_order() {
        let g = Graph::from_edges(4, &[(2, 1), (0, 3), (0, 1)]).unwrap();
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1), (0, 3), (1, 2)]);
    }

    #[test]
    fn without_edge_leaves_original_untouched() {
        let g = Graph::complete(4).unwrap();
        let h = g.without_edge(0, 2);
        assert!(g.has_edge(0, 2));
        assert!(!h.has_edge(0, 2));
        assert!(!h.has_edge(2, 0));
        assert_eq!(h.edge_count(), 5);
    }

    #[test]
    fn with_vertex_connects_both_directions() {
        let g = Graph::from_edges(3, &[(0, 1)]).unwrap();
        let h = g.with_vertex(0b101).unwrap();
        assert_eq!(h.order(), 4);
        assert!(h.has_edge(3, 0) && h.has_edge(0, 3));
        assert!(h.has_edge(3, 2) && h.has_edge(2, 3));
        assert!(!h.has_edge(3, 1));
        assert_eq!(h.degree(3), 2);
        assert_eq!(h.edge_count(), 3);
    }

    #[test]
    fn with_vertex_rejects_out_of_range_neighbors() {
        let g = Graph::empty(2).unwrap();
        assert_eq!(
            g.with_vertex(0b100),
            Err(GraphError::VertexOutOfRange { vertex: 2, n: 2 })
        );
    }

    #[test]
    fn with_vertex_rejects_order_overflow() {
        let g = Graph::empty(64).unwrap();
        assert_eq!(g.with_vertex(0), Err(GraphError::OrderOverflow { n: 64 }));
    }

    #[test]
    fn rows_stay_symmetric_under_random_edits() {
        let mut rng = XorShiftRng::seed_from_u64(0xC0FFEE);
        for _ in 0..30 {
            let n = rng.random_range(2..20);
            let mut g = random_graph(&mut rng, n, 0.4);
            for _ in 0..20 {
                let u = rng.random_range(0..n);
                let v = rng.random_range(0..n);
                if u != v {
                    g.remove_edge(u, v);
                }
            }
            // from_adj re-checks symmetry in debug builds.
            let rebuilt = Graph::from_adj(g.adj().to_vec());
            assert_eq!(rebuilt, g);
            let sum: usize = (0..n).map(|v| g.degree(v) as usize).sum();
            assert_eq!(sum, 2 * g.edge_count());
        }
    }

    #[test]
    #[should_panic(expected = "self-loop")]
    #[cfg(debug_assertions)]
    fn from_adj_panics_on_self_loop() {
        let _ = Graph::from_adj(vec![0b01, 0b00]);
    }

    #[test]
    #[should_panic(expected = "not symmetric")]
    #[cfg(debug_assertions)]
    fn from_adj_panics_on_asymmetry() {
        let _ = Graph::from_adj(vec![0b10, 0b00]);
    }

    #[test]
    fn all_bits_edges() {
        assert_eq!(all_bits(0), 0);
        assert_eq!(all_bits(3), 0b111);
        assert_eq!(all_bits(64), u64::MAX);
    }
}
