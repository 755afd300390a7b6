//! Candidate generation by adding one vertex to a graph.
//!
//! The new vertex gets index `n` and either an arbitrary neighbor subset or a
//! copy of an existing vertex's neighborhood (a clone). Candidates whose new
//! vertex has degree below the threshold are dropped. No isomorphism
//! filtering is done here.

use crate::graph::{all_bits, bit, Graph, GraphError};

/// Largest order accepted by [`ExpansionStrategy::AllSubsets`].
pub const MAX_SUBSET_ORDER: usize = 30;

/// How the new vertex is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpansionStrategy {
    /// Every neighbor subset of the existing vertices, in increasing mask order.
    AllSubsets,
    /// For every vertex `i`: the adjacent clone, then the non-adjacent clone.
    Clones,
    /// Clones of every vertex that are also adjacent to the original.
    AdjacentClones,
    /// Clones of every vertex that are not adjacent to the original.
    NonAdjacentClones,
}

/// Generator of one-vertex extensions of a fixed graph.
#[derive(Clone, Debug)]
pub struct CombinatorialExpander {
    strategy: ExpansionStrategy,
    min_degree: u32,
    vertex: Option<usize>,
}

impl CombinatorialExpander {
    /// Creates an expander emitting candidates whose new vertex has degree at
    /// least `min_degree`.
    pub fn new(strategy: ExpansionStrategy, min_degree: u32) -> Self {
        Self {
            strategy,
            min_degree,
            vertex: None,
        }
    }

    /// Restricts clone strategies to clones of `vertex`.
    #[must_use]
    pub fn only_vertex(mut self, vertex: usize) -> Self {
        self.vertex = Some(vertex);
        self
    }

    /// Strategy in use.
    pub fn strategy(&self) -> ExpansionStrategy {
        self.strategy
    }

    /// Returns the candidate extensions of `graph` in a fixed order.
    ///
    /// # Errors
    /// Fails if `graph` already has 64 vertices, if exhaustive enumeration is
    /// asked for more than [`MAX_SUBSET_ORDER`] vertices, or if the selected
    /// clone vertex does not exist.
    pub fn expand<'a>(&self, graph: &'a Graph) -> Result<Expansions<'a>, GraphError> {
        let n = graph.order();
        if n >= crate::graph::MAX_ORDER {
            return Err(GraphError::OrderOverflow { n });
        }
        if let Some(v) = self.vertex {
            if v >= n {
                return Err(GraphError::VertexOutOfRange { vertex: v, n });
            }
        }

        let neighborhoods: Box<dyn Iterator<Item = u64> + Send + 'a> = match self.strategy {
            ExpansionStrategy::AllSubsets => {
                if n > MAX_SUBSET_ORDER {
                    return Err(GraphError::TooManySubsets {
                        n,
                        limit: MAX_SUBSET_ORDER,
                    });
                }
                Box::new(0..=all_bits(n))
            }
            ExpansionStrategy::Clones => Box::new(
                self.clone_sources(n)
                    .flat_map(move |i| [graph.neighbors(i) | bit(i), graph.neighbors(i)]),
            ),
            ExpansionStrategy::AdjacentClones => {
                Box::new(self.clone_sources(n).map(move |i| graph.neighbors(i) | bit(i)))
            }
            ExpansionStrategy::NonAdjacentClones => {
                Box::new(self.clone_sources(n).map(move |i| graph.neighbors(i)))
            }
        };

        Ok(Expansions {
            graph,
            neighborhoods,
            min_degree: self.min_degree,
        })
    }

    fn clone_sources(&self, n: usize) -> std::ops::Range<usize> {
        match self.vertex {
            Some(v) => v..v + 1,
            None => 0..n,
        }
    }
}

/// Iterator over the candidates produced by [`CombinatorialExpander::expand`].
pub struct Expansions<'a> {
    graph: &'a Graph,
    neighborhoods: Box<dyn Iterator<Item = u64> + Send + 'a>,
    min_degree: u32,
}

impl Iterator for Expansions<'_> {
    type Item = Graph;

    fn next(&mut self) -> Option<Graph> {
        loop {
            let neighbors = self.neighborhoods.next()?;
            if neighbors.count_ones() < self.min_degree {
                continue;
            }
            // Neighborhoods are masks over existing vertices, so this cannot fail.
            if let Ok(candidate) = self.graph.with_vertex(neighbors) {
                return Some(candidate);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pentagon() -> Graph {
        Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap()
    }

    fn count(strategy: ExpansionStrategy, min_degree: u32, g: &Graph) -> usize {
        CombinatorialExpander::new(strategy, min_degree)
            .expand(g)
            .unwrap()
            .count()
    }

    #[test]
    fn single_vertex_all_subsets_min_degree_one() {
        let g = Graph::empty(1).unwrap();
        let out: Vec<Graph> = CombinatorialExpander::new(ExpansionStrategy::AllSubsets, 1)
            .expand(&g)
            .unwrap()
            .collect();
        assert_eq!(out, vec![Graph::from_edges(2, &[(0, 1)]).unwrap()]);
    }

    #[test]
    fn pentagon_counts() {
        let g = pentagon();
        assert_eq!(count(ExpansionStrategy::AllSubsets, 2, &g), 26);
        assert_eq!(count(ExpansionStrategy::AllSubsets, 0, &g), 32);
        assert_eq!(count(ExpansionStrategy::Clones, 2, &g), 10);
        assert_eq!(count(ExpansionStrategy::AdjacentClones, 2, &g), 5);
        assert_eq!(count(ExpansionStrategy::NonAdjacentClones, 2, &g), 5);
    }

    #[test]
    fn all_subsets_are_distinct_labelled_graphs() {
        let g = pentagon();
        let out: HashSet<Graph> = CombinatorialExpander::new(ExpansionStrategy::AllSubsets, 0)
            .expand(&g)
            .unwrap()
            .collect();
        assert_eq!(out.len(), 32);
        for h in &out {
            assert_eq!(h.order(), 6);
            assert_eq!(h.edge_count(), 5 + h.degree(5) as usize);
        }
    }

    #[test]
    fn adjacent_clone_of_vertex() {
        let g = pentagon();
        let out: Vec<Graph> = CombinatorialExpander::new(ExpansionStrategy::AdjacentClones, 0)
            .only_vertex(0)
            .expand(&g)
            .unwrap()
            .collect();
        assert_eq!(out.len(), 1);
        let h = &out[0];
        assert!(h.has_edge(5, 0));
        assert!(h.has_edge(5, 1));
        assert!(h.has_edge(5, 4));
        assert_eq!(h.degree(5), 3);
    }

    #[test]
    fn non_adjacent_clone_of_vertex() {
        let g = pentagon();
        let out: Vec<Graph> = CombinatorialExpander::new(ExpansionStrategy::NonAdjacentClones, 0)
            .only_vertex(2)
            .expand(&g)
            .unwrap()
            .collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].neighbors(5), g.neighbors(2));
        assert!(!out[0].has_edge(5, 2));
    }

    #[test]
    fn clones_alternate_adjacent_then_not() {
        let g = Graph::from_edges(2, &[(0, 1)]).unwrap();
        let out: Vec<u64> = CombinatorialExpander::new(ExpansionStrategy::Clones, 0)
            .expand(&g)
            .unwrap()
            .map(|h| h.neighbors(2))
            .collect();
        assert_eq!(out, vec![0b11, 0b10, 0b11, 0b01]);
    }

    #[test]
    fn min_degree_filters_clones_of_leaves() {
        // Star with center 0: leaves have degree 1.
        let g = Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        assert_eq!(count(ExpansionStrategy::NonAdjacentClones, 2, &g), 1);
        assert_eq!(count(ExpansionStrategy::AdjacentClones, 2, &g), 4);
    }

    #[test]
    fn refuses_oversized_inputs() {
        let big = Graph::empty(31).unwrap();
        assert!(matches!(
            CombinatorialExpander::new(ExpansionStrategy::AllSubsets, 0).expand(&big),
            Err(GraphError::TooManySubsets { n: 31, .. })
        ));
        let full = Graph::empty(64).unwrap();
        assert_eq!(
            CombinatorialExpander::new(ExpansionStrategy::Clones, 0)
                .expand(&full)
                .err(),
            Some(GraphError::OrderOverflow { n: 64 })
        );
        assert_eq!(
            CombinatorialExpander::new(ExpansionStrategy::Clones, 0)
                .only_vertex(9)
                .expand(&pentagon())
                .err(),
            Some(GraphError::VertexOutOfRange { vertex: 9, n: 5 })
        );
    }

    #[test]
    fn empty_graph_expands_to_single_vertex() {
        let g = Graph::empty(0).unwrap();
        let out: Vec<Graph> = CombinatorialExpander::new(ExpansionStrategy::AllSubsets, 0)
            .expand(&g)
            .unwrap()
            .collect();
        assert_eq!(out, vec![Graph::empty(1).unwrap()]);
    }
}
