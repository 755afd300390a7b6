//! All-pairs shortest paths over unit-weight graphs.

use crate::graph::{bits, Graph};

/// Distance stored for a pair with no connecting path.
///
/// Always larger than the order of any graph, so `d > n` identifies it.
pub const UNREACHABLE: u32 = u32::MAX;

// ============================================================================
// DistanceMatrix
// ============================================================================

/// Dense symmetric `n x n` matrix of pairwise distances with a zero diagonal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceMatrix {
    n: usize,
    d: Vec<u32>,
}

impl DistanceMatrix {
    /// Creates a matrix with every off-diagonal entry set to [`UNREACHABLE`].
    pub fn unreachable(n: usize) -> Self {
        let mut d = vec![UNREACHABLE; n * n];
        for i in 0..n {
            d[i * n + i] = 0;
        }
        Self { n, d }
    }

    /// Builds a matrix from the row-major upper triangle
    /// `d(0,1), d(0,2), …, d(n-2,n-1)`.
    ///
    /// Returns `None` if `upper` has the wrong length.
    pub fn from_upper_triangle(n: usize, upper: &[u32]) -> Option<Self> {
        if upper.len() != n * n.saturating_sub(1) / 2 {
            return None;
        }
        let mut matrix = Self::unreachable(n);
        let mut values = upper.iter().copied();
        for i in 0..n {
            for j in (i + 1)..n {
                let value = values.next()?;
                matrix.set(i, j, value);
            }
        }
        Some(matrix)
    }

    /// Number of points.
    #[inline(always)]
    pub fn order(&self) -> usize {
        self.n
    }

    /// Distance between `i` and `j`.
    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> u32 {
        debug_assert!(i < self.n && j < self.n);
        self.d[i * self.n + j]
    }

    /// Sets the distance between `i` and `j` in both directions.
    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, value: u32) {
        debug_assert!(i < self.n && j < self.n);
        self.d[i * self.n + j] = value;
        self.d[j * self.n + i] = value;
    }

    /// Returns `true` if `i` and `j` are connected.
    #[inline(always)]
    pub fn is_reachable(&self, i: usize, j: usize) -> bool {
        self.get(i, j) != UNREACHABLE
    }

    /// Returns `true` if every pair of points is connected.
    pub fn is_connected(&self) -> bool {
        self.d.iter().all(|&d| d != UNREACHABLE)
    }

    /// Largest finite distance, or `None` for a disconnected space.
    pub fn diameter(&self) -> Option<u32> {
        if !self.is_connected() {
            return None;
        }
        Some(self.d.iter().copied().max().unwrap_or(0))
    }

    /// Iterates over the row-major upper triangle.
    pub fn upper_triangle(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.n).flat_map(move |i| ((i + 1)..self.n).map(move |j| self.get(i, j)))
    }
}

// ============================================================================
// Oracle
// ============================================================================

/// Computes the unit-weight shortest-path matrix of `graph` (Floyd–Warshall).
///
/// Edges start at distance 1 and non-edges at [`UNREACHABLE`]; relaxations use
/// saturating addition, so a pair without a path keeps the sentinel exactly.
pub fn distance_matrix(graph: &Graph) -> DistanceMatrix {
    let n = graph.order();
    let mut dist = DistanceMatrix::unreachable(n);
    for u in 0..n {
        for v in bits(graph.neighbors(u)) {
            dist.d[u * n + v] = 1;
        }
    }

    let d = &mut dist.d;
    for k in 0..n {
        for i in 0..n {
            let dik = d[i * n + k];
            if dik == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let through = dik.saturating_add(d[k * n + j]);
                if through < d[i * n + j] {
                    d[i * n + j] = through;
                }
            }
        }
    }
    dist
}

// ============================================================================
// Tests
// ============================================================================
