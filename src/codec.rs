//! Line-oriented text formats for graphs and explicit metrics.
//!
//! Two formats are supported, one space per line:
//! - [`AdjacencyCodec`]: the `0/1` rows of the adjacency matrix separated by
//!   whitespace, e.g. `010 101 010` for the path on three vertices.
//! - [`DistanceCodec`]: `n d(0,1) d(0,2) … d(n-2,n-1) [label…]`, the
//!   row-major upper triangle of a distance matrix with an optional label.

use crate::distance::{distance_matrix, DistanceMatrix};
use crate::graph::{bit, Graph, MAX_ORDER};

// ============================================================================
// Space
// ============================================================================

/// One item of the input stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Space {
    /// A graph, measured by its shortest-path metric.
    Graph(Graph),
    /// An explicit metric with an optional label echoed on output.
    Metric {
        /// Pairwise distances.
        dist: DistanceMatrix,
        /// Trailing tokens of the input line, if any.
        label: Option<String>,
    },
}

impl Space {
    /// Number of points.
    pub fn order(&self) -> usize {
        match self {
            Self::Graph(graph) => graph.order(),
            Self::Metric { dist, .. } => dist.order(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A line that could not be decoded, or a space that cannot be encoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The line holds no tokens.
    #[error("line is empty")]
    Empty,
    /// An adjacency row has the wrong length.
    #[error("adjacency matrix is not square: row {row} has length {got}, expected {expected}")]
    NonSquare {
        /// Row index.
        row: usize,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },
    /// An adjacency row holds something other than `0` or `1`.
    #[error("invalid character at ({row}, {col}): {ch:?} (expected '0' or '1')")]
    InvalidChar {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The character found.
        ch: char,
    },
    /// More points than fit in a 64-bit row.
    #[error("space has {n} points; at most {max} are supported", max = MAX_ORDER)]
    TooManyVertices {
        /// Number of points.
        n: usize,
    },
    /// The adjacency diagonal holds a `1`.
    #[error("loops are not supported (vertex {vertex})")]
    SelfLoop {
        /// Vertex with the loop.
        vertex: usize,
    },
    /// `A[i][j] != A[j][i]`.
    #[error("adjacency matrix is not symmetric at ({i},{j})")]
    NotSymmetric {
        /// Row index.
        i: usize,
        /// Column index.
        j: usize,
    },
    /// A token that should be a non-negative integer is not.
    #[error("invalid number {token:?}")]
    InvalidNumber {
        /// The offending token.
        token: String,
    },
    /// Fewer distances than `n (n - 1) / 2`.
    #[error("a space on {n} points needs {expected} distances, found {got}")]
    MissingDistances {
        /// Number of points.
        n: usize,
        /// Required number of distances.
        expected: usize,
        /// Distances present.
        got: usize,
    },
    /// Two distinct points at distance zero.
    #[error("points {i} and {j} are at distance 0")]
    ZeroDistance {
        /// First point.
        i: usize,
        /// Second point.
        j: usize,
    },
    /// An explicit metric cannot be written as an adjacency matrix.
    #[error("an explicit metric has no adjacency matrix")]
    NotAGraph,
}

impl CodecError {
    /// Returns `true` for a well-formed graph that the analysis cannot handle.
    pub fn is_unsupported_graph(&self) -> bool {
        matches!(self, Self::SelfLoop { .. })
    }
}

// ============================================================================
// Codec trait
// ============================================================================

/// Converts between input lines and [`Space`]s.
pub trait GraphCodec: Send + Sync {
    /// Decodes one non-empty line.
    ///
    /// # Errors
    /// Returns a [`CodecError`] describing the malformed input.
    fn decode(&self, line: &str) -> Result<Space, CodecError>;

    /// Encodes `space` as one line without a trailing newline.
    ///
    /// # Errors
    /// Returns [`CodecError::NotAGraph`] if the format cannot represent `space`.
    fn encode(&self, space: &Space) -> Result<String, CodecError>;
}

// ============================================================================
// Adjacency rows
// ============================================================================

/// Whitespace-separated `0/1` adjacency rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdjacencyCodec;

impl GraphCodec for AdjacencyCodec {
    fn decode(&self, line: &str) -> Result<Space, CodecError> {
        parse_adjacency_rows(line).map(Space::Graph)
    }

    fn encode(&self, space: &Space) -> Result<String, CodecError> {
        match space {
            Space::Graph(graph) => Ok(write_adjacency_rows(graph)),
            Space::Metric { .. } => Err(CodecError::NotAGraph),
        }
    }
}

/// Parses whitespace-separated `0/1` adjacency rows.
///
/// The matrix must be square, symmetric, have a zero diagonal and at most 64 rows.
///
/// # Errors
/// Returns the first violated rule.
pub fn parse_adjacency_rows(line: &str) -> Result<Graph, CodecError> {
    let rows: Vec<&str> = line.split_whitespace().collect();
    if rows.is_empty() {
        return Err(CodecError::Empty);
    }
    let n = rows.len();
    if n > MAX_ORDER {
        return Err(CodecError::TooManyVertices { n });
    }

    let mut adj = Vec::with_capacity(n);
    for (i, row) in rows.iter().enumerate() {
        let bytes = row.as_bytes();
        if bytes.len() != n {
            return Err(CodecError::NonSquare {
                row: i,
                expected: n,
                got: row.chars().count(),
            });
        }
        let mut mask = 0u64;
        for (j, &b) in bytes.iter().enumerate() {
            match b {
                b'0' => {}
                b'1' => mask |= bit(j),
                _ => {
                    return Err(CodecError::InvalidChar {
                        row: i,
                        col: j,
                        ch: b as char,
                    })
                }
            }
        }
        adj.push(mask);
    }

    for (i, &row) in adj.iter().enumerate() {
        if (row >> i) & 1 != 0 {
            return Err(CodecError::SelfLoop { vertex: i });
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if (adj[i] >> j) & 1 != (adj[j] >> i) & 1 {
                return Err(CodecError::NotSymmetric { i, j });
            }
        }
    }

    Ok(Graph::from_adj(adj))
}

/// Writes `graph` as whitespace-separated `0/1` adjacency rows.
pub fn write_adjacency_rows(graph: &Graph) -> String {
    let n = graph.order();
    let mut out = String::with_capacity(n * (n + 1));
    for (i, &row) in graph.adj().iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        for j in 0..n {
            out.push(if (row >> j) & 1 != 0 { '1' } else { '0' });
        }
    }
    out
}

// ============================================================================
// Distance lists
// ============================================================================

/// `n` followed by the upper triangle of the distance matrix and a label.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistanceCodec;

impl GraphCodec for DistanceCodec {
    fn decode(&self, line: &str) -> Result<Space, CodecError> {
        parse_distance_list(line)
    }

    fn encode(&self, space: &Space) -> Result<String, CodecError> {
        Ok(match space {
            Space::Graph(graph) => write_distance_list(&distance_matrix(graph), None),
            Space::Metric { dist, label } => write_distance_list(dist, label.as_deref()),
        })
    }
}

fn parse_number<T: std::str::FromStr>(token: &str) -> Result<T, CodecError> {
    token.parse().map_err(|_| CodecError::InvalidNumber {
        token: token.to_string(),
    })
}

/// Parses `n d(0,1) … d(n-2,n-1) [label…]`.
///
/// # Errors
/// Fails on a bad number, too few distances, a zero distance, or `n > 64`.
pub fn parse_distance_list(line: &str) -> Result<Space, CodecError> {
    let mut tokens = line.split_whitespace();
    let n: usize = parse_number(tokens.next().ok_or(CodecError::Empty)?)?;
    if n > MAX_ORDER {
        return Err(CodecError::TooManyVertices { n });
    }

    let expected = n * n.saturating_sub(1) / 2;
    let mut dist = DistanceMatrix::unreachable(n);
    let mut got = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let token = tokens.next().ok_or(CodecError::MissingDistances { n, expected, got })?;
            let d: u32 = parse_number(token)?;
            if d == 0 {
                return Err(CodecError::ZeroDistance { i, j });
            }
            dist.set(i, j, d);
            got += 1;
        }
    }

    let label: Vec<&str> = tokens.collect();
    let label = (!label.is_empty()).then(|| label.join(" "));
    Ok(Space::Metric { dist, label })
}

/// Writes `dist` as `n d(0,1) … d(n-2,n-1)` followed by `label`.
pub fn write_distance_list(dist: &DistanceMatrix, label: Option<&str>) -> String {
    let mut out = dist.order().to_string();
    for d in dist.upper_triangle() {
        out.push(' ');
        out.push_str(&d.to_string());
    }
    if let Some(label) = label {
        out.push(' ');
        out.push_str(label);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::UNREACHABLE;

    #[test]
    fn parses_path() {
        let g = parse_adjacency_rows("010 101 010").unwrap();
        assert_eq!(g, Graph::from_edges(3, &[(0, 1), (1, 2)]).unwrap());
    }

    #[test]
    fn single_vertex() {
        let g = parse_adjacency_rows("0").unwrap();
        assert_eq!(g.order(), 1);
    }

    #[test]
    fn write_and_parse_roundtrip() {
        let g = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2)]).unwrap();
        let text = write_adjacency_rows(&g);
        assert_eq!(text, "01101 10100 11010 00101 10010");
        assert_eq!(parse_adjacency_rows(&text).unwrap(), g);
    }

    #[test]
    fn rejects_non_square() {
        assert_eq!(
            parse_adjacency_rows("010 10 010"),
            Err(CodecError::NonSquare {
                row: 1,
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn rejects_invalid_char() {
        assert!(matches!(
            parse_adjacency_rows("01 1x"),
            Err(CodecError::InvalidChar { row: 1, col: 1, ch: 'x' })
        ));
    }

    #[test]
    fn rejects_self_loop() {
        let err = parse_adjacency_rows("11 10").unwrap_err();
        assert_eq!(err, CodecError::SelfLoop { vertex: 0 });
        assert!(err.is_unsupported_graph());
    }

    #[test]
    fn rejects_non_symmetric() {
        assert_eq!(
            parse_adjacency_rows("010 001 000"),
            Err(CodecError::NotSymmetric { i: 0, j: 1 })
        );
    }

    #[test]
    fn rejects_whitespace_only() {
        assert_eq!(parse_adjacency_rows("   \t "), Err(CodecError::Empty));
    }

    #[test]
    fn rejects_too_many_rows() {
        let row = "0".repeat(65);
        let line = vec![row.as_str(); 65].join(" ");
        assert_eq!(
            parse_adjacency_rows(&line),
            Err(CodecError::TooManyVertices { n: 65 })
        );
    }

    #[test]
    fn adjacency_codec_refuses_metrics() {
        let space = parse_distance_list("2 3").unwrap();
        assert_eq!(AdjacencyCodec.encode(&space), Err(CodecError::NotAGraph));
    }

    #[test]
    fn parses_distance_list_with_label() {
        let space = parse_distance_list("3 2 3 4 matrix-3-0").unwrap();
        let Space::Metric { dist, label } = space else {
            panic!("expected a metric");
        };
        assert_eq!(dist.get(0, 1), 2);
        assert_eq!(dist.get(2, 0), 3);
        assert_eq!(dist.get(1, 2), 4);
        assert_eq!(label.as_deref(), Some("matrix-3-0"));
    }

    #[test]
    fn distance_list_roundtrip_keeps_label() {
        let line = "4 1 2 1 1 2 1 square c4";
        let space = DistanceCodec.decode(line).unwrap();
        assert_eq!(DistanceCodec.encode(&space).unwrap(), line);
    }

    #[test]
    fn distance_codec_encodes_graph_metric() {
        let g = Graph::from_edges(4, &[(0, 1), (1, 2)]).unwrap();
        let text = DistanceCodec.encode(&Space::Graph(g)).unwrap();
        assert_eq!(text, format!("4 1 2 {UNREACHABLE} 1 {UNREACHABLE} {UNREACHABLE}"));
    }

    #[test]
    fn distance_list_errors() {
        assert_eq!(
            parse_distance_list("3 1 1"),
            Err(CodecError::MissingDistances {
                n: 3,
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            parse_distance_list("3 1 0 1"),
            Err(CodecError::ZeroDistance { i: 0, j: 2 })
        );
        assert!(matches!(
            parse_distance_list("x 1"),
            Err(CodecError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_distance_list("2 -1"),
            Err(CodecError::InvalidNumber { .. })
        ));
        assert_eq!(
            parse_distance_list("70"),
            Err(CodecError::TooManyVertices { n: 70 })
        );
    }
}
