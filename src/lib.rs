//! # Line Structure of Finite Metric Spaces
//!
//! Tools for testing the AMRZ gap conjecture on graphs: for every pair of
//! points, the *line* through them is the set of points that are collinear
//! with the pair under shortest-path betweenness.
//!
//! This crate provides:
//! - Bitset graphs on up to 64 vertices and all-pairs shortest paths.
//! - Line extraction, line deduplication and universal-line detection.
//! - Bridge detection by edge removal.
//! - A configurable analyzer producing per-space statistics, including the
//!   AMRZ gap `num_lines + num_universal - num_vertices`.
//! - A one-vertex expansion generator for producing candidate graphs.
//! - Ordered, parallel stream drivers over line-oriented text formats.
//!
//! ## Quick Start
//!
//! ```
//! use linespace::analysis::{AnalysisConfig, MetricSpaceAnalyzer};
//! use linespace::graph::Graph;
//!
//! // The 5-cycle has ten lines and no universal line.
//! let c5 = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap();
//! let analyzer = MetricSpaceAnalyzer::new(AnalysisConfig::default()).unwrap();
//! let result = analyzer.analyze(&c5).unwrap();
//! assert_eq!(result.num_lines, 10);
//! assert_eq!(result.num_universal, 0);
//! assert_eq!(result.amrz_gap, 5);
//! ```
//!
//! ## Expanding Graphs
//!
//! ```
//! use linespace::expand::{CombinatorialExpander, ExpansionStrategy};
//! use linespace::graph::Graph;
//!
//! let k1 = Graph::empty(1).unwrap();
//! let expander = CombinatorialExpander::new(ExpansionStrategy::AllSubsets, 1);
//! let candidates: Vec<Graph> = expander.expand(&k1).unwrap().collect();
//! assert_eq!(candidates.len(), 1);
//! assert!(candidates[0].has_edge(0, 1));
//! ```
//!
//! ## Validating the Analyzer
//!
//! ```
//! use linespace::validate::validate_known_spaces;
//!
//! validate_known_spaces().expect("bundled spaces should match");
//! ```
//!
//! ## Modules
//!
//! - [`graph`]: Bitset graph container.
//! - [`distance`]: Distance matrices and Floyd–Warshall.
//! - [`line`]: Lines and line collections.
//! - [`bridge`]: Bridge detection.
//! - [`analysis`]: Configuration, analyzer and results.
//! - [`expand`]: One-vertex expansion.
//! - [`codec`]: Text formats for graphs and explicit metrics.
//! - [`pipeline`]: Stream drivers.
//! - [`validate`]: Deterministic self-check.
//!
//! ## Performance Notes
//!
//! - Distances are `O(n^3)` per space; bridge counting adds `O(n^4)`.
//! - Lines are deduplicated with a `2^capacity` bitmap for capacities up to
//!   24 and with a hash set above that.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::inline_always)] // Intentional for hot-path code
#![allow(clippy::many_single_char_names)] // Mathematical variable names
#![allow(clippy::needless_range_loop)] // Often clearer for matrix indexing
#![allow(clippy::doc_markdown)]

pub mod analysis;
pub mod bridge;
pub mod codec;
pub mod distance;
pub mod expand;
pub mod graph;
pub mod line;
pub mod pipeline;
pub mod validate;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::analysis::{AnalysisConfig, AnalysisError, AnalysisResult, MetricSpaceAnalyzer};
    pub use crate::codec::{AdjacencyCodec, DistanceCodec, GraphCodec, Space};
    pub use crate::distance::{distance_matrix, DistanceMatrix};
    pub use crate::expand::{CombinatorialExpander, ExpansionStrategy};
    pub use crate::graph::Graph;
    pub use crate::line::{line_through, Line, LineCollection};
    pub use crate::pipeline::{Pipeline, PipelineError, PipelineOptions, RunSummary};
}
