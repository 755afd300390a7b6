//! Line-structure analysis of a single metric space.
//!
//! For every pair `i < j` the analyzer computes the line through `i` and `j`,
//! deduplicates lines, counts the pairs whose line is universal, optionally
//! counts bridges, and reports the AMRZ gap
//! `num_lines + num_universal - num_vertices`.

use crate::bridge::is_bridge;
use crate::distance::{distance_matrix, DistanceMatrix};
use crate::graph::{Graph, MAX_ORDER};
use crate::line::{line_through, LineCollection};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default vertex capacity.
pub const DEFAULT_CAPACITY: usize = 31;

// ============================================================================
// Configuration
// ============================================================================

/// Analysis options, fixed for a whole run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Log the line of every analyzed pair.
    pub verbose: bool,
    /// Count bridges among the distance-1 pairs (`O(n^4)`; graphs only).
    pub count_bridges: bool,
    /// Report distinct lines generated at distance 1, 2 and above separately.
    pub count_lines_by_distance: bool,
    /// Let the universal line take part in the general line tally.
    pub include_universal_in_lines: bool,
    /// Reject a space as soon as one of its lines is universal.
    pub skip_spaces_with_universal_line: bool,
    /// Smallest pair distance counted towards the line tally.
    pub dmin: u32,
    /// Largest pair distance counted towards the line tally.
    pub dmax: u32,
    /// Smallest pair distance counted as a universal pair.
    pub dumin: u32,
    /// Largest pair distance counted as a universal pair.
    pub dumax: u32,
    /// Largest number of points a space may have (MAX_N).
    ///
    /// Lines are deduplicated with a `2^capacity`-bit bitmap up to
    /// [`crate::line::BITMAP_DEDUP_MAX_CAPACITY`], with a hash set above it.
    pub capacity: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            count_bridges: false,
            count_lines_by_distance: false,
            include_universal_in_lines: true,
            skip_spaces_with_universal_line: false,
            dmin: 0,
            dmax: u32::MAX,
            dumin: 0,
            dumax: u32::MAX,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Invalid [`AnalysisConfig`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Capacity outside `1..=64`.
    #[error("capacity {capacity} is outside 1..={max}", max = MAX_ORDER)]
    CapacityOutOfRange {
        /// Requested capacity.
        capacity: usize,
    },
    /// `dmin > dmax`.
    #[error("line distance range {dmin}..={dmax} is empty")]
    EmptyLineRange {
        /// Lower bound.
        dmin: u32,
        /// Upper bound.
        dmax: u32,
    },
    /// `dumin > dumax`.
    #[error("universal distance range {dumin}..={dumax} is empty")]
    EmptyUniversalRange {
        /// Lower bound.
        dumin: u32,
        /// Upper bound.
        dumax: u32,
    },
}

impl AnalysisConfig {
    /// Checks the capacity and both distance ranges.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 || self.capacity > MAX_ORDER {
            return Err(ConfigError::CapacityOutOfRange {
                capacity: self.capacity,
            });
        }
        if self.dmin > self.dmax {
            return Err(ConfigError::EmptyLineRange {
                dmin: self.dmin,
                dmax: self.dmax,
            });
        }
        if self.dumin > self.dumax {
            return Err(ConfigError::EmptyUniversalRange {
                dumin: self.dumin,
                dumax: self.dumax,
            });
        }
        Ok(())
    }

    #[inline]
    fn in_line_range(&self, d: u32) -> bool {
        (self.dmin..=self.dmax).contains(&d)
    }

    #[inline]
    fn in_universal_range(&self, d: u32) -> bool {
        (self.dumin..=self.dumax).contains(&d)
    }
}

// ============================================================================
// Result and errors
// ============================================================================

/// Aggregate line statistics of one space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Number of points.
    pub num_vertices: usize,
    /// Distinct lines among pairs inside the line distance range.
    pub num_lines: usize,
    /// Distinct lines generated by pairs at distance 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_lines_dist1: Option<usize>,
    /// Distinct lines generated by pairs at distance 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_lines_dist2: Option<usize>,
    /// Distinct lines generated by pairs at any other distance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_lines_other: Option<usize>,
    /// Pairs inside the universal distance range whose line is universal.
    pub num_universal: usize,
    /// Universal pairs at distance 1.
    pub num_universal_dist1: usize,
    /// Universal pairs at distance 2.
    pub num_universal_dist2: usize,
    /// Pairs inside the line distance range.
    pub num_line_pairs: usize,
    /// Number of bridges, when counted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_bridges: Option<usize>,
    /// `num_lines + num_universal - num_vertices`.
    pub amrz_gap: i64,
}

/// Why a space could not be analyzed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The space has more points than the configured capacity.
    #[error("space has {n} points but capacity is {capacity}")]
    CapacityExceeded {
        /// Number of points.
        n: usize,
        /// Configured capacity.
        capacity: usize,
    },
    /// Some pair has no finite distance.
    #[error("points {i} and {j} are not connected")]
    Disconnected {
        /// First point of the unreachable pair.
        i: usize,
        /// Second point of the unreachable pair.
        j: usize,
    },
    /// A universal line was found while such spaces are rejected.
    #[error("the line through {i} and {j} is universal")]
    UniversalLine {
        /// First generating point.
        i: usize,
        /// Second generating point.
        j: usize,
    },
}

impl AnalysisError {
    /// Returns `true` if the error must end the whole run.
    ///
    /// Capacity is shared by every item of a run; the other errors only
    /// concern the current space.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Computes [`AnalysisResult`]s under a fixed [`AnalysisConfig`].
#[derive(Clone, Debug)]
pub struct MetricSpaceAnalyzer {
    config: AnalysisConfig,
}

impl MetricSpaceAnalyzer {
    /// Creates an analyzer after validating `config`.
    ///
    /// # Errors
    /// Returns the configuration error, if any.
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The run configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Returns an error if a space of `n` points exceeds the capacity.
    ///
    /// # Errors
    /// Returns [`AnalysisError::CapacityExceeded`].
    pub fn check_capacity(&self, n: usize) -> Result<(), AnalysisError> {
        if n > self.config.capacity {
            return Err(AnalysisError::CapacityExceeded {
                n,
                capacity: self.config.capacity,
            });
        }
        Ok(())
    }

    /// Analyzes the shortest-path metric of `graph`.
    ///
    /// # Errors
    /// See [`AnalysisError`]; only `CapacityExceeded` is fatal.
    pub fn analyze(&self, graph: &Graph) -> Result<AnalysisResult, AnalysisError> {
        self.check_capacity(graph.order())?;
        let dist = distance_matrix(graph);
        self.analyze_with(&dist, Some(graph))
    }

    /// Analyzes `graph` reusing its precomputed distance matrix.
    ///
    /// # Errors
    /// See [`AnalysisError`].
    pub fn analyze_graph_distances(
        &self,
        graph: &Graph,
        dist: &DistanceMatrix,
    ) -> Result<AnalysisResult, AnalysisError> {
        debug_assert_eq!(graph.order(), dist.order());
        self.check_capacity(graph.order())?;
        self.analyze_with(dist, Some(graph))
    }

    /// Analyzes an explicit metric. Bridges are not counted: there is no
    /// underlying graph.
    ///
    /// # Errors
    /// See [`AnalysisError`].
    pub fn analyze_distances(
        &self,
        dist: &DistanceMatrix,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.check_capacity(dist.order())?;
        self.analyze_with(dist, None)
    }

    fn analyze_with(
        &self,
        dist: &DistanceMatrix,
        graph: Option<&Graph>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let cfg = &self.config;
        let n = dist.order();
        let by_distance = cfg.count_lines_by_distance;
        let bridges = cfg.count_bridges && graph.is_some();

        let mut lines = LineCollection::for_capacity(cfg.capacity);
        let mut split = by_distance.then(|| {
            [
                LineCollection::for_capacity(cfg.capacity),
                LineCollection::for_capacity(cfg.capacity),
                LineCollection::for_capacity(cfg.capacity),
            ]
        });
        let mut num_universal = 0usize;
        let mut num_universal_dist1 = 0usize;
        let mut num_universal_dist2 = 0usize;
        let mut num_line_pairs = 0usize;
        let mut num_bridges = 0usize;

        if cfg.verbose {
            let dedup = if lines.is_bitmap() { "bitmap" } else { "hash" };
            info!(target: "linespace::lines", n, diameter = ?dist.diameter(), dedup, "space");
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let d = dist.get(i, j);
                if !dist.is_reachable(i, j) {
                    return Err(AnalysisError::Disconnected { i, j });
                }

                let line = line_through(dist, i, j);
                let universal = line.is_universal(n);
                if cfg.verbose {
                    info!(
                        target: "linespace::lines",
                        i,
                        j,
                        d,
                        points = line.point_count(),
                        universal,
                        "line {line}"
                    );
                }

                if (cfg.include_universal_in_lines || !universal) && cfg.in_line_range(d) {
                    num_line_pairs += 1;
                    lines.insert(line);
                }

                if let Some(split) = split.as_mut() {
                    let bucket = match d {
                        1 => 0,
                        2 => 1,
                        _ => 2,
                    };
                    split[bucket].insert(line);
                }

                if bridges && d == 1 {
                    if let Some(graph) = graph {
                        if is_bridge(graph, i, j) {
                            num_bridges += 1;
                        }
                    }
                }

                if universal {
                    if cfg.skip_spaces_with_universal_line {
                        return Err(AnalysisError::UniversalLine { i, j });
                    }
                    if cfg.in_universal_range(d) {
                        num_universal += 1;
                        match d {
                            1 => num_universal_dist1 += 1,
                            2 => num_universal_dist2 += 1,
                            _ => {}
                        }
                    }
                }
            }
        }

        if cfg.verbose && lines.is_empty() {
            let (dmin, dmax) = (cfg.dmin, cfg.dmax);
            info!(target: "linespace::lines", dmin, dmax, "no pair in the line range");
        }
        let num_lines = lines.len();
        let [dist1, dist2, other] = match split {
            Some([a, b, c]) => [Some(a.len()), Some(b.len()), Some(c.len())],
            None => [None, None, None],
        };

        Ok(AnalysisResult {
            num_vertices: n,
            num_lines,
            num_lines_dist1: dist1,
            num_lines_dist2: dist2,
            num_lines_other: other,
            num_universal,
            num_universal_dist1,
            num_universal_dist2,
            num_line_pairs,
            num_bridges: bridges.then_some(num_bridges),
            amrz_gap: amrz_gap(num_lines, num_universal, n),
        })
    }
}

/// `num_lines + num_universal - num_vertices`.
#[inline]
pub fn amrz_gap(num_lines: usize, num_universal: usize, num_vertices: usize) -> i64 {
    (num_lines + num_universal) as i64 - num_vertices as i64
}

// ============================================================================
// Tests
// ============================================================================
