//! Fast deterministic self-check on small spaces with known line structure.

use crate::analysis::{AnalysisConfig, AnalysisError, MetricSpaceAnalyzer};
use crate::codec::parse_adjacency_rows;

// ============================================================================
// Public API
// ============================================================================

/// A bundled case: adjacency rows and the expected
/// `(num_lines, num_universal, amrz_gap, num_bridges)`, or `None` when the
/// space must be rejected as disconnected.
const KNOWN_CASES: &[(&str, &str, Option<(usize, usize, i64, usize)>)] = &[
    ("path P3", "010 101 010", Some((1, 3, 1, 2))),
    ("triangle K3", "011 101 110", Some((3, 0, 0, 0))),
    ("pentagon C5", "01001 10100 01010 00101 10010", Some((10, 0, 5, 0))),
    ("square C4", "0101 1010 0101 1010", Some((1, 6, 3, 0))),
    ("two triangles", "011000 101000 110000 000011 000101 000110", None),
];

/// Validates the analyzer against the bundled cases:
/// - the path on 3 vertices has one line, three universal pairs, two bridges;
/// - the triangle has three two-point lines and no universal pair;
/// - the 5-cycle has ten lines and an AMRZ gap of 5;
/// - the 4-cycle has only the universal line;
/// - two disjoint triangles are not analyzable.
///
/// # Errors
/// Returns a message naming the first case that disagrees.
pub fn validate_known_spaces() -> Result<(), String> {
    let analyzer = MetricSpaceAnalyzer::new(AnalysisConfig {
        count_bridges: true,
        ..AnalysisConfig::default()
    })
    .map_err(|e| e.to_string())?;

    for &(name, rows, expected) in KNOWN_CASES {
        validate_case(&analyzer, name, rows, expected)?;
    }
    Ok(())
}

// ============================================================================
// Internal
// ============================================================================

fn validate_case(
    analyzer: &MetricSpaceAnalyzer,
    name: &str,
    rows: &str,
    expected: Option<(usize, usize, i64, usize)>,
) -> Result<(), String> {
    let graph = parse_adjacency_rows(rows).map_err(|e| format!("{name}: {e}"))?;
    let outcome = analyzer.analyze(&graph);

    match (expected, outcome) {
        (Some((lines, universal, gap, bridges)), Ok(r)) => {
            let got = (r.num_lines, r.num_universal, r.amrz_gap, r.num_bridges.unwrap_or(0));
            if got != (lines, universal, gap, bridges) {
                return Err(format!(
                    "{name}: expected (lines, universal, gap, bridges) = {:?}, got {got:?}",
                    (lines, universal, gap, bridges)
                ));
            }
            Ok(())
        }
        (None, Err(AnalysisError::Disconnected { .. })) => Ok(()),
        (None, Ok(r)) => Err(format!(
            "{name}: expected a disconnected space, but it was analyzed with {} lines",
            r.num_lines
        )),
        (_, Err(e)) => Err(format!("{name}: {e}")),
    }
}

// ============================================================================
// Tests
// ============================================================================
