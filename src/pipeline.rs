//! Stream drivers: read one space per line, process it, write results.
//!
//! Items are processed in batches on the rayon pool and written back in
//! input order. Expansion is the exception: it streams candidates of one
//! graph at a time. A fatal error stops the run at the failing item;
//! everything before it has already been written.

use crate::analysis::{AnalysisError, AnalysisResult, MetricSpaceAnalyzer};
use crate::codec::{CodecError, GraphCodec, Space};
use crate::distance::distance_matrix;
use crate::expand::CombinatorialExpander;
use crate::graph::GraphError;
use rayon::prelude::*;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default number of lines read per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

// ============================================================================
// Options
// ============================================================================

/// What is written for each emitted space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// The re-encoded space, for chaining filter stages.
    Graph,
    /// The analysis record.
    #[default]
    Record,
    /// The record followed by the re-encoded space.
    Both,
}

/// Encoding of analysis records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordFormat {
    /// Comma-separated values, see [`csv_header`].
    #[default]
    Csv,
    /// One JSON object per line.
    Json,
}

/// Conditions a result must meet to be emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitFilter {
    /// Only emit spaces with fewer lines than points.
    pub fewer_lines_only: bool,
    /// Only emit spaces whose AMRZ gap is at most this value.
    pub max_gap: Option<i64>,
}

impl EmitFilter {
    /// Returns `true` if `result` passes every condition.
    pub fn accepts(&self, result: &AnalysisResult) -> bool {
        if self.fewer_lines_only && result.num_lines >= result.num_vertices {
            return false;
        }
        if let Some(max_gap) = self.max_gap {
            if result.amrz_gap > max_gap {
                return false;
            }
        }
        true
    }
}

/// Options of an analysis run.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// What to write per emitted space.
    pub output: OutputMode,
    /// Record encoding.
    pub format: RecordFormat,
    /// Emission conditions.
    pub filter: EmitFilter,
    /// Write a CSV header before the first record.
    pub header: bool,
    /// Lines per parallel batch.
    pub batch_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output: OutputMode::default(),
            format: RecordFormat::default(),
            filter: EmitFilter::default(),
            header: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

// ============================================================================
// Errors and summary
// ============================================================================

/// Errors that end a run. `line` is the 1-based input line number.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A line could not be decoded.
    #[error("line {line}: cannot decode input: {source}")]
    InputFormat {
        /// Input line number.
        line: usize,
        /// Decoder error.
        source: CodecError,
    },
    /// A decoded graph has a self-loop.
    #[error("line {line}: unsupported graph: {source}")]
    UnsupportedGraph {
        /// Input line number.
        line: usize,
        /// Decoder error.
        source: CodecError,
    },
    /// A space is larger than the configured capacity.
    #[error("line {line}: {source}")]
    CapacityExceeded {
        /// Input line number.
        line: usize,
        /// Analyzer error.
        source: AnalysisError,
    },
    /// A space could not be re-encoded.
    #[error("line {line}: cannot encode output: {source}")]
    Encode {
        /// Input line number.
        line: usize,
        /// Encoder error.
        source: CodecError,
    },
    /// A graph operation failed (e.g. expanding a full graph).
    #[error("line {line}: {source}")]
    Graph {
        /// Input line number.
        line: usize,
        /// Graph error.
        source: GraphError,
    },
    /// A graph was required but the input was an explicit metric.
    #[error("line {line}: expected a graph, found an explicit metric")]
    NotAGraph {
        /// Input line number.
        line: usize,
    },
    /// JSON serialization failed.
    #[error("cannot serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Counters reported at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Input items read.
    pub processed: u64,
    /// Output lines written.
    pub emitted: u64,
    /// Items that were not analyzable.
    pub skipped: u64,
    /// Wall-clock time.
    pub elapsed: Duration,
}

/// Result of processing one input item.
enum Outcome {
    /// Lines to write, in order.
    Emit(Vec<String>),
    /// Analyzed but rejected by the emit filter.
    Filtered,
    /// Not analyzable.
    Skipped,
}

// ============================================================================
// Line reading
// ============================================================================

/// Reads up to `limit` non-blank lines, tagging each with its line number.
fn read_batch<R: BufRead>(
    input: &mut R,
    line_no: &mut usize,
    limit: usize,
) -> io::Result<Vec<(usize, String)>> {
    let mut batch = Vec::with_capacity(limit);
    let mut buf = String::new();
    while batch.len() < limit {
        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            break;
        }
        *line_no += 1;
        let trimmed = buf.trim();
        if !trimmed.is_empty() {
            batch.push((*line_no, trimmed.to_string()));
        }
    }
    Ok(batch)
}

/// Decodes one line, classifying decoder errors.
fn decode<C: GraphCodec>(codec: &C, line: usize, text: &str) -> Result<Space, PipelineError> {
    codec.decode(text).map_err(|source| {
        if source.is_unsupported_graph() {
            PipelineError::UnsupportedGraph { line, source }
        } else {
            PipelineError::InputFormat { line, source }
        }
    })
}

/// Runs `process` over `input` batch by batch and writes the outcomes in order.
fn drive<R, W, F>(
    mut input: R,
    mut output: W,
    batch_size: usize,
    process: F,
) -> Result<RunSummary, PipelineError>
where
    R: BufRead,
    W: Write,
    F: Fn(usize, &str) -> Result<Outcome, PipelineError> + Sync,
{
    let start = Instant::now();
    let mut summary = RunSummary::default();
    let mut line_no = 0usize;

    loop {
        let batch = read_batch(&mut input, &mut line_no, batch_size.max(1))?;
        if batch.is_empty() {
            break;
        }
        let outcomes: Vec<Result<Outcome, PipelineError>> = batch
            .par_iter()
            .map(|(line, text)| process(*line, text))
            .collect();

        for outcome in outcomes {
            summary.processed += 1;
            match outcome {
                Ok(Outcome::Emit(lines)) => {
                    for line in lines {
                        writeln!(output, "{line}")?;
                        summary.emitted += 1;
                    }
                }
                Ok(Outcome::Filtered) => {}
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    output.flush()?;
                    return Err(e);
                }
            }
        }
    }

    output.flush()?;
    summary.elapsed = start.elapsed();
    Ok(summary)
}

// ============================================================================
// Analysis run
// ============================================================================

/// Decodes, analyzes and emits every space of a stream.
pub struct Pipeline<'a, C> {
    analyzer: &'a MetricSpaceAnalyzer,
    codec: C,
    options: PipelineOptions,
}

impl<'a, C: GraphCodec> Pipeline<'a, C> {
    /// Creates a pipeline.
    pub fn new(analyzer: &'a MetricSpaceAnalyzer, codec: C, options: PipelineOptions) -> Self {
        Self {
            analyzer,
            codec,
            options,
        }
    }

    /// Processes every non-blank line of `input`, writing to `output`.
    ///
    /// # Errors
    /// Returns the first fatal error: bad input, a self-loop, a space above
    /// capacity, or an I/O failure. Disconnected spaces and spaces rejected
    /// for having a universal line are skipped.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: R,
        mut output: W,
    ) -> Result<RunSummary, PipelineError> {
        if self.options.header
            && self.options.format == RecordFormat::Csv
            && self.options.output != OutputMode::Graph
        {
            writeln!(output, "{}", csv_header(self.analyzer.config().count_lines_by_distance))?;
        }
        drive(input, output, self.options.batch_size, |line, text| {
            self.process(line, text)
        })
    }

    fn process(&self, line: usize, text: &str) -> Result<Outcome, PipelineError> {
        // A space too wide for the decoder is also above every capacity.
        let space = match decode(&self.codec, line, text) {
            Err(PipelineError::InputFormat {
                source: CodecError::TooManyVertices { n },
                ..
            }) => {
                let capacity = self.analyzer.config().capacity;
                return Err(PipelineError::CapacityExceeded {
                    line,
                    source: AnalysisError::CapacityExceeded { n, capacity },
                });
            }
            decoded => decoded?,
        };
        self.analyzer
            .check_capacity(space.order())
            .map_err(|source| PipelineError::CapacityExceeded { line, source })?;

        let analyzed = match &space {
            Space::Graph(graph) => self.analyzer.analyze(graph),
            Space::Metric { dist, .. } => self.analyzer.analyze_distances(dist),
        };
        let result = match analyzed {
            Ok(result) => result,
            Err(source) if source.is_fatal() => {
                return Err(PipelineError::CapacityExceeded { line, source });
            }
            Err(reason) => {
                debug!(line, %reason, "skipping space");
                return Ok(Outcome::Skipped);
            }
        };

        if !self.options.filter.accepts(&result) {
            return Ok(Outcome::Filtered);
        }

        let label = match &space {
            Space::Metric { label, .. } => label.as_deref(),
            Space::Graph(_) => None,
        };
        let encoded = match self.options.output {
            OutputMode::Record => None,
            OutputMode::Graph | OutputMode::Both => Some(
                self.codec
                    .encode(&space)
                    .map_err(|source| PipelineError::Encode { line, source })?,
            ),
        };
        let by_distance = self.analyzer.config().count_lines_by_distance;
        let emitted = match (self.options.output, encoded) {
            (OutputMode::Graph, Some(encoded)) => encoded,
            (OutputMode::Both, Some(encoded)) => match self.options.format {
                RecordFormat::Csv => format!("{},{encoded}", csv_record(&result, by_distance)),
                RecordFormat::Json => serde_json::to_string(&JsonRecord {
                    result: &result,
                    label,
                    space: Some(&encoded),
                })?,
            },
            _ => match self.options.format {
                RecordFormat::Csv => {
                    let mut record = csv_record(&result, by_distance);
                    if let Some(label) = label {
                        record.push(',');
                        record.push_str(label);
                    }
                    record
                }
                RecordFormat::Json => serde_json::to_string(&JsonRecord {
                    result: &result,
                    label,
                    space: None,
                })?,
            },
        };
        Ok(Outcome::Emit(vec![emitted]))
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(flatten)]
    result: &'a AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    space: Option<&'a str>,
}

// ============================================================================
// Records
// ============================================================================

/// Column names of [`csv_record`].
pub fn csv_header(by_distance: bool) -> String {
    let mut header =
        String::from("num_vertices,num_lines,num_universal,num_line_pairs,num_bridges,amrz_gap");
    if by_distance {
        header.push_str(",num_lines_dist1,num_lines_dist2,num_lines_other");
        header.push_str(",num_universal_dist1,num_universal_dist2");
    }
    header
}

/// Formats `result` as one CSV row. `num_bridges` is empty when not counted.
pub fn csv_record(result: &AnalysisResult, by_distance: bool) -> String {
    let optional = |v: Option<usize>| v.map(|v| v.to_string()).unwrap_or_default();
    let mut record = format!(
        "{},{},{},{},{},{}",
        result.num_vertices,
        result.num_lines,
        result.num_universal,
        result.num_line_pairs,
        optional(result.num_bridges),
        result.amrz_gap
    );
    if by_distance {
        record.push_str(&format!(
            ",{},{},{},{},{}",
            optional(result.num_lines_dist1),
            optional(result.num_lines_dist2),
            optional(result.num_lines_other),
            result.num_universal_dist1,
            result.num_universal_dist2
        ));
    }
    record
}

// ============================================================================
// Other stream tools
// ============================================================================

/// Writes, for every input graph, its distance list followed by the graph's
/// own encoding: `n d(0,1) … d(n-2,n-1) <graph>`.
///
/// # Errors
/// Fails on undecodable input, explicit metrics, or I/O errors.
pub fn dump_distances<C, R, W>(
    codec: &C,
    input: R,
    output: W,
    batch_size: usize,
) -> Result<RunSummary, PipelineError>
where
    C: GraphCodec,
    R: BufRead,
    W: Write,
{
    drive(input, output, batch_size, |line, text| {
        let space = decode(codec, line, text)?;
        let Space::Graph(graph) = &space else {
            return Err(PipelineError::NotAGraph { line });
        };
        let encoded = codec
            .encode(&space)
            .map_err(|source| PipelineError::Encode { line, source })?;
        let dist = distance_matrix(graph);
        Ok(Outcome::Emit(vec![crate::codec::write_distance_list(
            &dist,
            Some(&encoded),
        )]))
    })
}

/// Writes every candidate extension of every input graph.
///
/// Input graphs are taken one at a time and candidates are written as the
/// expander yields them, so memory stays flat even for `2^n` enumerations.
///
/// # Errors
/// Fails on undecodable input, explicit metrics, graphs the expander
/// refuses, or I/O errors.
pub fn expand_stream<C, R, W>(
    codec: &C,
    expander: &CombinatorialExpander,
    mut input: R,
    mut output: W,
) -> Result<RunSummary, PipelineError>
where
    C: GraphCodec,
    R: BufRead,
    W: Write,
{
    let start = Instant::now();
    let mut summary = RunSummary::default();
    let mut line_no = 0usize;

    while let Some((line, text)) = read_batch(&mut input, &mut line_no, 1)?.pop() {
        summary.processed += 1;
        let Space::Graph(graph) = decode(codec, line, &text)? else {
            return Err(PipelineError::NotAGraph { line });
        };
        let candidates = expander
            .expand(&graph)
            .map_err(|source| PipelineError::Graph { line, source })?;
        for candidate in candidates {
            let encoded = codec
                .encode(&Space::Graph(candidate))
                .map_err(|source| PipelineError::Encode { line, source })?;
            writeln!(output, "{encoded}")?;
            summary.emitted += 1;
        }
    }

    output.flush()?;
    summary.elapsed = start.elapsed();
    Ok(summary)
}

// ============================================================================
// Tests
// ============================================================================
