//! End-to-end stream tests: decode, analyze, filter and emit.

use linespace::analysis::{AnalysisConfig, AnalysisResult, MetricSpaceAnalyzer};
use linespace::codec::{write_adjacency_rows, AdjacencyCodec, DistanceCodec};
use linespace::expand::{CombinatorialExpander, ExpansionStrategy};
use linespace::graph::Graph;
use linespace::pipeline::{
    dump_distances, expand_stream, OutputMode, Pipeline, PipelineError, PipelineOptions,
    RecordFormat,
};
use pretty_assertions::assert_eq;

const PATH3: &str = "010 101 010";
const TRIANGLE: &str = "011 101 110";
const PENTAGON: &str = "01001 10100 01010 00101 10010";
const TWO_TRIANGLES: &str = "011000 101000 110000 000011 000101 000110";

fn json_results(config: AnalysisConfig, input: &str) -> Vec<AnalysisResult> {
    let analyzer = MetricSpaceAnalyzer::new(config).unwrap();
    let options = PipelineOptions {
        format: RecordFormat::Json,
        ..PipelineOptions::default()
    };
    let mut out = Vec::new();
    Pipeline::new(&analyzer, AdjacencyCodec, options)
        .run(input.as_bytes(), &mut out)
        .unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn worked_examples() {
    let config = AnalysisConfig {
        count_bridges: true,
        ..AnalysisConfig::default()
    };
    let results = json_results(config, &format!("{PATH3}\n{TRIANGLE}\n"));
    assert_eq!(
        results,
        vec![
            AnalysisResult {
                num_vertices: 3,
                num_lines: 1,
                num_universal: 3,
                num_universal_dist1: 2,
                num_universal_dist2: 1,
                num_line_pairs: 3,
                num_bridges: Some(2),
                amrz_gap: 1,
                ..AnalysisResult::default()
            },
            AnalysisResult {
                num_vertices: 3,
                num_lines: 3,
                num_universal: 0,
                num_line_pairs: 3,
                num_bridges: Some(0),
                amrz_gap: 0,
                ..AnalysisResult::default()
            },
        ]
    );
}

#[test]
fn disconnected_item_does_not_stop_the_stream() {
    let results = json_results(
        AnalysisConfig::default(),
        &format!("{TWO_TRIANGLES}\n{PENTAGON}\n"),
    );
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].num_vertices, 5);
    assert_eq!(results[0].amrz_gap, 5);
}

#[test]
fn capacity_plus_one_aborts_before_output() {
    let capacity = 6;
    let config = AnalysisConfig {
        capacity,
        ..AnalysisConfig::default()
    };
    let analyzer = MetricSpaceAnalyzer::new(config).unwrap();
    let big = write_adjacency_rows(&Graph::complete(capacity + 1).unwrap());
    let mut out = Vec::new();
    let err = Pipeline::new(&analyzer, AdjacencyCodec, PipelineOptions::default())
        .run(format!("{big}\n{TRIANGLE}\n").as_bytes(), &mut out)
        .unwrap_err();
    assert!(matches!(err, PipelineError::CapacityExceeded { line: 1, .. }));
    assert!(err.to_string().contains("capacity is 6"));
    assert!(out.is_empty());
}

#[test]
fn self_loop_aborts() {
    let analyzer = MetricSpaceAnalyzer::new(AnalysisConfig::default()).unwrap();
    let mut out = Vec::new();
    let err = Pipeline::new(&analyzer, AdjacencyCodec, PipelineOptions::default())
        .run("010 111 010\n".as_bytes(), &mut out)
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedGraph { line: 1, .. }));
    assert!(out.is_empty());
}

#[test]
fn expansions_feed_the_analyzer() {
    let expander = CombinatorialExpander::new(ExpansionStrategy::AllSubsets, 2);
    let mut expanded = Vec::new();
    let summary = expand_stream(
        &AdjacencyCodec,
        &expander,
        format!("{PENTAGON}\n").as_bytes(),
        &mut expanded,
    )
    .unwrap();
    assert_eq!(summary.emitted, 26);

    let analyzer = MetricSpaceAnalyzer::new(AnalysisConfig {
        skip_spaces_with_universal_line: true,
        ..AnalysisConfig::default()
    })
    .unwrap();
    let options = PipelineOptions {
        output: OutputMode::Graph,
        batch_size: 4,
        ..PipelineOptions::default()
    };
    let mut kept = Vec::new();
    let summary = Pipeline::new(&analyzer, AdjacencyCodec, options)
        .run(expanded.as_slice(), &mut kept)
        .unwrap();
    assert_eq!(summary.processed, 26);
    assert_eq!(summary.processed, summary.emitted + summary.skipped);

    // Every kept graph re-analyzes without a universal line.
    let kept = String::from_utf8(kept).unwrap();
    for line in kept.lines() {
        let graph = linespace::codec::parse_adjacency_rows(line).unwrap();
        assert!(analyzer.analyze(&graph).is_ok());
    }
}

#[test]
fn distance_dump_feeds_metric_analysis() {
    let mut dumped = Vec::new();
    dump_distances(
        &AdjacencyCodec,
        format!("{PENTAGON}\n{PATH3}\n").as_bytes(),
        &mut dumped,
        8,
    )
    .unwrap();

    let analyzer = MetricSpaceAnalyzer::new(AnalysisConfig::default()).unwrap();
    let mut out = Vec::new();
    Pipeline::new(&analyzer, DistanceCodec, PipelineOptions::default())
        .run(dumped.as_slice(), &mut out)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!("5,10,0,10,,5,{PENTAGON}\n3,1,3,3,,1,{PATH3}\n")
    );
}
