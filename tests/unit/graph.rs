//! Graph construction and error propagation through the aligner facade

use rust_graph_align::api::aligner::{AlignerParams, GraphAligner};
use rust_graph_align::common::{AlignError, SeedHit};
use rust_graph_align::core::alignment_graph::AlignmentGraph;

fn single_node_aligner() -> GraphAligner {
    let mut graph = AlignmentGraph::new();
    graph.add_node(1, "ACGT", false).unwrap();
    graph.finalize().unwrap();
    GraphAligner::new(graph, AlignerParams::default()).unwrap()
}

#[test]
fn aligner_requires_a_finalized_graph() {
    let mut graph = AlignmentGraph::new();
    graph.add_node(1, "ACGT", false).unwrap();
    assert!(GraphAligner::new(graph, AlignerParams::default()).is_err());
}

#[test]
fn parameter_validation_rejects_zero_bandwidth() {
    let params = AlignerParams {
        initial_bandwidth: 0,
        ..AlignerParams::default()
    };
    assert!(params.validate().is_err());
}

#[test]
fn parameter_validation_rejects_ramp_below_initial() {
    let params = AlignerParams {
        initial_bandwidth: 8,
        ramp_bandwidth: 4,
        ..AlignerParams::default()
    };
    assert!(params.validate().is_err());
}

#[test]
fn unknown_seed_node_is_reported() {
    let aligner = single_node_aligner();
    let seeds = [SeedHit::new(0, 999, 0)];
    let result = aligner.align_one_way("read", "ACGT", &seeds);
    assert_eq!(result, Err(AlignError::UnknownSeedNode { id: 999 }));
}

#[test]
fn empty_query_is_an_empty_alignment() {
    let aligner = single_node_aligner();
    let alignment = aligner.align_one_way("read", "", &[]).unwrap();
    assert!(alignment.is_empty());
}

#[test]
fn sentinel_only_graph_yields_an_empty_alignment() {
    let mut graph = AlignmentGraph::new();
    graph.finalize().unwrap();
    let aligner = GraphAligner::new(graph, AlignerParams::default()).unwrap();
    let alignment = aligner.align_one_way("read", "ACGT", &[]).unwrap();
    assert!(alignment.is_empty());
}

#[test]
fn duplicate_graph_input_is_tolerated() {
    let mut graph = AlignmentGraph::new();
    graph.add_node(1, "ACGT", false).unwrap();
    graph.add_node(2, "TTTT", false).unwrap();
    graph.add_node(2, "CC", false).unwrap();
    graph.add_edge(1, 2).unwrap();
    graph.add_edge(1, 2).unwrap();
    graph.finalize().unwrap();
    let aligner = GraphAligner::new(graph, AlignerParams::default()).unwrap();
    let alignment = aligner.align_one_way("read", "ACGT", &[]).unwrap();
    let record = alignment.record().expect("mapped");
    assert_eq!(record.score, 4);
}
