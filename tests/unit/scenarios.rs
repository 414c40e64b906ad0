//! End-to-end alignment scenarios with pinned paths and scores
//!
//! Scoring throughout: match +1, mismatch -1, gap open -1, gap extend -1.

use rust_graph_align::api::aligner::{AlignerParams, GraphAligner};
use rust_graph_align::common::{AlignError, SeedHit};
use rust_graph_align::core::alignment_graph::AlignmentGraph;

fn build_graph(nodes: &[(i64, &str)], edges: &[(i64, i64)]) -> AlignmentGraph {
    let mut graph = AlignmentGraph::new();
    for &(id, seq) in nodes {
        graph.add_node(id, seq, false).unwrap();
    }
    for &(from, to) in edges {
        graph.add_edge(from, to).unwrap();
    }
    graph.finalize().unwrap();
    graph
}

fn aligner(nodes: &[(i64, &str)], edges: &[(i64, i64)]) -> GraphAligner {
    GraphAligner::new(build_graph(nodes, edges), AlignerParams::default()).unwrap()
}

fn path_ids(aligner: &GraphAligner, name: &str, query: &str) -> (Vec<i64>, i32) {
    let alignment = aligner.align_one_way(name, query, &[]).unwrap();
    let record = alignment.record().expect("expected a mapped alignment");
    assert_eq!(record.name, name);
    assert_eq!(record.sequence, query);
    let ids = record.path.iter().map(|m| m.node_id).collect();
    let ranks: Vec<usize> = record.path.iter().map(|m| m.rank).collect();
    assert_eq!(ranks, (0..record.path.len()).collect::<Vec<_>>());
    (ids, record.score)
}

#[test]
fn straight_match() {
    let aligner = aligner(&[(1, "ACGT")], &[]);
    let (ids, score) = path_ids(&aligner, "read", "ACGT");
    assert_eq!(ids, vec![1]);
    assert_eq!(score, 4);
}

#[test]
fn single_snp() {
    let aligner = aligner(&[(1, "ACGT")], &[]);
    let (ids, score) = path_ids(&aligner, "read", "ACCT");
    assert_eq!(ids, vec![1]);
    assert_eq!(score, 2);
}

#[test]
fn branch_selection() {
    let aligner = aligner(&[(1, "AC"), (2, "GT"), (3, "GG")], &[(1, 2), (1, 3)]);
    let (ids, score) = path_ids(&aligner, "read", "ACGT");
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(score, 4);
}

#[test]
fn back_edge_cycle() {
    let aligner = aligner(&[(1, "AC"), (2, "GT")], &[(1, 2), (2, 1)]);
    let (ids, score) = path_ids(&aligner, "read", "ACGTAC");
    assert_eq!(ids, vec![1, 2, 1]);
    assert_eq!(score, 6);
}

#[test]
fn gap_on_query() {
    let aligner = aligner(&[(1, "ACGTAC")], &[]);
    let (ids, score) = path_ids(&aligner, "read", "ACTAC");
    assert_eq!(ids, vec![1]);
    assert_eq!(score, 4);
}

#[test]
fn seeded_skip_of_prefix() {
    let graph = build_graph(&[(1, "AAAA"), (2, "CGT")], &[(1, 2)]);
    let params = AlignerParams {
        initial_bandwidth: 2,
        ramp_bandwidth: 2,
        // static banding only
        dynamic_row_start: usize::MAX,
        ..AlignerParams::default()
    };
    let aligner = GraphAligner::new(graph, params).unwrap();

    let seeds = [SeedHit::new(0, 2, 0)];
    let alignment = aligner.align_one_way("read", "CGT", &seeds).unwrap();
    let record = alignment.record().expect("seeded alignment must map");
    let ids: Vec<i64> = record.path.iter().map(|m| m.node_id).collect();
    assert_eq!(ids, vec![2]);
    assert_eq!(record.score, 3);

    // without the seed the static band never forms
    let unseeded = aligner.align_one_way("read", "CGT", &[]);
    assert_eq!(unseeded, Err(AlignError::BandCollapsed { row: 1 }));
}
