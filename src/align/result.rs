//! Alignment records
//!
//! Converts a column trace into a node-granular path: consecutive columns
//! of one node coalesce into a single mapping carrying the node's external
//! id, its orientation flag and a sequential rank. Leading start-sentinel
//! columns are skipped and the walk stops on entering the end sentinel. A
//! trace that never leaves the sentinels is an empty alignment.

use crate::align::scoring::Score;
use crate::common::MatrixPosition;
use crate::core::alignment_graph::AlignmentGraph;

/// One node visit on the alignment path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// External node id
    pub node_id: i64,
    /// Orientation flag carried from the node
    pub reverse: bool,
    /// Sequential position on the path, starting at 0
    pub rank: usize,
}

/// A successful alignment of one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub name: String,
    pub score: Score,
    pub sequence: String,
    pub path: Vec<Mapping>,
    /// Largest observed displacement between the trace and the per-row
    /// score maximum, from the distance oracle
    pub max_distance_from_band: usize,
}

/// Outcome of aligning one query. An empty alignment is a success with a
/// zero-length path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alignment {
    Mapped(AlignmentRecord),
    Empty,
}

impl Alignment {
    pub fn is_empty(&self) -> bool {
        matches!(self, Alignment::Empty)
    }

    pub fn record(&self) -> Option<&AlignmentRecord> {
        match self {
            Alignment::Mapped(record) => Some(record),
            Alignment::Empty => None,
        }
    }
}

/// Builds the node path from a column trace.
pub fn trace_to_alignment(
    graph: &AlignmentGraph,
    name: &str,
    sequence: &str,
    score: Score,
    trace: &[MatrixPosition],
    max_distance_from_band: usize,
) -> Alignment {
    let start_node = graph.node_of(graph.dummy_node_start());
    let end_node = graph.node_of(graph.dummy_node_end());

    let mut pos = 0;
    let mut current_node = graph.node_of(trace[0].0);
    while current_node == start_node {
        pos += 1;
        if pos == trace.len() {
            return Alignment::Empty;
        }
        current_node = graph.node_of(trace[pos].0);
    }
    if current_node == end_node {
        return Alignment::Empty;
    }

    let mut rank = 0;
    let mut path = vec![Mapping {
        node_id: graph.node_id(current_node),
        reverse: graph.node_reverse(current_node),
        rank,
    }];
    for &(w, _) in &trace[pos..] {
        let node = graph.node_of(w);
        if node == end_node {
            break;
        }
        if node == current_node {
            continue;
        }
        current_node = node;
        rank += 1;
        path.push(Mapping {
            node_id: graph.node_id(current_node),
            reverse: graph.node_reverse(current_node),
            rank,
        });
    }

    Alignment::Mapped(AlignmentRecord {
        name: name.to_string(),
        score,
        sequence: sequence.to_string(),
        path,
        max_distance_from_band,
    })
}
