use thiserror::Error;

/// Position in the DP matrix: (graph column, query row).
///
/// Column 0 is the start sentinel and the last column is the end sentinel.
/// Row 0 is the empty query prefix; row j corresponds to query[j-1].
pub type MatrixPosition = (usize, usize);

/// A seed hit provided by an external indexer.
///
/// `sequence_position` is a 0-based offset into the query, `node_pos` a
/// 0-based offset into the node's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHit {
    pub sequence_position: usize,
    pub node_id: i64,
    pub node_pos: usize,
}

impl SeedHit {
    pub fn new(sequence_position: usize, node_id: i64, node_pos: usize) -> Self {
        Self {
            sequence_position,
            node_id,
            node_pos,
        }
    }
}

/// Error kinds surfaced to callers. None of these panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignError {
    /// The graph grew past the column index width.
    #[error("graph exceeds the column index capacity")]
    GraphOverflow,

    /// Mutation was attempted after `finalize`, or `finalize` ran twice.
    #[error("graph is already finalized")]
    GraphFinalized,

    /// An edge endpoint references a node id that was never added.
    #[error("unknown node id {id}")]
    UnknownNode { id: i64 },

    /// A node was added with an empty sequence.
    #[error("node {id} has an empty sequence")]
    EmptyNode { id: i64 },

    /// A seed references a node id that is not in the graph.
    #[error("seed references unknown node id {id}")]
    UnknownSeedNode { id: i64 },

    /// Some query row ended up with no live non-sentinel band cell.
    /// Retrying with a larger bandwidth may succeed.
    #[error("band collapsed at query row {row}")]
    BandCollapsed { row: usize },

    /// Cooperative cancellation was observed at a slice boundary.
    #[error("alignment cancelled")]
    Cancelled,
}
