//! Flat alignment graph index
//!
//! Packs every node sequence into one contiguous base string so that a DP
//! cell can be addressed by a plain column index. Two sentinel nodes of one
//! neutral base each bracket the real columns: the start sentinel is always
//! column 0 and the end sentinel is appended by `finalize`. The sentinel
//! base matches nothing under the IUPAC comparator.
//!
//! Nodes are append-only and keep their insertion order. A node whose
//! in-edge originates from a node at the same or a later insertion index is
//! flagged `not_in_order`; the DP kernel selects the slow graph-gap
//! recurrence for the first column of such nodes.

use rustc_hash::FxHashMap;

use crate::common::AlignError;

/// Index into the node table.
pub type NodeIndex = usize;

/// Base stored in the sentinel columns. Its IUPAC set is empty, so it
/// mismatches every query base.
pub const SENTINEL_BASE: u8 = b'-';

/// Hard cap on the total column count (the column index width).
pub const MAX_COLUMNS: usize = u32::MAX as usize;

pub struct AlignmentGraph {
    node_start: Vec<usize>,
    node_end: Vec<usize>,
    index_to_node: Vec<NodeIndex>,
    node_lookup: FxHashMap<i64, NodeIndex>,
    node_ids: Vec<i64>,
    node_reverse: Vec<bool>,
    in_neighbors: Vec<Vec<NodeIndex>>,
    out_neighbors: Vec<Vec<NodeIndex>>,
    node_sequences: Vec<u8>,
    not_in_order: Vec<bool>,
    dummy_node_start: usize,
    dummy_node_end: usize,
    finalized: bool,
}

impl AlignmentGraph {
    /// Creates a graph holding only the start sentinel at column 0.
    pub fn new() -> Self {
        let mut graph = Self {
            node_start: Vec::new(),
            node_end: Vec::new(),
            index_to_node: Vec::new(),
            node_lookup: FxHashMap::default(),
            node_ids: Vec::new(),
            node_reverse: Vec::new(),
            in_neighbors: Vec::new(),
            out_neighbors: Vec::new(),
            node_sequences: Vec::new(),
            not_in_order: Vec::new(),
            dummy_node_start: 0,
            dummy_node_end: 0,
            finalized: false,
        };
        graph.dummy_node_start = graph.node_sequences.len();
        graph.push_node(0, &[SENTINEL_BASE], false);
        graph
    }

    fn push_node(&mut self, id: i64, sequence: &[u8], reverse: bool) {
        self.node_ids.push(id);
        self.node_start.push(self.node_sequences.len());
        self.in_neighbors.push(Vec::new());
        self.out_neighbors.push(Vec::new());
        self.node_sequences.extend_from_slice(sequence);
        self.index_to_node
            .resize(self.node_sequences.len(), self.node_start.len() - 1);
        self.node_end.push(self.node_sequences.len());
        self.node_reverse.push(reverse);
        self.not_in_order.push(false);
        debug_assert_eq!(self.node_ids.len(), self.node_start.len());
        debug_assert_eq!(self.node_start.len(), self.node_end.len());
        debug_assert_eq!(self.node_end.len(), self.in_neighbors.len());
        debug_assert_eq!(self.in_neighbors.len(), self.out_neighbors.len());
        debug_assert_eq!(self.node_sequences.len(), self.index_to_node.len());
    }

    /// Appends a node. Duplicate ids are silently ignored; sequences are
    /// stored upper-cased.
    pub fn add_node(&mut self, id: i64, sequence: &str, reverse: bool) -> Result<(), AlignError> {
        if self.finalized {
            return Err(AlignError::GraphFinalized);
        }
        if self.node_lookup.contains_key(&id) {
            return Ok(());
        }
        if sequence.is_empty() {
            return Err(AlignError::EmptyNode { id });
        }
        // +1 keeps room for the end sentinel column
        if self.node_sequences.len() + sequence.len() + 1 > MAX_COLUMNS {
            return Err(AlignError::GraphOverflow);
        }
        self.node_lookup.insert(id, self.node_start.len());
        let upper: Vec<u8> = sequence.bytes().map(|b| b.to_ascii_uppercase()).collect();
        self.push_node(id, &upper, reverse);
        Ok(())
    }

    /// Adds a directed edge between two previously added nodes. Duplicate
    /// edges are silently ignored. An edge whose source is at the same or a
    /// later insertion index flags the target as out-of-order.
    pub fn add_edge(&mut self, from_id: i64, to_id: i64) -> Result<(), AlignError> {
        if self.finalized {
            return Err(AlignError::GraphFinalized);
        }
        let from = *self
            .node_lookup
            .get(&from_id)
            .ok_or(AlignError::UnknownNode { id: from_id })?;
        let to = *self
            .node_lookup
            .get(&to_id)
            .ok_or(AlignError::UnknownNode { id: to_id })?;
        if self.in_neighbors[to].contains(&from) {
            return Ok(());
        }
        self.in_neighbors[to].push(from);
        self.out_neighbors[from].push(to);
        if from >= to {
            self.not_in_order[to] = true;
        }
        Ok(())
    }

    /// Appends the end sentinel and freezes the graph.
    pub fn finalize(&mut self) -> Result<(), AlignError> {
        if self.finalized {
            return Err(AlignError::GraphFinalized);
        }
        self.dummy_node_end = self.node_sequences.len();
        self.push_node(0, &[SENTINEL_BASE], false);
        self.finalized = true;
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Total number of columns, sentinels included.
    pub fn size_in_bp(&self) -> usize {
        self.node_sequences.len()
    }

    /// Number of nodes, sentinels included.
    pub fn node_count(&self) -> usize {
        self.node_start.len()
    }

    /// True when the graph holds nothing besides the two sentinels.
    pub fn is_empty(&self) -> bool {
        self.finalized && self.node_count() == 2
    }

    /// Column of the start sentinel (always 0).
    pub fn dummy_node_start(&self) -> usize {
        self.dummy_node_start
    }

    /// Column of the end sentinel (the last column).
    pub fn dummy_node_end(&self) -> usize {
        self.dummy_node_end
    }

    pub fn is_sentinel_column(&self, w: usize) -> bool {
        w == self.dummy_node_start || w == self.dummy_node_end
    }

    pub fn is_sentinel_node(&self, n: NodeIndex) -> bool {
        n == 0 || (self.finalized && n == self.node_count() - 1)
    }

    /// Node containing column `w`.
    #[inline]
    pub fn node_of(&self, w: usize) -> NodeIndex {
        self.index_to_node[w]
    }

    #[inline]
    pub fn node_start(&self, n: NodeIndex) -> usize {
        self.node_start[n]
    }

    #[inline]
    pub fn node_end(&self, n: NodeIndex) -> usize {
        self.node_end[n]
    }

    #[inline]
    pub fn node_len(&self, n: NodeIndex) -> usize {
        self.node_end[n] - self.node_start[n]
    }

    pub fn node_id(&self, n: NodeIndex) -> i64 {
        self.node_ids[n]
    }

    pub fn node_reverse(&self, n: NodeIndex) -> bool {
        self.node_reverse[n]
    }

    #[inline]
    pub fn not_in_order(&self, n: NodeIndex) -> bool {
        self.not_in_order[n]
    }

    #[inline]
    pub fn in_neighbors(&self, n: NodeIndex) -> &[NodeIndex] {
        &self.in_neighbors[n]
    }

    #[inline]
    pub fn out_neighbors(&self, n: NodeIndex) -> &[NodeIndex] {
        &self.out_neighbors[n]
    }

    #[inline]
    pub fn base_at(&self, w: usize) -> u8 {
        self.node_sequences[w]
    }

    /// Node index for an external id, if present.
    pub fn lookup_node(&self, id: i64) -> Option<NodeIndex> {
        self.node_lookup.get(&id).copied()
    }
}

impl Default for AlignmentGraph {
    fn default() -> Self {
        Self::new()
    }
}
