//! Sparse band over the DP matrix
//!
//! The band is a row-major sparse boolean matrix: each query row keeps a
//! sorted list of live graph columns. Membership tests binary-search the
//! row; the two sentinel columns are implicitly live in every row and are
//! never stored.
//!
//! Static construction expands seed hits laterally along the graph with a
//! bandwidth budget, then diagonally without one. Lateral expansion walks
//! the seed's node left and right, spilling into neighbouring nodes while
//! budget remains. Every laterally marked cell then expands down-right in
//! a forward accumulator and up-left in a backward accumulator, following
//! node edges at boundaries and stopping at previously live cells or the
//! matrix edge. The two accumulators are unioned per row.

use crate::common::MatrixPosition;
use crate::core::alignment_graph::AlignmentGraph;

pub struct BandMatrix {
    rows: Vec<Vec<usize>>,
    dummy_start: usize,
    dummy_end: usize,
}

impl BandMatrix {
    pub fn new(row_count: usize, graph: &AlignmentGraph) -> Self {
        Self {
            rows: vec![Vec::new(); row_count],
            dummy_start: graph.dummy_node_start(),
            dummy_end: graph.dummy_node_end(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Marks a cell live. Sentinel columns are implicit and not stored.
    /// Returns true when the cell was not live before.
    pub fn set(&mut self, w: usize, j: usize) -> bool {
        if w == self.dummy_start || w == self.dummy_end {
            return false;
        }
        let row = &mut self.rows[j];
        match row.binary_search(&w) {
            Ok(_) => false,
            Err(slot) => {
                row.insert(slot, w);
                true
            }
        }
    }

    #[inline]
    pub fn get(&self, w: usize, j: usize) -> bool {
        if w == self.dummy_start || w == self.dummy_end {
            return true;
        }
        self.rows[j].binary_search(&w).is_ok()
    }

    /// Live non-sentinel columns of a row, ascending.
    #[inline]
    pub fn row(&self, j: usize) -> &[usize] {
        &self.rows[j]
    }

    pub fn row_live_count(&self, j: usize) -> usize {
        self.rows[j].len()
    }

    /// Union of another band's rows into this one.
    pub fn merge(&mut self, other: &BandMatrix) {
        for j in 0..self.rows.len() {
            for &w in other.row(j) {
                self.set(w, j);
            }
        }
    }
}

/// Lateral expansion to the right within row `j`: walks up to `budget`
/// columns towards node ends, spilling into every out-neighbour with the
/// remaining budget. Marked cells are appended to `touched`.
pub fn expand_row_rightwards(
    graph: &AlignmentGraph,
    band: &mut BandMatrix,
    touched: &mut Vec<MatrixPosition>,
    w: usize,
    j: usize,
    budget: usize,
) {
    let mut stack = vec![(w, budget)];
    while let Some((mut w, mut budget)) = stack.pop() {
        let node = graph.node_of(w);
        let end = graph.node_end(node);
        let mut blocked = false;
        while w != end && budget > 0 {
            band.set(w, j);
            touched.push((w, j));
            w += 1;
            budget -= 1;
            if w != end && band.get(w, j) {
                blocked = true;
                break;
            }
        }
        if blocked {
            continue;
        }
        if w == end && budget > 0 {
            for &out in graph.out_neighbors(node) {
                stack.push((graph.node_start(out), budget));
            }
        }
    }
}

/// Lateral expansion to the left within row `j`, the mirror of
/// `expand_row_rightwards`: entering an in-neighbour costs one budget unit
/// for its last column.
pub fn expand_row_leftwards(
    graph: &AlignmentGraph,
    band: &mut BandMatrix,
    touched: &mut Vec<MatrixPosition>,
    w: usize,
    j: usize,
    budget: usize,
) {
    let mut stack = vec![(w, budget)];
    while let Some((mut w, mut budget)) = stack.pop() {
        let node = graph.node_of(w);
        let start = graph.node_start(node);
        let mut blocked = false;
        while w != start && budget > 0 {
            band.set(w, j);
            touched.push((w, j));
            w -= 1;
            budget -= 1;
            if w != start && band.get(w, j) {
                blocked = true;
                break;
            }
        }
        if blocked {
            continue;
        }
        if w == start && budget > 0 {
            band.set(w, j);
            touched.push((w, j));
            for &inn in graph.in_neighbors(node) {
                stack.push((graph.node_end(inn) - 1, budget - 1));
            }
        }
    }
}

/// Diagonal expansion towards higher rows and columns, branching through
/// out-neighbours at node ends. No budget: stops at live cells or edges.
fn expand_down_right(graph: &AlignmentGraph, band: &mut BandMatrix, w: usize, j: usize) {
    let rows = band.row_count();
    let mut stack = vec![(w, j)];
    while let Some((mut w, mut j)) = stack.pop() {
        let node = graph.node_of(w);
        let end = graph.node_end(node);
        let mut blocked = false;
        while w != end && j < rows {
            band.set(w, j);
            w += 1;
            j += 1;
            if w != end && j < rows && band.get(w, j) {
                blocked = true;
                break;
            }
        }
        if blocked {
            continue;
        }
        if j < rows {
            for &out in graph.out_neighbors(node) {
                stack.push((graph.node_start(out), j));
            }
        }
    }
}

/// Diagonal expansion towards lower rows and columns, the mirror of
/// `expand_down_right` through in-neighbours.
fn expand_up_left(graph: &AlignmentGraph, band: &mut BandMatrix, w: usize, j: usize) {
    let mut stack = vec![(w, j)];
    while let Some((mut w, mut j)) = stack.pop() {
        if j == 0 {
            band.set(w, j);
            continue;
        }
        let node = graph.node_of(w);
        let start = graph.node_start(node);
        let mut blocked = false;
        while w != start && j > 0 {
            band.set(w, j);
            w -= 1;
            j -= 1;
            if w != start && j > 0 && band.get(w, j) {
                blocked = true;
                break;
            }
        }
        if blocked {
            continue;
        }
        band.set(w, j);
        if w == start && j > 0 {
            for &inn in graph.in_neighbors(node) {
                stack.push((graph.node_end(inn) - 1, j - 1));
            }
        }
    }
}

/// Builds the static band from seed hits in matrix coordinates.
pub fn seed_expanded_band(
    graph: &AlignmentGraph,
    row_count: usize,
    seeds: &[MatrixPosition],
    bandwidth: usize,
) -> BandMatrix {
    let mut forward = BandMatrix::new(row_count, graph);
    let mut backward = BandMatrix::new(row_count, graph);
    let mut touched: Vec<MatrixPosition> = Vec::new();

    for &(w, j) in seeds {
        forward.set(w, j);
        touched.push((w, j));
        expand_row_rightwards(graph, &mut forward, &mut touched, w, j, bandwidth);
        expand_row_leftwards(graph, &mut forward, &mut touched, w, j, bandwidth);
        let lateral: Vec<usize> = forward.row(j).to_vec();
        for w2 in lateral {
            backward.set(w2, j);
        }
    }

    touched.sort_unstable();
    touched.dedup();
    for &(w, j) in &touched {
        expand_down_right(graph, &mut forward, w, j);
        expand_up_left(graph, &mut backward, w, j);
    }

    forward.merge(&backward);
    forward
}
