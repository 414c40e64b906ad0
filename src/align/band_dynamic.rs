//! Dynamic banding
//!
//! Instead of a precomputed seed band, each row is banded around the column
//! where the previous row attained its maximum: the same budgeted lateral
//! walk as the static builder, applied to a single row as the fill reaches
//! it.
//!
//! The first rows have no previous maximum to follow. They are populated by
//! a bounded Dijkstra-like expansion ("expando" prefill) over a prefix of
//! the query with unit edit costs, which discovers plausible starting
//! columns without any pre-existing band. The expansion begins at the free
//! row-zero starts, with any seed hits anchoring it at zero cost, and it is
//! capped by the per-slice cell budget.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use crate::align::band::{expand_row_leftwards, expand_row_rightwards, BandMatrix};
use crate::align::scoring::character_match;
use crate::common::MatrixPosition;
use crate::core::alignment_graph::AlignmentGraph;
use crate::core::diagnostics::{counters, diagnostics_enabled};

/// Expands row `j` laterally around `center` with the bandwidth budget.
pub fn expand_dynamic_row(
    graph: &AlignmentGraph,
    band: &mut BandMatrix,
    center: usize,
    j: usize,
    bandwidth: usize,
) {
    let mut touched = Vec::new();
    band.set(center, j);
    expand_row_rightwards(graph, band, &mut touched, center, j, bandwidth);
    expand_row_leftwards(graph, band, &mut touched, center, j, bandwidth);
}

/// Graph successor columns of `w`: the next column inside the node, or the
/// first column of every out-neighbour at a node end.
fn successor_columns(graph: &AlignmentGraph, w: usize, out: &mut Vec<usize>) {
    out.clear();
    let node = graph.node_of(w);
    if w + 1 < graph.node_end(node) {
        out.push(w + 1);
    } else {
        for &next in graph.out_neighbors(node) {
            out.push(graph.node_start(next));
        }
    }
}

/// Bounded Dijkstra over matrix cells with unit edit costs. Marks every
/// settled cell live. Returns the last row that received a cell, or 0 when
/// nothing was reachable.
pub fn expando_prefill(
    graph: &AlignmentGraph,
    band: &mut BandMatrix,
    query: &[u8],
    seeds: &[MatrixPosition],
    prefix_rows: usize,
    cell_budget: usize,
) -> usize {
    let last_row = prefix_rows.min(query.len());
    if last_row == 0 {
        return 0;
    }

    let mut heap: BinaryHeap<Reverse<(usize, usize, usize)>> = BinaryHeap::new();
    let mut settled: FxHashSet<MatrixPosition> = FxHashSet::default();

    // row 0 is a free start at every column; the expansion only ever moves
    // down and right, so these keep every prefix row reachable
    for w in 0..graph.size_in_bp() {
        if graph.is_sentinel_column(w) {
            continue;
        }
        band.set(w, 0);
        let cost = if character_match(graph.base_at(w), query[0]) {
            0
        } else {
            1
        };
        heap.push(Reverse((cost, w, 1)));
    }
    // seed hits anchor the expansion at zero cost
    for &(w, j) in seeds {
        if j <= last_row && !graph.is_sentinel_column(w) {
            heap.push(Reverse((0, w, j)));
        }
    }

    let mut deepest = 0;
    let mut settled_cells = 0usize;
    let mut succs = Vec::new();
    while let Some(Reverse((cost, w, j))) = heap.pop() {
        if !settled.insert((w, j)) {
            continue;
        }
        settled_cells += 1;
        if settled_cells > cell_budget {
            break;
        }
        band.set(w, j);
        deepest = deepest.max(j);
        if j >= last_row {
            continue;
        }
        // vertical: consume a query base, stay on the column
        heap.push(Reverse((cost + 1, w, j + 1)));
        successor_columns(graph, w, &mut succs);
        for &next in &succs {
            // horizontal: consume a graph base
            heap.push(Reverse((cost + 1, next, j)));
            // diagonal: consume both
            let step = if character_match(graph.base_at(next), query[j]) {
                0
            } else {
                1
            };
            heap.push(Reverse((cost + step, next, j + 1)));
        }
    }
    if diagnostics_enabled() {
        counters().add(&counters().expando_cells, settled_cells);
    }
    deepest
}
