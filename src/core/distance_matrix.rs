//! All-pairs distance oracle
//!
//! Answers "minimum number of graph bases on any path from column a to
//! column b". Shortest paths run once per input graph on the collapsed
//! representative graph: one binary-heap Dijkstra per source representative,
//! fanned out over a rayon pool. The edge weight from a representative to
//! any successor is the representative's own collapsed length, so the
//! entry-to-entry distance plus per-column offsets reconstructs exact
//! column distances.
//!
//! A representative's distance to itself is never zero. It is the length of
//! its shortest return cycle, or the infinity value (total columns + 1)
//! when no cycle returns. Back-jumps inside one node are costed through the
//! return cycle this way. Sentinel columns are distance 1 from everything.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::core::alignment_graph::AlignmentGraph;
use crate::core::chain_collapse::CollapsedGraph;

pub struct DistanceIndex {
    collapsed: CollapsedGraph,
    rep_dist: Vec<usize>,
    self_dist: Vec<usize>,
    rep_count: usize,
    infinity: usize,
}

impl DistanceIndex {
    pub fn build(graph: &AlignmentGraph) -> Self {
        let collapsed = CollapsedGraph::build(graph);
        let rep_count = collapsed.rep_count();
        let infinity = graph.size_in_bp() + 1;

        let rows: Vec<Vec<usize>> = (0..rep_count)
            .into_par_iter()
            .map(|source| dijkstra(&collapsed, source, infinity))
            .collect();
        let mut rep_dist = Vec::with_capacity(rep_count * rep_count);
        for row in rows {
            rep_dist.extend(row);
        }

        let self_dist = (0..rep_count)
            .map(|rep| {
                let best_return = collapsed
                    .rep_edges(rep)
                    .iter()
                    .map(|&succ| rep_dist[succ * rep_count + rep])
                    .min()
                    .unwrap_or(infinity);
                if best_return >= infinity {
                    infinity
                } else {
                    collapsed.rep_len(rep) + best_return
                }
            })
            .collect();

        Self {
            collapsed,
            rep_dist,
            self_dist,
            rep_count,
            infinity,
        }
    }

    /// The value standing in for "unreachable": total columns + 1.
    pub fn infinity(&self) -> usize {
        self.infinity
    }

    fn column_offset(&self, graph: &AlignmentGraph, w: usize) -> (usize, usize) {
        let node = graph.node_of(w);
        let rep = self.collapsed.rep_of(node);
        let offset = self.collapsed.offset_of(node) + (w - graph.node_start(node));
        (rep, offset)
    }

    /// Minimum number of graph bases on any path from column `a` to column
    /// `b`. Zero only when `a == b`.
    pub fn distance(&self, graph: &AlignmentGraph, a: usize, b: usize) -> usize {
        if a == b {
            return 0;
        }
        if graph.is_sentinel_column(a) || graph.is_sentinel_column(b) {
            return 1;
        }
        let node_a = graph.node_of(a);
        let node_b = graph.node_of(b);
        let (rep_a, off_a) = self.column_offset(graph, a);
        let (rep_b, off_b) = self.column_offset(graph, b);
        if rep_a == rep_b {
            if off_b >= off_a && self.collapsed.on_one_path(node_a, node_b) {
                return off_b - off_a;
            }
            let around = self.self_dist[rep_a];
            if around >= self.infinity {
                return self.infinity;
            }
            return around - off_a + off_b;
        }
        let entry = self.rep_dist[rep_a * self.rep_count + rep_b];
        if entry >= self.infinity {
            return self.infinity;
        }
        entry - off_a + off_b
    }

    /// Symmetric displacement measure used for the band diagnostic.
    pub fn band_distance(&self, graph: &AlignmentGraph, a: usize, b: usize) -> usize {
        if a == b {
            return 0;
        }
        if graph.is_sentinel_column(a) || graph.is_sentinel_column(b) {
            return 1;
        }
        self.distance(graph, a, b).min(self.distance(graph, b, a))
    }
}

fn dijkstra(collapsed: &CollapsedGraph, source: usize, infinity: usize) -> Vec<usize> {
    let mut dist = vec![infinity; collapsed.rep_count()];
    dist[source] = 0;
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0usize, source)));
    while let Some(Reverse((d, rep))) = heap.pop() {
        if d > dist[rep] {
            continue;
        }
        let weight = collapsed.rep_len(rep);
        for &succ in collapsed.rep_edges(rep) {
            let candidate = d + weight;
            if candidate < dist[succ] {
                dist[succ] = candidate;
                heap.push(Reverse((candidate, succ)));
            }
        }
    }
    dist
}
