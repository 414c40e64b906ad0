//! Chain and bubble contraction
//!
//! Shrinks the node graph before the all-pairs shortest-path computation.
//! Maximal chains (runs of nodes where each internal node has one
//! predecessor whose only successor it is) collapse into a single
//! representative, and simple bubbles (two parallel single-node branches of
//! equal length between a shared predecessor and successor) merge into one
//! branch. Every original node keeps its representative and its base offset
//! from the representative's entry point, which is enough to reconstruct
//! exact column-to-column distances.
//!
//! Only equal-length bubbles merge: with unequal branches the offset of the
//! longer branch could not describe its columns exactly. Merged branch
//! partners are recorded as twins; a twin pair shares a representative and
//! offsets but has no direct path between its two nodes.

use crate::core::alignment_graph::{AlignmentGraph, NodeIndex};

/// A unit graph used between contraction passes.
struct UnitGraph {
    len: Vec<usize>,
    out: Vec<Vec<usize>>,
    /// Original node when the unit still covers exactly one node.
    single_node: Vec<Option<NodeIndex>>,
}

impl UnitGraph {
    fn unit_count(&self) -> usize {
        self.len.len()
    }

    fn in_lists(&self) -> Vec<Vec<usize>> {
        let mut ins = vec![Vec::new(); self.unit_count()];
        for (u, targets) in self.out.iter().enumerate() {
            for &v in targets {
                ins[v].push(u);
            }
        }
        ins
    }
}

/// Result of one chain pass: the contracted unit graph plus the mapping of
/// old units into it.
struct ChainPass {
    contracted: UnitGraph,
    unit_rep: Vec<usize>,
    unit_offset: Vec<usize>,
}

fn collapse_chains(units: &UnitGraph) -> ChainPass {
    let n = units.unit_count();
    let ins = units.in_lists();
    let interior = |u: usize| -> bool {
        if ins[u].len() != 1 {
            return false;
        }
        let pred = ins[u][0];
        pred != u && units.out[pred].len() == 1
    };

    let mut unit_rep = vec![usize::MAX; n];
    let mut unit_offset = vec![0usize; n];
    let mut chains: Vec<Vec<usize>> = Vec::new();

    let mut start_chain = |head: usize, unit_rep: &mut Vec<usize>, unit_offset: &mut Vec<usize>| {
        let rep = chains.len();
        let mut members = Vec::new();
        let mut offset = 0usize;
        let mut cur = head;
        loop {
            unit_rep[cur] = rep;
            unit_offset[cur] = offset;
            offset += units.len[cur];
            members.push(cur);
            if units.out[cur].len() != 1 {
                break;
            }
            let next = units.out[cur][0];
            if !interior(next) || next == head || unit_rep[next] != usize::MAX {
                break;
            }
            cur = next;
        }
        chains.push(members);
    };

    for u in 0..n {
        if !interior(u) {
            start_chain(u, &mut unit_rep, &mut unit_offset);
        }
    }
    // a cycle made entirely of interior units has no head; break it at its
    // lowest index
    for u in 0..n {
        if unit_rep[u] == usize::MAX {
            start_chain(u, &mut unit_rep, &mut unit_offset);
        }
    }

    let mut len = Vec::with_capacity(chains.len());
    let mut out = Vec::with_capacity(chains.len());
    let mut single_node = Vec::with_capacity(chains.len());
    for members in &chains {
        let total: usize = members.iter().map(|&u| units.len[u]).sum();
        len.push(total);
        let last = *members.last().expect("chains are never empty");
        let mut targets: Vec<usize> = units.out[last].iter().map(|&v| unit_rep[v]).collect();
        targets.sort_unstable();
        targets.dedup();
        out.push(targets);
        single_node.push(if members.len() == 1 {
            units.single_node[members[0]]
        } else {
            None
        });
    }

    ChainPass {
        contracted: UnitGraph {
            len,
            out,
            single_node,
        },
        unit_rep,
        unit_offset,
    }
}

/// Merges equal-length single-node bubble branches. Returns the unit
/// remapping (merged units point at their kept partner) and the twin pairs
/// found, as original node indices.
fn merge_bubbles(units: &UnitGraph) -> (Vec<usize>, Vec<(NodeIndex, NodeIndex)>) {
    let n = units.unit_count();
    let ins = units.in_lists();
    let mut merged_into: Vec<usize> = (0..n).collect();
    let mut twins = Vec::new();

    let is_branch = |u: usize, pred: usize| -> bool {
        ins[u].len() == 1
            && ins[u][0] == pred
            && units.out[u].len() == 1
            && units.single_node[u].is_some()
    };

    for p in 0..n {
        let succs = &units.out[p];
        for i in 0..succs.len() {
            for j in (i + 1)..succs.len() {
                let (x, y) = (succs[i], succs[j]);
                if x == y || x == p || y == p {
                    continue;
                }
                if merged_into[x] != x || merged_into[y] != y {
                    continue;
                }
                if !is_branch(x, p) || !is_branch(y, p) {
                    continue;
                }
                if units.out[x][0] != units.out[y][0] {
                    continue;
                }
                let s = units.out[x][0];
                if s == x || s == y {
                    continue;
                }
                if units.len[x] != units.len[y] {
                    continue;
                }
                let (keep, drop) = if x < y { (x, y) } else { (y, x) };
                merged_into[drop] = keep;
                twins.push((
                    units.single_node[keep].expect("branch units cover one node"),
                    units.single_node[drop].expect("branch units cover one node"),
                ));
            }
        }
    }

    (merged_into, twins)
}

/// Applies a bubble merge map and renumbers the surviving units densely.
fn compact_merged(units: &UnitGraph, merged_into: &[usize]) -> (UnitGraph, Vec<usize>) {
    let n = units.unit_count();
    let mut dense = vec![usize::MAX; n];
    let mut survivors = Vec::new();
    for u in 0..n {
        if merged_into[u] == u {
            dense[u] = survivors.len();
            survivors.push(u);
        }
    }
    let unit_map: Vec<usize> = (0..n).map(|u| dense[merged_into[u]]).collect();

    let mut len = Vec::with_capacity(survivors.len());
    let mut out: Vec<Vec<usize>> = Vec::with_capacity(survivors.len());
    let mut single_node = Vec::with_capacity(survivors.len());
    for &u in &survivors {
        len.push(units.len[u]);
        single_node.push(units.single_node[u]);
        let mut targets: Vec<usize> = units.out[u].iter().map(|&v| unit_map[v]).collect();
        targets.sort_unstable();
        targets.dedup();
        out.push(targets);
    }
    // merged units forward their incoming edges to the kept partner
    for u in 0..n {
        if merged_into[u] != u {
            for &v in &units.out[u] {
                let target = unit_map[v];
                let source = unit_map[u];
                if !out[source].contains(&target) {
                    out[source].push(target);
                    out[source].sort_unstable();
                }
            }
        }
    }

    (
        UnitGraph {
            len,
            out,
            single_node,
        },
        unit_map,
    )
}

/// The collapsed representative graph plus the per-node mapping into it.
pub struct CollapsedGraph {
    rep_of: Vec<usize>,
    offset_of: Vec<usize>,
    twin_of: Vec<Option<NodeIndex>>,
    rep_len: Vec<usize>,
    rep_edges: Vec<Vec<usize>>,
}

impl CollapsedGraph {
    pub fn build(graph: &AlignmentGraph) -> Self {
        assert!(graph.is_finalized(), "collapse requires a finalized graph");
        let node_count = graph.node_count();

        // unit graph over the real nodes, sentinels excluded
        let real: Vec<NodeIndex> = (0..node_count)
            .filter(|&n| !graph.is_sentinel_node(n))
            .collect();
        let mut unit_of_node = vec![usize::MAX; node_count];
        for (u, &n) in real.iter().enumerate() {
            unit_of_node[n] = u;
        }
        let base = UnitGraph {
            len: real.iter().map(|&n| graph.node_len(n)).collect(),
            out: real
                .iter()
                .map(|&n| {
                    let mut targets: Vec<usize> = graph
                        .out_neighbors(n)
                        .iter()
                        .filter(|&&m| !graph.is_sentinel_node(m))
                        .map(|&m| unit_of_node[m])
                        .collect();
                    targets.sort_unstable();
                    targets.dedup();
                    targets
                })
                .collect(),
            single_node: real.iter().map(|&n| Some(n)).collect(),
        };

        let first = collapse_chains(&base);
        let (merged_into, twin_pairs) = merge_bubbles(&first.contracted);
        let (compacted, unit_map) = compact_merged(&first.contracted, &merged_into);
        let second = collapse_chains(&compacted);

        let mut rep_of = vec![usize::MAX; node_count];
        let mut offset_of = vec![0usize; node_count];
        for (u, &n) in real.iter().enumerate() {
            let c1 = first.unit_rep[u];
            let c2 = unit_map[c1];
            rep_of[n] = second.unit_rep[c2];
            offset_of[n] = first.unit_offset[u] + second.unit_offset[c2];
        }

        let mut twin_of = vec![None; node_count];
        for (a, b) in twin_pairs {
            twin_of[a] = Some(b);
            twin_of[b] = Some(a);
        }

        CollapsedGraph {
            rep_of,
            offset_of,
            twin_of,
            rep_len: second.contracted.len,
            rep_edges: second.contracted.out,
        }
    }

    /// Number of representatives.
    pub fn rep_count(&self) -> usize {
        self.rep_len.len()
    }

    /// Representative of a real node.
    #[inline]
    pub fn rep_of(&self, n: NodeIndex) -> usize {
        self.rep_of[n]
    }

    /// Base offset of a node's first column from its representative entry.
    #[inline]
    pub fn offset_of(&self, n: NodeIndex) -> usize {
        self.offset_of[n]
    }

    /// Total bases along a representative's linear walk.
    #[inline]
    pub fn rep_len(&self, rep: usize) -> usize {
        self.rep_len[rep]
    }

    /// Successor representatives.
    #[inline]
    pub fn rep_edges(&self, rep: usize) -> &[usize] {
        &self.rep_edges[rep]
    }

    /// True when there is a direct forward walk from `a` to `b` inside
    /// their shared representative. Only merged bubble partners lack one.
    #[inline]
    pub fn on_one_path(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.twin_of[a] != Some(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finalize(mut g: AlignmentGraph) -> AlignmentGraph {
        g.finalize().unwrap();
        g
    }

    #[test]
    fn linear_graph_collapses_to_one_rep() {
        let mut g = AlignmentGraph::new();
        g.add_node(1, "AC", false).unwrap();
        g.add_node(2, "GGG", false).unwrap();
        g.add_node(3, "T", false).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 3).unwrap();
        let g = finalize(g);
        let c = CollapsedGraph::build(&g);
        assert_eq!(c.rep_count(), 1);
        assert_eq!(c.rep_len(0), 6);
        let n1 = g.lookup_node(1).unwrap();
        let n2 = g.lookup_node(2).unwrap();
        let n3 = g.lookup_node(3).unwrap();
        assert_eq!(c.offset_of(n1), 0);
        assert_eq!(c.offset_of(n2), 2);
        assert_eq!(c.offset_of(n3), 5);
    }

    #[test]
    fn branch_point_breaks_the_chain() {
        let mut g = AlignmentGraph::new();
        g.add_node(1, "AC", false).unwrap();
        g.add_node(2, "GT", false).unwrap();
        g.add_node(3, "GG", false).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(1, 3).unwrap();
        let g = finalize(g);
        let c = CollapsedGraph::build(&g);
        // 2 and 3 share a predecessor but no successor, so no bubble merge
        assert_eq!(c.rep_count(), 3);
    }

    #[test]
    fn equal_length_bubble_merges_and_fuses_with_flanks() {
        let mut g = AlignmentGraph::new();
        g.add_node(1, "AC", false).unwrap();
        g.add_node(2, "GT", false).unwrap();
        g.add_node(3, "GG", false).unwrap();
        g.add_node(4, "TT", false).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(1, 3).unwrap();
        g.add_edge(2, 4).unwrap();
        g.add_edge(3, 4).unwrap();
        let g = finalize(g);
        let c = CollapsedGraph::build(&g);
        assert_eq!(c.rep_count(), 1);
        assert_eq!(c.rep_len(0), 6);
        let n2 = g.lookup_node(2).unwrap();
        let n3 = g.lookup_node(3).unwrap();
        let n4 = g.lookup_node(4).unwrap();
        assert_eq!(c.offset_of(n2), 2);
        assert_eq!(c.offset_of(n3), 2);
        assert_eq!(c.offset_of(n4), 4);
        assert!(!c.on_one_path(n2, n3));
        assert!(c.on_one_path(n2, n4));
    }

    #[test]
    fn unequal_bubble_stays_separate() {
        let mut g = AlignmentGraph::new();
        g.add_node(1, "AC", false).unwrap();
        g.add_node(2, "G", false).unwrap();
        g.add_node(3, "GGG", false).unwrap();
        g.add_node(4, "TT", false).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(1, 3).unwrap();
        g.add_edge(2, 4).unwrap();
        g.add_edge(3, 4).unwrap();
        let g = finalize(g);
        let c = CollapsedGraph::build(&g);
        assert_eq!(c.rep_count(), 4);
    }

    #[test]
    fn two_node_cycle_collapses_to_one_rep_with_self_edge() {
        let mut g = AlignmentGraph::new();
        g.add_node(1, "AC", false).unwrap();
        g.add_node(2, "GT", false).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 1).unwrap();
        let g = finalize(g);
        let c = CollapsedGraph::build(&g);
        assert_eq!(c.rep_count(), 1);
        assert_eq!(c.rep_len(0), 4);
        assert_eq!(c.rep_edges(0), &[0]);
    }
}
