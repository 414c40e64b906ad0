//! Banded DP fill
//!
//! Fills the three coupled score series M (match), Q (query gap) and R
//! (graph gap) over the live band cells, row by row. Within a row the first
//! columns of out-of-order nodes are processed before everything else:
//! their graph-gap recurrence only reads the previous row, so they are safe
//! to evaluate while the rest of the row follows in ascending column order,
//! each cell seeing its same-row predecessors already computed.
//!
//! The graph-gap series R has two recurrences. The fast one extends a gap
//! from a same-row predecessor. The slow one, used at the first column of a
//! node reachable through a back-edge, considers every node of the previous
//! row through the distance oracle, paying the oracle distance as gap
//! length. The R-helper summarises the previous row per node for it.
//!
//! Rows are grouped into slices bounded by the live-cell budget. Slice
//! boundaries are where cancellation is observed and, in low-memory mode,
//! where per-node scratch capacity is released. The recurrences themselves
//! are identical to a single-pass fill.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use rustc_hash::FxHashMap;

use crate::align::band::{seed_expanded_band, BandMatrix};
use crate::align::band_dynamic::{expand_dynamic_row, expando_prefill};
use crate::align::matrix::{GapOrigins, ScoreRows};
use crate::align::scoring::{sub_penalty, Score, ScoreConfig, SCORE_FLOOR};
use crate::common::{AlignError, MatrixPosition};
use crate::core::alignment_graph::AlignmentGraph;
use crate::core::diagnostics::{counters, diagnostics_enabled};
use crate::core::distance_matrix::DistanceIndex;

/// Per-invocation engine settings, resolved by the caller facade.
#[derive(Debug, Clone, Copy)]
pub struct EngineParams {
    pub bandwidth: usize,
    pub dynamic_row_start: usize,
    pub max_cells_per_slice: usize,
    pub sloppy_optimizations: bool,
    pub low_memory: bool,
}

/// Everything the backtrace needs from a finished fill.
pub struct FilledMatrix {
    /// M scores of the final row.
    pub final_m: Vec<Score>,
    /// Backtrace pointer per filled cell.
    pub backtrace: FxHashMap<MatrixPosition, MatrixPosition>,
    /// Column attaining each row's maximum M.
    pub row_max_column: Vec<usize>,
    /// The band that was actually filled.
    pub band: BandMatrix,
}

/// Local tallies flushed into the process counters when diagnostics are on.
#[derive(Default)]
struct FillTallies {
    cells: usize,
    fast_r: usize,
    slow_r: usize,
    helper_builds: usize,
    slices: usize,
    dynamic_rows: usize,
}

/// Per-node scratch reused across rows. In low-memory mode its capacity is
/// released at slice boundaries.
struct EngineScratch {
    /// Per node: (column, incoming score, amortised exit cost).
    best_per_node: Vec<Option<(usize, Score, Score)>>,
    r_helper: Vec<(usize, Score)>,
}

impl EngineScratch {
    fn new(node_count: usize) -> Self {
        Self {
            best_per_node: vec![None; node_count],
            r_helper: Vec::new(),
        }
    }

    fn release(&mut self) {
        self.best_per_node = Vec::new();
        self.r_helper = Vec::new();
    }

    fn ensure(&mut self, node_count: usize) {
        if self.best_per_node.len() != node_count {
            self.best_per_node = vec![None; node_count];
        }
    }
}

/// Fills the banded matrix for one query and returns the final-row state.
pub fn fill_matrix(
    graph: &AlignmentGraph,
    distance: &DistanceIndex,
    scores: &ScoreConfig,
    query: &[u8],
    seeds: &[MatrixPosition],
    params: &EngineParams,
    cancel: Option<&AtomicBool>,
) -> Result<FilledMatrix, AlignError> {
    let rows = query.len() + 1;
    let columns = graph.size_in_bp();
    let dummy_start = graph.dummy_node_start();
    let dummy_end = graph.dummy_node_end();
    let diag = diagnostics_enabled();
    let mut tallies = FillTallies::default();

    // band bootstrap: static seed expansion, or expando prefill when static
    // banding is disabled
    let mut band;
    let dynamic_start;
    if params.dynamic_row_start > 0 {
        band = if seeds.is_empty() {
            BandMatrix::new(rows, graph)
        } else {
            seed_expanded_band(graph, rows, seeds, params.bandwidth)
        };
        dynamic_start = params.dynamic_row_start;
    } else {
        band = BandMatrix::new(rows, graph);
        let prefix = (2 * params.bandwidth).max(8);
        let deepest = expando_prefill(
            graph,
            &mut band,
            query,
            seeds,
            prefix,
            params.max_cells_per_slice,
        );
        dynamic_start = deepest + 1;
    }
    if diag {
        let marked: usize = (0..rows).map(|j| band.row_live_count(j)).sum();
        counters().add(&counters().band_cells_marked, marked);
    }

    let mut previous = ScoreRows::first_row(columns, dummy_start);
    let mut current = ScoreRows::scratch(columns);
    let mut origins = GapOrigins::new(columns);
    let mut backtrace: FxHashMap<MatrixPosition, MatrixPosition> = FxHashMap::default();
    let mut row_max_column = vec![dummy_start; rows];
    let mut scratch = EngineScratch::new(graph.node_count());

    let mut previous_processable = processable_columns(graph, &band, 0).1;
    let mut cells_in_slice = 0usize;

    for j in 1..rows {
        if cells_in_slice >= params.max_cells_per_slice {
            cells_in_slice = 0;
            tallies.slices += 1;
            if let Some(flag) = cancel {
                if flag.load(AtomicOrdering::Relaxed) {
                    return Err(AlignError::Cancelled);
                }
            }
            if params.low_memory {
                scratch.release();
            }
        }
        scratch.ensure(graph.node_count());

        if j >= dynamic_start {
            let mut center = row_max_column[j - 1];
            if graph.is_sentinel_column(center) {
                // degenerate previous row; restart from the first real column
                center = 1;
            }
            expand_dynamic_row(graph, &mut band, center, j, params.bandwidth);
            tallies.dynamic_rows += 1;
        }

        let (has_wrong_orders, current_processable) = processable_columns(graph, &band, j);
        if current_processable.is_empty() {
            if diag {
                counters().bump(&counters().band_collapses);
                flush_tallies(&tallies);
            }
            return Err(AlignError::BandCollapsed { row: j });
        }

        current.m[dummy_start] = -scores.gap_penalty(j);
        current.r[dummy_start] = SCORE_FLOOR;
        backtrace.insert((dummy_start, j), (dummy_start, j - 1));
        let mut max_score = current.m[dummy_start];
        let mut max_position = dummy_start;

        if has_wrong_orders && !params.sloppy_optimizations {
            build_r_helper(
                graph,
                scores,
                &band,
                query,
                j,
                &previous_processable,
                &previous.m,
                &mut scratch,
            );
            tallies.helper_builds += 1;
        } else {
            scratch.r_helper.clear();
        }

        for &w in &current_processable {
            let node = graph.node_of(w);
            let graph_base = graph.base_at(w);
            let query_base = query[j - 1];

            // vertical recurrence
            let mut q = sub_penalty(previous.q[w], scores.gap_continue_penalty);
            if sub_penalty(previous.m[w], scores.gap_penalty(1)) > q {
                q = sub_penalty(previous.m[w], scores.gap_penalty(1));
                origins.q_origin[w] = (w, j - 1);
            }
            current.q[w] = q;

            // horizontal recurrence, fast or slow
            let mut r_calculated = false;
            let mut r = SCORE_FLOOR;
            let mut r_origin = (w, j);
            if w == graph.node_start(node) && graph.not_in_order(node) {
                if !params.sloppy_optimizations
                    && scratch.r_helper.iter().any(|&(v, _)| v != w)
                {
                    r_calculated = true;
                    let (value, origin) =
                        full_r(graph, distance, scores, &scratch.r_helper, w, j);
                    r = value;
                    r_origin = origin;
                    tallies.slow_r += 1;
                }
            } else if has_in_neighbor_inside_band(graph, &band, w, j) {
                r_calculated = true;
                let (value, origin) = recurrence_r(graph, scores, &band, &current, &origins, w, j);
                r = value;
                r_origin = origin;
                tallies.fast_r += 1;
            }
            if r_calculated {
                debug_assert!(
                    r_origin.1 < j || (r_origin.1 == j && r_origin.0 < w),
                    "graph-gap pointer must stay strictly behind its cell"
                );
                current.r[w] = r;
                origins.r_origin[w] = r_origin;
            }

            // match recurrence: free row start, then the gap series, then
            // the diagonal predecessors; first candidate wins ties
            let mut m = current.m[dummy_start];
            let mut found: MatrixPosition = (dummy_start, j);
            if band.get(w, j - 1) && current.q[w] > m {
                m = current.q[w];
                found = origins.q_origin[w];
            }
            if r_calculated && r > m {
                m = r;
                found = r_origin;
            }
            if w == graph.node_start(node) {
                // the start sentinel stands in as a predecessor of every
                // node head, so an alignment can open on a first column
                let candidate = previous.m[dummy_start] + scores.match_score(graph_base, query_base);
                if candidate > m {
                    m = candidate;
                    found = (dummy_start, j - 1);
                }
                for &inn in graph.in_neighbors(node) {
                    let u = graph.node_end(inn) - 1;
                    if !band.get(u, j - 1) {
                        continue;
                    }
                    let candidate = previous.m[u] + scores.match_score(graph_base, query_base);
                    if candidate > m {
                        m = candidate;
                        found = (u, j - 1);
                    }
                }
            } else {
                let u = w - 1;
                if band.get(u, j - 1) {
                    let candidate = previous.m[u] + scores.match_score(graph_base, query_base);
                    if candidate > m {
                        m = candidate;
                        found = (u, j - 1);
                    }
                }
            }
            current.m[w] = m;
            debug_assert!(
                found.1 < j || (found.1 == j && found.0 < w),
                "match pointer must stay strictly behind its cell"
            );
            debug_assert!(m > SCORE_FLOOR - 1 && m < Score::MAX - 100);
            backtrace.insert((w, j), found);

            // a dead cell above means the gap series restart from M here
            if !band.get(w, j - 1) {
                current.q[w] = m;
                origins.q_origin[w] = (w, j);
            }
            if !r_calculated {
                current.r[w] = m;
                origins.r_origin[w] = (w, j);
            }

            if m > max_score {
                max_score = m;
                max_position = w;
            }
        }

        // free projection to the end sentinel: a trace may stop anywhere
        current.m[dummy_end] = max_score - scores.gap_penalty(query.len() - j);
        current.r[dummy_end] = SCORE_FLOOR;
        backtrace.insert((dummy_end, j), (max_position, j));
        row_max_column[j] = max_position;

        cells_in_slice += current_processable.len();
        tallies.cells += current_processable.len();
        std::mem::swap(&mut previous, &mut current);
        previous_processable = current_processable;
    }

    if diag {
        tallies.slices += 1;
        counters().add(&counters().rows_filled, rows - 1);
        flush_tallies(&tallies);
    }

    Ok(FilledMatrix {
        final_m: previous.m,
        backtrace,
        row_max_column,
        band,
    })
}

fn flush_tallies(tallies: &FillTallies) {
    let c = counters();
    c.add(&c.cells_filled, tallies.cells);
    c.add(&c.fast_r_evaluations, tallies.fast_r);
    c.add(&c.slow_r_evaluations, tallies.slow_r);
    c.add(&c.r_helper_builds, tallies.helper_builds);
    c.add(&c.slices_completed, tallies.slices);
    c.add(&c.dynamic_rows, tallies.dynamic_rows);
}

/// Live non-sentinel columns of row `j`, with the first columns of
/// out-of-order nodes moved to the front. Returns whether any such column
/// exists in the row.
fn processable_columns(
    graph: &AlignmentGraph,
    band: &BandMatrix,
    j: usize,
) -> (bool, Vec<usize>) {
    let mut wrong_order = Vec::new();
    let mut in_order = Vec::new();
    for &w in band.row(j) {
        let node = graph.node_of(w);
        if graph.node_start(node) == w && graph.not_in_order(node) {
            wrong_order.push(w);
        } else {
            in_order.push(w);
        }
    }
    let has_wrong_orders = !wrong_order.is_empty();
    wrong_order.extend(in_order);
    (has_wrong_orders, wrong_order)
}

/// True when `w` has a graph predecessor live in the same row.
fn has_in_neighbor_inside_band(
    graph: &AlignmentGraph,
    band: &BandMatrix,
    w: usize,
    j: usize,
) -> bool {
    let node = graph.node_of(w);
    if graph.node_start(node) == w {
        graph
            .in_neighbors(node)
            .iter()
            .any(|&inn| band.get(graph.node_end(inn) - 1, j))
    } else {
        band.get(w - 1, j)
    }
}

/// Fast graph-gap recurrence: extend or open a gap from a same-row
/// predecessor. The extend branch inherits the predecessor's gap origin.
fn recurrence_r(
    graph: &AlignmentGraph,
    scores: &ScoreConfig,
    band: &BandMatrix,
    current: &ScoreRows,
    origins: &GapOrigins,
    w: usize,
    j: usize,
) -> (Score, MatrixPosition) {
    let node = graph.node_of(w);
    let mut best = SCORE_FLOOR;
    let mut position = (w, j);
    let mut consider = |u: usize, best: &mut Score, position: &mut MatrixPosition| {
        let opened = sub_penalty(current.m[u], scores.gap_penalty(1));
        if opened > *best {
            *best = opened;
            *position = (u, j);
        }
        let extended = sub_penalty(current.r[u], scores.gap_continue_penalty);
        if extended > *best {
            *best = extended;
            *position = origins.r_origin[u];
        }
    };
    if graph.node_start(node) == w {
        for &inn in graph.in_neighbors(node) {
            let u = graph.node_end(inn) - 1;
            if !band.get(u, j) {
                continue;
            }
            debug_assert!(u < w, "fast recurrence requires in-order predecessors");
            consider(u, &mut best, &mut position);
        }
    } else {
        let u = w - 1;
        if band.get(u, j) {
            consider(u, &mut best, &mut position);
        }
    }
    (best, position)
}

/// Slow graph-gap recurrence for the first column of an out-of-order node:
/// the best previous-row landing anywhere in the graph, minus the gap cost
/// of the oracle distance to `w`.
fn full_r(
    graph: &AlignmentGraph,
    distance: &DistanceIndex,
    scores: &ScoreConfig,
    helper: &[(usize, Score)],
    w: usize,
    j: usize,
) -> (Score, MatrixPosition) {
    let mut best: Option<(Score, MatrixPosition)> = None;
    for &(v, score) in helper {
        if v == w {
            continue;
        }
        let gap = scores.gap_penalty(distance.distance(graph, v, w));
        let candidate = sub_penalty(score, gap);
        if best.map_or(true, |(value, _)| candidate > value) {
            best = Some((candidate, (v, j - 1)));
        }
    }
    best.expect("the slow recurrence is only entered with a usable helper entry")
}

/// Builds the R-helper for row `j`: per previous-row node, the column `v`
/// maximising the incoming match score minus the amortised cost of walking
/// from `v` to the node's end. Row 1 starts from score zero everywhere.
#[allow(clippy::too_many_arguments)]
fn build_r_helper(
    graph: &AlignmentGraph,
    scores: &ScoreConfig,
    band: &BandMatrix,
    query: &[u8],
    j: usize,
    previous_processable: &[usize],
    previous_m: &[Score],
    scratch: &mut EngineScratch,
) {
    scratch.r_helper.clear();
    if j == 1 {
        scratch
            .r_helper
            .extend(previous_processable.iter().map(|&v| (v, 0)));
        return;
    }
    for slot in scratch.best_per_node.iter_mut() {
        *slot = None;
    }
    let query_base = query[j - 1];
    let dummy_start = graph.dummy_node_start();
    for &v in previous_processable {
        let node = graph.node_of(v);
        let exit_cost = (graph.node_end(node) - v) as Score * scores.gap_continue_penalty;
        let base = graph.base_at(v);
        let mut offer = |u: usize, slots: &mut Vec<Option<(usize, Score, Score)>>| {
            let score_here = previous_m[u] + scores.match_score(base, query_base);
            let better = match slots[node] {
                None => true,
                Some((_, best_score, best_exit)) => score_here - exit_cost > best_score - best_exit,
            };
            if better {
                slots[node] = Some((v, score_here, exit_cost));
            }
        };
        if graph.node_start(node) == v {
            offer(dummy_start, &mut scratch.best_per_node);
            for &inn in graph.in_neighbors(node) {
                let u = graph.node_end(inn) - 1;
                if !band.get(u, j - 1) {
                    continue;
                }
                offer(u, &mut scratch.best_per_node);
            }
        } else {
            let u = v - 1;
            if band.get(u, j - 1) {
                offer(u, &mut scratch.best_per_node);
            }
        }
    }
    for slot in &scratch.best_per_node {
        if let Some((v, score, _)) = slot {
            scratch.r_helper.push((*v, *score));
        }
    }
}
