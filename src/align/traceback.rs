//! Backtrace over the filled matrix
//!
//! Starts at the best live non-sentinel cell of the final row and follows
//! the stored pointers until row 0 or the start sentinel. Every pointer
//! must point strictly behind its cell; a violation is a programmer error
//! and aborts. While walking, rows past a small prefix contribute the
//! band distance between the visited column and that row's maximum column,
//! and the largest such displacement is reported as a quality diagnostic.

use crate::align::engine::FilledMatrix;
use crate::align::scoring::Score;
use crate::common::MatrixPosition;
use crate::core::alignment_graph::AlignmentGraph;
use crate::core::distance_matrix::DistanceIndex;

/// Rows this close to the query start are excluded from the displacement
/// diagnostic; early rows drift before the band settles.
const DIAGNOSTIC_PREFIX_ROWS: usize = 20;

pub struct TraceResult {
    pub score: Score,
    pub trace: Vec<MatrixPosition>,
    pub max_distance_from_band: usize,
}

/// Walks the backtrace pointers from the best final-row cell. Returns None
/// when the final row has no live non-sentinel cell.
pub fn backtrace(
    graph: &AlignmentGraph,
    distance: &DistanceIndex,
    filled: &FilledMatrix,
) -> Option<TraceResult> {
    let final_row = filled.row_max_column.len() - 1;
    let mut best: Option<usize> = None;
    for &w in filled.band.row(final_row) {
        match best {
            None => best = Some(w),
            Some(current) => {
                if filled.final_m[w] > filled.final_m[current] {
                    best = Some(w);
                }
            }
        }
    }
    let start_column = best?;
    let score = filled.final_m[start_column];

    let mut current: MatrixPosition = (start_column, final_row);
    let mut trace = vec![current];
    let mut max_distance = 0usize;
    while current.1 > 0 {
        if current.0 == graph.dummy_node_start() {
            break;
        }
        if current.1 > DIAGNOSTIC_PREFIX_ROWS {
            let row_max = filled.row_max_column[current.1];
            let displacement = distance.band_distance(graph, current.0, row_max);
            max_distance = max_distance.max(displacement);
        }
        let next = *filled
            .backtrace
            .get(&current)
            .unwrap_or_else(|| panic!("missing backtrace pointer at {current:?}"));
        assert!(
            next.1 < current.1 || (next.1 == current.1 && next.0 < current.0),
            "backtrace pointer {next:?} does not precede {current:?}"
        );
        current = next;
        trace.push(current);
    }
    trace.reverse();

    Some(TraceResult {
        score,
        trace,
        max_distance_from_band: max_distance,
    })
}
