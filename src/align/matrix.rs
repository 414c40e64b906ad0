//! Row state for the banded DP
//!
//! The three coupled score series M/Q/R are kept as full-width column
//! vectors, two generations each (current and previous), swapped at every
//! row boundary so no allocation happens per row. The gap-origin pointer
//! vectors are written in place: a vertical or horizontal gap keeps
//! pointing at the cell where it was opened until the gap is closed, and
//! every read of them is gated on band membership, which guarantees
//! freshness. The same state is carried across slice boundaries, keeping
//! the recurrences identical to a single-pass fill.

use crate::align::scoring::{Score, SCORE_FLOOR};
use crate::common::MatrixPosition;

/// One generation of the M/Q/R score rows.
pub struct ScoreRows {
    pub m: Vec<Score>,
    pub q: Vec<Score>,
    pub r: Vec<Score>,
}

impl ScoreRows {
    /// Row 0: a free start at every column, with R disallowed at the start
    /// sentinel.
    pub fn first_row(column_count: usize, dummy_start: usize) -> Self {
        let mut rows = Self {
            m: vec![0; column_count],
            q: vec![0; column_count],
            r: vec![0; column_count],
        };
        rows.r[dummy_start] = SCORE_FLOOR;
        rows
    }

    /// Scratch generation of the same width, overwritten before use.
    pub fn scratch(column_count: usize) -> Self {
        Self {
            m: vec![0; column_count],
            q: vec![0; column_count],
            r: vec![0; column_count],
        }
    }

    pub fn width(&self) -> usize {
        self.m.len()
    }
}

/// Where the currently open vertical (Q) and horizontal (R) gaps started,
/// per column.
pub struct GapOrigins {
    pub q_origin: Vec<MatrixPosition>,
    pub r_origin: Vec<MatrixPosition>,
}

impl GapOrigins {
    pub fn new(column_count: usize) -> Self {
        Self {
            q_origin: (0..column_count).map(|w| (w, 0)).collect(),
            r_origin: (0..column_count).map(|w| (w, 0)).collect(),
        }
    }
}
