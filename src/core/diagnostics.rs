//! Diagnostic counters for the alignment engine
//!
//! Tracks where work goes during banded alignment: band construction, DP
//! cell fill, the two graph-gap recurrences, slicing and ramp retries.
//! Enabled via the GRAPH_ALIGN_DIAGNOSTICS environment variable.

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Check if diagnostics are enabled via environment variable
pub fn diagnostics_enabled() -> bool {
    std::env::var("GRAPH_ALIGN_DIAGNOSTICS")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Counters for a whole process; all sites update relaxed.
#[derive(Default)]
pub struct AlignDiagnosticCounters {
    // Band stage
    pub band_cells_marked: AtomicUsize,
    pub expando_cells: AtomicUsize,
    pub dynamic_rows: AtomicUsize,
    // DP stage
    pub cells_filled: AtomicUsize,
    pub rows_filled: AtomicUsize,
    pub fast_r_evaluations: AtomicUsize,
    pub slow_r_evaluations: AtomicUsize,
    pub r_helper_builds: AtomicUsize,
    pub slices_completed: AtomicUsize,
    // Driver stage
    pub alignments_started: AtomicUsize,
    pub ramp_retries: AtomicUsize,
    pub band_collapses: AtomicUsize,
}

impl AlignDiagnosticCounters {
    pub fn bump(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicUsize, amount: usize) {
        counter.fetch_add(amount, AtomicOrdering::Relaxed);
    }

    pub fn report(&self) {
        let get = |c: &AtomicUsize| c.load(AtomicOrdering::Relaxed);
        eprintln!("=== alignment diagnostics ===");
        eprintln!("band cells marked:    {}", get(&self.band_cells_marked));
        eprintln!("expando cells:        {}", get(&self.expando_cells));
        eprintln!("dynamic rows:         {}", get(&self.dynamic_rows));
        eprintln!("cells filled:         {}", get(&self.cells_filled));
        eprintln!("rows filled:          {}", get(&self.rows_filled));
        eprintln!("fast R evaluations:   {}", get(&self.fast_r_evaluations));
        eprintln!("slow R evaluations:   {}", get(&self.slow_r_evaluations));
        eprintln!("R helper builds:      {}", get(&self.r_helper_builds));
        eprintln!("slices completed:     {}", get(&self.slices_completed));
        eprintln!("alignments started:   {}", get(&self.alignments_started));
        eprintln!("ramp retries:         {}", get(&self.ramp_retries));
        eprintln!("band collapses:       {}", get(&self.band_collapses));
    }
}

static COUNTERS: AlignDiagnosticCounters = AlignDiagnosticCounters {
    band_cells_marked: AtomicUsize::new(0),
    expando_cells: AtomicUsize::new(0),
    dynamic_rows: AtomicUsize::new(0),
    cells_filled: AtomicUsize::new(0),
    rows_filled: AtomicUsize::new(0),
    fast_r_evaluations: AtomicUsize::new(0),
    slow_r_evaluations: AtomicUsize::new(0),
    r_helper_builds: AtomicUsize::new(0),
    slices_completed: AtomicUsize::new(0),
    alignments_started: AtomicUsize::new(0),
    ramp_retries: AtomicUsize::new(0),
    band_collapses: AtomicUsize::new(0),
};

/// Process-wide counter instance.
pub fn counters() -> &'static AlignDiagnosticCounters {
    &COUNTERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let c = counters();
        let before = c.cells_filled.load(AtomicOrdering::Relaxed);
        c.bump(&c.cells_filled);
        c.add(&c.cells_filled, 4);
        let after = c.cells_filled.load(AtomicOrdering::Relaxed);
        assert_eq!(after - before, 5);
    }
}
