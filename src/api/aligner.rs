//! Aligner facade
//!
//! Owns the immutable per-graph state (the flat graph index and the
//! distance oracle, built once) and exposes the per-query entry points.
//! Instances are safe to share across threads by reference: one alignment
//! invocation touches only its own DP state.

use std::sync::atomic::AtomicBool;

use anyhow::{ensure, Context, Result};

use crate::align::engine::{fill_matrix, EngineParams};
use crate::align::result::{trace_to_alignment, Alignment};
use crate::align::scoring::ScoreConfig;
use crate::align::traceback::backtrace;
use crate::common::{AlignError, MatrixPosition, SeedHit};
use crate::core::alignment_graph::AlignmentGraph;
use crate::core::diagnostics::{counters, diagnostics_enabled};
use crate::core::distance_matrix::DistanceIndex;

/// Tunables for banded alignment
#[derive(Debug, Clone, Copy)]
pub struct AlignerParams {
    /// Lateral expansion radius for the first attempt
    pub initial_bandwidth: usize,
    /// Retry radius after a band collapse; no retry when equal to the
    /// initial bandwidth
    pub ramp_bandwidth: usize,
    /// Row at which static banding hands over to dynamic banding; 0
    /// disables static banding entirely
    pub dynamic_row_start: usize,
    /// Live-cell budget per slice
    pub max_cells_per_slice: usize,
    /// Skip the slow graph-gap recurrence on out-of-order nodes. May lose
    /// optimality on highly cyclic graphs, never produces invalid paths.
    pub sloppy_optimizations: bool,
    /// Release per-node scratch between slices
    pub low_memory: bool,
}

impl Default for AlignerParams {
    fn default() -> Self {
        Self {
            initial_bandwidth: 32,
            ramp_bandwidth: 64,
            dynamic_row_start: 0,
            max_cells_per_slice: 100_000,
            sloppy_optimizations: false,
            low_memory: false,
        }
    }
}

impl AlignerParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.initial_bandwidth >= 1, "initial bandwidth must be >= 1");
        ensure!(
            self.ramp_bandwidth >= self.initial_bandwidth,
            "ramp bandwidth must not be below the initial bandwidth"
        );
        ensure!(self.max_cells_per_slice >= 1, "slice budget must be >= 1");
        Ok(())
    }
}

pub struct GraphAligner {
    graph: AlignmentGraph,
    distance: DistanceIndex,
    scores: ScoreConfig,
    params: AlignerParams,
}

impl GraphAligner {
    /// Builds the per-graph indexes. The graph must be finalized.
    pub fn new(graph: AlignmentGraph, params: AlignerParams) -> Result<Self> {
        ensure!(graph.is_finalized(), "the graph must be finalized first");
        params.validate().context("invalid aligner parameters")?;
        let distance = DistanceIndex::build(&graph);
        Ok(Self {
            graph,
            distance,
            scores: ScoreConfig::default(),
            params,
        })
    }

    pub fn graph(&self) -> &AlignmentGraph {
        &self.graph
    }

    pub fn params(&self) -> &AlignerParams {
        &self.params
    }

    /// Aligns one query with the configured bandwidths: the initial
    /// attempt, then one ramped retry if the band collapsed.
    pub fn align_one_way(
        &self,
        name: &str,
        sequence: &str,
        seeds: &[SeedHit],
    ) -> Result<Alignment, AlignError> {
        self.align_with_retry(name, sequence, seeds, None)
    }

    /// `align_one_way` with a cooperative cancellation flag, observed at
    /// slice boundaries.
    pub fn align_one_way_cancellable(
        &self,
        name: &str,
        sequence: &str,
        seeds: &[SeedHit],
        cancel: &AtomicBool,
    ) -> Result<Alignment, AlignError> {
        self.align_with_retry(name, sequence, seeds, Some(cancel))
    }

    /// Single alignment attempt with explicit banding arguments.
    pub fn align_one_way_with(
        &self,
        name: &str,
        sequence: &str,
        bandwidth: usize,
        seeds: &[SeedHit],
        dynamic_row_start: usize,
    ) -> Result<Alignment, AlignError> {
        if sequence.is_empty() || self.graph.is_empty() {
            return Ok(Alignment::Empty);
        }
        let seed_positions = self.seed_positions(sequence, seeds)?;
        self.attempt(name, sequence, bandwidth, &seed_positions, dynamic_row_start, None)
    }

    fn align_with_retry(
        &self,
        name: &str,
        sequence: &str,
        seeds: &[SeedHit],
        cancel: Option<&AtomicBool>,
    ) -> Result<Alignment, AlignError> {
        if diagnostics_enabled() {
            counters().bump(&counters().alignments_started);
        }
        if sequence.is_empty() || self.graph.is_empty() {
            return Ok(Alignment::Empty);
        }
        let seed_positions = self.seed_positions(sequence, seeds)?;
        let first = self.attempt(
            name,
            sequence,
            self.params.initial_bandwidth,
            &seed_positions,
            self.params.dynamic_row_start,
            cancel,
        );
        match first {
            Err(AlignError::BandCollapsed { .. })
                if self.params.ramp_bandwidth > self.params.initial_bandwidth =>
            {
                if diagnostics_enabled() {
                    counters().bump(&counters().ramp_retries);
                }
                self.attempt(
                    name,
                    sequence,
                    self.params.ramp_bandwidth,
                    &seed_positions,
                    self.params.dynamic_row_start,
                    cancel,
                )
            }
            other => other,
        }
    }

    fn attempt(
        &self,
        name: &str,
        sequence: &str,
        bandwidth: usize,
        seed_positions: &[MatrixPosition],
        dynamic_row_start: usize,
        cancel: Option<&AtomicBool>,
    ) -> Result<Alignment, AlignError> {
        let engine_params = EngineParams {
            bandwidth,
            dynamic_row_start,
            max_cells_per_slice: self.params.max_cells_per_slice,
            sloppy_optimizations: self.params.sloppy_optimizations,
            low_memory: self.params.low_memory,
        };
        let filled = fill_matrix(
            &self.graph,
            &self.distance,
            &self.scores,
            sequence.as_bytes(),
            seed_positions,
            &engine_params,
            cancel,
        )?;
        let traced = match backtrace(&self.graph, &self.distance, &filled) {
            Some(traced) => traced,
            None => return Ok(Alignment::Empty),
        };
        Ok(trace_to_alignment(
            &self.graph,
            name,
            sequence,
            traced.score,
            &traced.trace,
            traced.max_distance_from_band,
        ))
    }

    /// Resolves seed hits into matrix coordinates. Seeds past the query
    /// end are dropped; node offsets clamp to the node.
    fn seed_positions(
        &self,
        sequence: &str,
        seeds: &[SeedHit],
    ) -> Result<Vec<MatrixPosition>, AlignError> {
        let mut positions = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let node = self
                .graph
                .lookup_node(seed.node_id)
                .ok_or(AlignError::UnknownSeedNode { id: seed.node_id })?;
            if seed.sequence_position > sequence.len() {
                continue;
            }
            let offset = seed.node_pos.min(self.graph.node_len(node) - 1);
            positions.push((self.graph.node_start(node) + offset, seed.sequence_position));
        }
        Ok(positions)
    }
}
