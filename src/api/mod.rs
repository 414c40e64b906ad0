//! Caller-facing API
//!
//! Wraps the core indexes and the alignment engine behind a facade that
//! validates parameters, resolves seeds and applies the bandwidth ramp.

pub mod aligner;
