//! Per-query alignment engine
//!
//! The banded dynamic program and everything scoped to a single query:
//! band construction, the DP fill, the backtrace and the emitted record.
//!
//! # Structure
//!
//! - `scoring` - score constants and the IUPAC base comparator
//! - `band`, `band_dynamic` - static and dynamic band construction
//! - `matrix` - M/Q/R row buffers and gap origins
//! - `engine` - the banded DP fill
//! - `traceback` - pointer walk and band diagnostic
//! - `result` - alignment records and the trace-to-path emitter

pub mod band;
pub mod band_dynamic;
pub mod engine;
pub mod matrix;
pub mod result;
pub mod scoring;
pub mod traceback;
