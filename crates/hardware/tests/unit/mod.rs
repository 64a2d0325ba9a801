//! # Unit Components
//!
//! Tests grouped by the part of the simulator they exercise.

/// Configuration loading, defaults, and validation.
pub mod config;




/// Statistics derivations and reporting.
pub mod stats;

/// Trace parsing, synthetic workloads, and micro-op builders.
pub mod isa;
