//! Cycle-level out-of-order core simulator modelled on the Apple M1 Firestorm core.
//!
//! This crate implements a timing model of a wide out-of-order core with the following:
//! 1. **Core:** Fetch, decode, rename, issue/execute/writeback, and commit, connected by
//!    delayed time buffers, with a banked ROB, a shared IQ, and SMT sharing policies.
//! 2. **Speculation:** Branch prediction with fetch-side history repair, store-set memory
//!    dependence prediction, and squash on mispredicts, ordering violations, and faults.
//! 3. **Memory:** L1I/L1D, a shared L2, L2 and system crossbars, prefetchers, and a
//!    fixed-latency or DRAM-timed memory controller.
//! 4. **ISA:** Pre-decoded micro-op streams supplied by an `InstSource` (JSON traces or
//!    synthetic workloads).
//! 5. **Simulation:** Configuration, the run loop with deadlock detection, and statistics.

/// Common types and errors (addresses, cycles, sequence numbers, registers, faults).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// CPU core (pipeline, rename, LSQ, execution units).
pub mod core;
/// Micro-op descriptions and instruction sources.
pub mod isa;
/// Event queue and the top-level simulator.
pub mod sim;
/// Memory hierarchy (caches, crossbars, memory controllers).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Main CPU type; holds the pipeline, memory hierarchy, and stats.
pub use crate::core::Cpu;
/// Run loop over a core and its instruction source.
pub use crate::sim::Simulator;
