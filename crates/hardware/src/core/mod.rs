//! Core processor implementation.
//!
//! This module contains the out-of-order core: the `Cpu` that owns and steps every
//! structure, the in-flight micro-op record, the pipeline stages, register renaming, the
//! load/store queue with its memory dependence predictor, and the execution units.

/// CPU core state, cycle loop, and squash.
pub mod cpu;

/// In-flight micro-op record and instruction list.
pub mod dyn_inst;

/// Load/store queue, memory dependence unit, and store-set predictor.
pub mod lsq;

/// Instruction pipeline (stages, time buffers, ROB, IQ, scoreboard, SMT policies).
pub mod pipeline;

/// Register renaming and free lists.
pub mod rename;

/// Execution units (branch predictor, caches, prefetcher, functional-unit pool).
pub mod units;

pub use self::cpu::{Cpu, CpuSnapshot};
