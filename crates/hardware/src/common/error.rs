//! Error and fault definitions.
//!
//! This module separates three very different kinds of failure:
//! 1. **`ConfigError`:** A parameter is out of range or inconsistent. Always fatal and always
//!    reported before the first simulated cycle.
//! 2. **`SimError`:** The simulation as a whole cannot proceed (bad trace, I/O, deadlock).
//! 3. **`Fault`:** An architectural exception raised by a micro-op. Faults are *not* Rust
//!    errors; they travel with the micro-op and are handled by squash-and-redirect at commit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::types::Cycle;

/// Result alias for fallible simulator entry points.
pub type SimResult<T> = Result<T, SimError>;

/// A configuration parameter failed validation.
///
/// Every variant names the offending field using its configuration path so the message can
/// be matched back to the JSON that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A width, size, or count that must be non-zero was zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Configuration path of the field.
        field: &'static str,
    },

    /// A value must be a power of two (cache geometry, predictor tables).
    #[error("{field} must be a power of two (got {value})")]
    NotPowerOfTwo {
        /// Configuration path of the field.
        field: &'static str,
        /// The rejected value.
        value: u64,
    },

    /// A value fell outside its accepted range.
    #[error("{field} = {value} is outside the accepted range {min}..={max}")]
    OutOfRange {
        /// Configuration path of the field.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Smallest accepted value.
        min: u64,
        /// Largest accepted value.
        max: u64,
    },

    /// A physical register file is too small to hold the architectural state of every thread.
    #[error(
        "{class} physical registers ({phys}) cannot hold {threads} thread(s) x {arch} architectural registers"
    )]
    TooFewPhysRegs {
        /// Register class name.
        class: &'static str,
        /// Configured physical register count.
        phys: usize,
        /// Architectural registers per thread.
        arch: usize,
        /// Configured thread count.
        threads: usize,
    },

    /// Two parameters contradict each other.
    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),

    /// The functional-unit pool cannot execute an operation class at all.
    #[error("functional unit pool has no unit capable of {0}")]
    MissingCapability(String),
}

/// Top-level error type for building and running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A configuration or trace file could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// JSON text (not backed by a file) could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The instruction stream is malformed (e.g. empty, or too many threads).
    #[error("invalid instruction stream: {0}")]
    Trace(String),

    /// No micro-op committed for longer than the configured threshold while work remained.
    #[error("deadlock detected at cycle {cycle}: no commit for {idle_cycles} cycles")]
    Deadlock {
        /// Cycle at which the deadlock was declared.
        cycle: Cycle,
        /// Consecutive cycles without a commit.
        idle_cycles: u64,
    },
}

/// Architectural fault categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Instruction fetch could not be performed.
    InstructionAccess,
    /// The instruction could not be decoded.
    IllegalInstruction,
    /// A load accessed an invalid address.
    LoadAccess,
    /// A store accessed an invalid address.
    StoreAccess,
    /// A system call / environment call requiring the handler.
    SystemCall,
    /// A breakpoint.
    Breakpoint,
}

/// An architectural exception attached to a micro-op.
///
/// The faulting micro-op never commits: when it reaches the head of the reorder buffer the
/// pipeline is squashed (including the micro-op itself) and control transfers to the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fault {
    /// Fault category.
    pub kind: FaultKind,
    /// Faulting address (or PC for non-memory faults).
    #[serde(default)]
    pub addr: u64,
}

impl Fault {
    /// Creates a fault of `kind` at `addr`.
    pub const fn new(kind: FaultKind, addr: u64) -> Self {
        Self { kind, addr }
    }

    /// Returns true if the fault is raised by the fetch stage.
    ///
    /// Fetch faults use `fetchTrapLatency` instead of `trapLatency`.
    pub const fn is_fetch_fault(&self) -> bool {
        matches!(self.kind, FaultKind::InstructionAccess)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:#x})", self.kind, self.addr)
    }
}
