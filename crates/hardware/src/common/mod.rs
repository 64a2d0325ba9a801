//! Common types shared by every part of the simulator.
//!
//! This module provides the small vocabulary the rest of the crate is written in:
//! 1. **Timing and ordering:** Cycle counts, addresses, thread ids, and program-order sequence numbers.
//! 2. **Registers:** Register classes, architectural register names, and physical register ids.
//! 3. **Errors:** Configuration and simulation errors, plus architectural faults carried by micro-ops.

/// Configuration errors, simulation errors, and architectural faults.
pub mod error;

/// Register classes and architectural / physical register identifiers.
pub mod reg;

/// Cycle, address, thread, and sequence-number types.
pub mod types;

pub use error::{ConfigError, Fault, FaultKind, SimError, SimResult};
pub use reg::{ArchReg, PhysRegId, RegClass};
pub use types::{Addr, Cycle, SeqNum, ThreadId};
