//! Out-of-order instruction pipeline.
//!
//! This module contains the stages and the shared structures they allocate from:
//! 1. **Stages:** Fetch, Decode, Rename (frontend) and IEW, Commit (backend).
//! 2. **Communication:** Time buffers carrying micro-ops forward and block/squash signals
//!    backward, each path with its own delay.
//! 3. **Structures:** Reorder buffer, instruction queue, and register scoreboard.
//! 4. **SMT:** Resource partitioning and thread selection policies.

/// Backend stages (IEW, Commit).
pub mod backend;

/// Inter-stage signal records.
pub mod comm;

/// Frontend stages (Fetch, Decode, Rename).
pub mod frontend;

/// Instruction queue.
pub mod inst_queue;

/// Reorder buffer.
pub mod rob;

/// Physical register ready bits.
pub mod scoreboard;

/// SMT sharing and selection policies.
pub mod smt;

/// Delayed inter-stage wires.
pub mod time_buffer;
