//! Memory-side components of the modelled system.
//!
//! Everything below the core's load/store and fetch ports lives here:
//! 1. **Hierarchy:** L1I and L1D, the shared L2, MSHRs, and port arbitration.
//! 2. **Crossbars:** The L2 crossbar and the system crossbar with layer occupancy.
//! 3. **Memory:** Fixed-latency and DRAM-timed memory controllers.

/// Cache hierarchy with ports, MSHRs, and write-back.
pub mod hierarchy;

/// Memory controller implementations.
pub mod memory;

/// Crossbar timing model.
pub mod xbar;

pub use hierarchy::{MemPort, MemRefusal, MemResponse, MemoryHierarchy, ReqId};
