//! Instruction-decode collaborator interface.
//!
//! The core does not decode or execute an ISA. Instead it consumes *pre-decoded* micro-ops
//! supplied by an [`InstSource`]:
//! 1. **`OpClass`:** The functional-unit class of an operation (integer ALU, FP divide, load...).
//! 2. **`StaticInst`:** A decoded micro-op: PC, operation class, register operands, memory access,
//!    control-flow outcome, and an optional architectural fault.
//! 3. **`InstSource`:** The stream provider, indexed per hardware thread by program position.
//! 4. **`TraceProgram` / synthetic workloads:** Concrete sources loaded from JSON or generated.

/// Pre-decoded micro-op description.
pub mod inst;

/// Operation classes and their functional-unit mapping.
pub mod op_class;

/// The instruction-stream trait and the JSON trace implementation.
pub mod source;

/// Synthetic workload generators.
pub mod synthetic;

pub use inst::{ControlInfo, ControlKind, MemAccess, StaticInst};
pub use op_class::OpClass;
pub use source::{InstSource, TraceProgram};
pub use synthetic::{SyntheticWorkload, generate};
