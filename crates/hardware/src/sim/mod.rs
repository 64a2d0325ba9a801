//! Simulation driver.
//!
//! Provides the timestamped event queue used for deferred completions and the top-level
//! `Simulator` that steps the core until every instruction stream has drained.

/// Min-heap of timestamped events.
pub mod event_queue;

/// Cycle loop, termination, and deadlock detection.
pub mod simulator;

pub use event_queue::EventQueue;
pub use simulator::Simulator;
