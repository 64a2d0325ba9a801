//! Main memory.
//!
//! Memory contents are not modelled; only the controller that turns a request arrival time
//! into a completion time.

/// Memory controller implementations for access latency modeling.
pub mod controller;

pub use controller::{DramController, MemoryController, SimpleController, build_controller};
