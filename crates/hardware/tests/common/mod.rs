//! Shared test infrastructure.

/// Configuration presets and run helpers.
pub mod harness;

/// Mock collaborators.
pub mod mocks;
