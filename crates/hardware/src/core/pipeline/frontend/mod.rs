//! Frontend pipeline stages.
//!
//! Fetch -> Decode -> Rename. Each stage is a free function over the core; they hand
//! micro-ops to each other through time buffers and read backward signals (block, squash)
//! at their configured delays.

/// Decode stage and early redirect of direct jumps.
pub mod decode;

/// Fetch stage, fetch buffer, and speculative branch history.
pub mod fetch;

/// Rename stage and resource allocation.
pub mod rename;
