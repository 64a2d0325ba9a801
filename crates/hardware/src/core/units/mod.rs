//! Execution units and functional components.
//!
//! This module contains the pieces of the core that are not pipeline stages: the
//! functional-unit pool, the branch prediction unit, the cache tag arrays with their
//! replacement policies, and the prefetchers.

/// Branch Resolution Unit including branch predictors, BTB, and RAS.
pub mod bru;

/// Set-associative cache tag arrays with replacement policies.
pub mod cache;

/// Functional-unit catalogue, occupancy, and per-group issue ports.
pub mod fu_pool;

/// Hardware prefetcher implementations (next-line, stride).
pub mod prefetch;
