//! Cache Replacement Policies.
//!
//! Implements algorithms for selecting victim lines in set-associative caches. Every
//! policy sees the age metadata kept on each line (`last_touch`, `inserted_at`); only
//! pseudo-LRU keeps extra state of its own.
//!
//! # Policies
//!
//! - `Fifo`: First-In, First-Out.
//! - `Lru`: Least Recently Used.
//! - `Mru`: Most Recently Used.
//! - `Plru`: Bit-based pseudo-LRU.
//! - `Random`: Random selection.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

/// Most Recently Used replacement policy.
pub mod mru;

/// Bit-based pseudo-LRU replacement policy.
pub mod plru;

/// Random replacement policy.
pub mod random;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use mru::MruPolicy;
pub use plru::PlruPolicy;
pub use random::RandomPolicy;

use super::LineState;

/// Trait for cache replacement policies.
pub trait ReplacementPolicy: Send + Sync + std::fmt::Debug {
    /// Notes an access (hit or fill) to `way` of `set`.
    fn touch(&mut self, _set: usize, _way: usize) {}

    /// Selects the way to evict from a full set.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `lines` - The lines of that set, all valid.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn victim(&mut self, set: usize, lines: &[LineState]) -> usize;
}

/// Index of the line minimising `key`; ties go to the lowest way.
fn min_way_by(lines: &[LineState], key: impl Fn(&LineState) -> u64) -> usize {
    lines
        .iter()
        .enumerate()
        .min_by_key(|(way, line)| (key(line), *way))
        .map_or(0, |(way, _)| way)
}
