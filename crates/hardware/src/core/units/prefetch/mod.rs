//! Hardware prefetchers.
//!
//! A prefetcher watches the demand accesses of one cache level and proposes lines to
//! install ahead of use. Prefetch fills are not timed; they only change which later
//! accesses hit.

/// Next-line prefetcher (prefetches sequential cache lines).
pub mod next_line;

/// Stride prefetcher (detects constant-stride access patterns).
pub mod stride;

pub use self::next_line::NextLinePrefetcher;
pub use self::stride::StridePrefetcher;

use crate::common::Addr;

/// Trait for cache prefetcher implementations.
pub trait Prefetcher: Send + Sync + std::fmt::Debug {
    /// Observes a demand access and returns addresses to prefetch.
    ///
    /// # Arguments
    ///
    /// * `addr` - The address that was accessed
    /// * `hit` - Whether the access was a cache hit
    fn observe(&mut self, addr: Addr, hit: bool) -> Vec<Addr>;
}
