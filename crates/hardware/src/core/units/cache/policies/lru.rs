//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the cache line that has not been accessed for the longest time,
//! using each line's `last_touch` stamp.
//!
//! # Performance
//!
//! - **Time Complexity:** `victim()` is O(W) where W is the associativity
//! - **Best Case:** Workloads with good temporal locality
//! - **Worst Case:** Scanning patterns larger than cache capacity (thrashing)

use super::{ReplacementPolicy, min_way_by};
use crate::core::units::cache::LineState;

/// LRU Policy.
#[derive(Debug, Default)]
pub struct LruPolicy;

impl ReplacementPolicy for LruPolicy {
    fn victim(&mut self, _set: usize, lines: &[LineState]) -> usize {
        min_way_by(lines, |l| l.last_touch)
    }
}
