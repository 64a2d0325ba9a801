//! Pseudo-LRU (PLRU) Replacement Policy.
//!
//! Keeps one "recently used" bit per way. An access sets the way's bit; when every bit of
//! a set would be set, all other bits are cleared. The victim is the lowest way whose bit is
//! clear. Works for any associativity, unlike a binary tree.
//!
//! # Performance
//!
//! - **Time Complexity:** `touch()` is O(1), `victim()` is O(W)
//! - **Space Complexity:** one bit per line
//! - **Worst Case:** Pathological cases can cause premature eviction of useful lines

use super::ReplacementPolicy;
use crate::core::units::cache::LineState;

/// PLRU Policy state.
#[derive(Debug)]
pub struct PlruPolicy {
    /// Recently-used bitmask per set.
    usage: Vec<u64>,
    all_ones: u64,
}

impl PlruPolicy {
    /// Creates a new PLRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (at most 64).
    pub fn new(sets: usize, ways: usize) -> Self {
        let all_ones = if ways >= 64 {
            u64::MAX
        } else {
            (1u64 << ways) - 1
        };
        Self {
            usage: vec![0; sets],
            all_ones,
        }
    }
}

impl ReplacementPolicy for PlruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        let mask = 1u64 << (way % 64);
        self.usage[set] |= mask;
        if self.usage[set] & self.all_ones == self.all_ones {
            self.usage[set] = mask;
        }
    }

    fn victim(&mut self, set: usize, lines: &[LineState]) -> usize {
        (0..lines.len())
            .find(|&way| (self.usage[set] >> (way % 64)) & 1 == 0)
            .unwrap_or(0)
    }
}
