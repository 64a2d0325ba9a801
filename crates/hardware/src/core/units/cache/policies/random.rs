//! Random Replacement Policy.
//!
//! This policy evicts a pseudo-random line from the set using a xorshift generator with a
//! fixed seed, so runs stay reproducible.

use super::ReplacementPolicy;
use crate::core::units::cache::LineState;

const SEED: u64 = 123_456_789;

/// Random Policy state.
#[derive(Debug)]
pub struct RandomPolicy {
    state: u64,
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self { state: SEED }
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn victim(&mut self, _set: usize, lines: &[LineState]) -> usize {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x % lines.len().max(1) as u64) as usize
    }
}
