//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! This policy evicts the line that was filled earliest, regardless of how recently it
//! was accessed.

use super::{ReplacementPolicy, min_way_by};
use crate::core::units::cache::LineState;

/// FIFO Policy.
#[derive(Debug, Default)]
pub struct FifoPolicy;

impl ReplacementPolicy for FifoPolicy {
    fn victim(&mut self, _set: usize, lines: &[LineState]) -> usize {
        min_way_by(lines, |l| l.inserted_at)
    }
}
