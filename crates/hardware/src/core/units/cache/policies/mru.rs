//! Most Recently Used (MRU) Replacement Policy.
//!
//! This policy evicts the cache line that was accessed most recently.
//! MRU suits cyclic access patterns whose working set is larger than the cache:
//! the most recently used line is the one needed furthest in the future.

use super::ReplacementPolicy;
use crate::core::units::cache::LineState;

/// MRU Policy.
#[derive(Debug, Default)]
pub struct MruPolicy;

impl ReplacementPolicy for MruPolicy {
    fn victim(&mut self, _set: usize, lines: &[LineState]) -> usize {
        lines
            .iter()
            .enumerate()
            .max_by_key(|(way, line)| (line.last_touch, usize::MAX - way))
            .map_or(0, |(way, _)| way)
    }
}
