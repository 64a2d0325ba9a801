//! Next-Line Prefetcher.
//!
//! Fetches the next sequential cache line(s) on every access. This matches the
//! spatial locality of straight-line instruction fetch, which is where the L1I uses it.

use super::Prefetcher;
use crate::common::Addr;

/// Next-Line Prefetcher state.
#[derive(Debug)]
pub struct NextLinePrefetcher {
    line_bytes: u64,
    degree: u64,
}

impl NextLinePrefetcher {
    /// Creates a new Next-Line prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes.
    /// * `degree` - The number of lines to prefetch ahead (at least one).
    pub fn new(line_bytes: usize, degree: usize) -> Self {
        Self {
            line_bytes: line_bytes as u64,
            degree: degree.max(1) as u64,
        }
    }
}

impl Prefetcher for NextLinePrefetcher {
    fn observe(&mut self, addr: Addr, _hit: bool) -> Vec<Addr> {
        let base = addr & !(self.line_bytes - 1);
        (1..=self.degree)
            .map(|k| base.wrapping_add(self.line_bytes * k))
            .collect()
    }
}
