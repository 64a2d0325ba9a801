//! Stride Prefetcher.
//!
//! Detects constant-stride access patterns per address region using a small reference
//! prediction table. Each entry tracks the last address seen in its region, the last
//! stride, and a two-bit confidence counter. Prefetches are issued only once the same
//! stride has repeated enough to saturate the counter.
//!
//! # Performance
//!
//! - **Time Complexity:** `observe()` is O(D) where D is the prefetch degree
//! - **Space Complexity:** O(T) where T is the table size
//! - **Best Case:** Regular strided patterns (array traversals, matrix operations)
//! - **Worst Case:** Irregular or random access patterns (linked lists, hash tables)

use super::Prefetcher;
use crate::common::Addr;

/// Region granularity used to index the table (4 KiB pages).
const REGION_SHIFT: u32 = 12;
/// Confidence at which prefetching starts.
const CONFIDENT: u8 = 2;
const CONFIDENCE_MAX: u8 = 3;

#[derive(Debug, Default, Clone, Copy)]
struct StrideEntry {
    region: u64,
    last_addr: Addr,
    stride: i64,
    confidence: u8,
    valid: bool,
}

/// Stride Prefetcher state.
#[derive(Debug)]
pub struct StridePrefetcher {
    table: Vec<StrideEntry>,
    line_bytes: u64,
    mask: usize,
    degree: usize,
}

impl StridePrefetcher {
    /// Creates a new Stride prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes.
    /// * `table_size` - Number of table entries (power of two).
    /// * `degree` - The number of strides to prefetch ahead.
    pub fn new(line_bytes: usize, table_size: usize, degree: usize) -> Self {
        let size = table_size.max(1).next_power_of_two();
        Self {
            table: vec![StrideEntry::default(); size],
            line_bytes: line_bytes as u64,
            mask: size - 1,
            degree: degree.max(1),
        }
    }
}

impl Prefetcher for StridePrefetcher {
    fn observe(&mut self, addr: Addr, _hit: bool) -> Vec<Addr> {
        let region = addr >> REGION_SHIFT;
        let entry = &mut self.table[region as usize & self.mask];

        if !entry.valid || entry.region != region {
            *entry = StrideEntry {
                region,
                last_addr: addr,
                stride: 0,
                confidence: 0,
                valid: true,
            };
            return Vec::new();
        }

        let stride = addr.wrapping_sub(entry.last_addr) as i64;
        entry.last_addr = addr;
        if stride == 0 {
            return Vec::new();
        }
        if stride == entry.stride {
            entry.confidence = (entry.confidence + 1).min(CONFIDENCE_MAX);
        } else {
            entry.confidence = entry.confidence.saturating_sub(1);
            if entry.confidence == 0 {
                entry.stride = stride;
            }
            return Vec::new();
        }
        if entry.confidence < CONFIDENT {
            return Vec::new();
        }

        let line_mask = !(self.line_bytes - 1);
        let mut out: Vec<Addr> = Vec::with_capacity(self.degree);
        for k in 1..=self.degree as i64 {
            let target = addr.wrapping_add_signed(stride.wrapping_mul(k)) & line_mask;
            if out.last() != Some(&target) {
                out.push(target);
            }
        }
        out
    }
}
