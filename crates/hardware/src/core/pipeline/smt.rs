//! SMT sharing policies.
//!
//! Shared structures (IQ, LSQ, ROB banks) ask `thread_limit` how many entries one thread may
//! hold. Fetch and commit use the selectors here to pick which threads go first.

use crate::common::ThreadId;
use crate::config::{SmtCommitPolicy, SmtFetchPolicy, SmtPartitionPolicy};

/// Entries of a `capacity`-sized structure one of `threads` threads may occupy.
///
/// `Dynamic` allows the whole structure, `Partitioned` an equal share, and `Threshold`
/// `threshold` percent of it. The result is never below one.
pub fn thread_limit(
    policy: SmtPartitionPolicy,
    threshold: u32,
    capacity: usize,
    threads: usize,
) -> usize {
    if threads <= 1 {
        return capacity;
    }
    let limit = match policy {
        SmtPartitionPolicy::Dynamic => capacity,
        SmtPartitionPolicy::Partitioned => capacity / threads,
        SmtPartitionPolicy::Threshold => capacity * threshold as usize / 100,
    };
    limit.clamp(1, capacity.max(1))
}

/// Per-thread occupancy counts the fetch heuristics rank threads by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadLoad {
    /// Unresolved branches in flight.
    pub branches: usize,
    /// Instruction queue entries held.
    pub iq: usize,
    /// Load/store queue entries held.
    pub lsq: usize,
}

/// Orders the candidate threads for fetch.
///
/// # Arguments
///
/// * `policy` - Fetch policy
/// * `candidates` - Threads able to fetch this cycle, in thread order
/// * `loads` - Occupancy of every thread, indexed by thread id
/// * `rotation` - Round-robin starting point, advanced by the caller every cycle
pub fn fetch_order(
    policy: SmtFetchPolicy,
    candidates: &[ThreadId],
    loads: &[ThreadLoad],
    rotation: usize,
) -> Vec<ThreadId> {
    let mut order = rotate(candidates, rotation);
    match policy {
        SmtFetchPolicy::RoundRobin => {}
        SmtFetchPolicy::Branch => order.sort_by_key(|&t| loads[t].branches),
        SmtFetchPolicy::IqCount => order.sort_by_key(|&t| loads[t].iq),
        SmtFetchPolicy::LsqCount => order.sort_by_key(|&t| loads[t].lsq),
    }
    order
}

/// Picks the thread to commit from among those whose ROB head can retire.
///
/// `ready` pairs each candidate thread with the sequence number of its head.
pub fn commit_choice(
    policy: SmtCommitPolicy,
    ready: &[(ThreadId, u64)],
    rotation: usize,
    threads: usize,
) -> Option<ThreadId> {
    match policy {
        SmtCommitPolicy::OldestReady => ready.iter().min_by_key(|(_, seq)| *seq).map(|(t, _)| *t),
        SmtCommitPolicy::RoundRobin => (0..threads)
            .map(|i| (rotation + i) % threads)
            .find(|t| ready.iter().any(|(r, _)| r == t)),
    }
}

fn rotate(threads: &[ThreadId], rotation: usize) -> Vec<ThreadId> {
    if threads.is_empty() {
        return Vec::new();
    }
    let start = rotation % threads.len();
    threads[start..].iter().chain(&threads[..start]).copied().collect()
}
