//! Instruction queue.
//!
//! Holds renamed micro-ops until their operands are ready and a functional unit accepts
//! them. Rename reserves a slot when it allocates the micro-op's other resources; the slot is
//! filled at dispatch and freed at issue. Entries are kept in sequence order so issue can
//! walk them oldest first.

use std::collections::BTreeMap;

use crate::common::{SeqNum, ThreadId};
use crate::config::Config;
use crate::core::pipeline::smt::thread_limit;

/// The instruction queue.
#[derive(Clone, Debug)]
pub struct InstQueue {
    entries: BTreeMap<SeqNum, ThreadId>,
    /// Reserved or occupied slots per thread.
    held: Vec<usize>,
    capacity: usize,
    thread_limit: usize,
}

impl InstQueue {
    /// Creates an empty queue.
    pub fn new(config: &Config) -> Self {
        let threads = config.general.num_threads;
        let capacity = config.resources.num_iq_entries;
        Self {
            entries: BTreeMap::new(),
            held: vec![0; threads],
            capacity,
            thread_limit: thread_limit(
                config.smt.iq_policy,
                config.smt.iq_threshold,
                capacity,
                threads,
            ),
        }
    }

    fn total_held(&self) -> usize {
        self.held.iter().sum()
    }

    /// Reserves a slot for a micro-op of `tid`; false if the queue is full for it.
    pub fn reserve(&mut self, tid: ThreadId) -> bool {
        if self.total_held() >= self.capacity || self.held[tid] >= self.thread_limit {
            return false;
        }
        self.held[tid] += 1;
        true
    }

    /// Gives back a reservation whose micro-op was squashed before dispatch.
    pub fn unreserve(&mut self, tid: ThreadId) {
        self.held[tid] = self.held[tid].saturating_sub(1);
    }

    /// Places a dispatched micro-op into its reserved slot.
    pub fn insert(&mut self, tid: ThreadId, seq: SeqNum) {
        let _ = self.entries.insert(seq, tid);
    }

    /// Removes an issued micro-op.
    pub fn remove(&mut self, seq: SeqNum) {
        if let Some(tid) = self.entries.remove(&seq) {
            self.held[tid] = self.held[tid].saturating_sub(1);
        }
    }

    /// Waiting micro-ops, oldest first.
    pub fn waiting(&self) -> Vec<SeqNum> {
        self.entries.keys().copied().collect()
    }

    /// Drops every waiting micro-op of `tid` with `seq >= from`.
    pub fn squash(&mut self, tid: ThreadId, from: SeqNum) {
        let doomed: Vec<SeqNum> = self
            .entries
            .range(from..)
            .filter(|(_, t)| **t == tid)
            .map(|(s, _)| *s)
            .collect();
        for seq in doomed {
            self.remove(seq);
        }
    }

    /// Slots reserved or occupied by `tid`.
    pub fn thread_count(&self, tid: ThreadId) -> usize {
        self.held[tid]
    }

    /// Micro-ops currently waiting.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
