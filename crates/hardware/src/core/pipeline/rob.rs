//! Reorder Buffer (ROB).
//!
//! The ROB tracks every renamed micro-op in program order so commit can retire them in
//! order and a squash can find everything younger than a given point. It provides:
//! 1. **Banks:** `num_robs` banks of `num_rob_entries / num_robs` slots. A thread's micro-ops
//!    are spread over the banks round-robin in program order, so the next one to retire is
//!    always at the head of a known bank and a stuck head blocks that bank.
//! 2. **SMT partitioning:** Each thread may hold at most its policy limit of every bank.
//! 3. **Squash reclamation:** Squashed entries leave program order at once but keep their
//!    slots until `reclaim` frees them at `squash_width` per cycle.

use std::collections::VecDeque;

use crate::common::{SeqNum, ThreadId};
use crate::config::Config;
use crate::core::pipeline::smt::thread_limit;

/// One bank: per-thread FIFOs sharing a slot budget.
#[derive(Clone, Debug)]
struct RobBank {
    threads: Vec<VecDeque<SeqNum>>,
    /// Slots held by squashed entries not yet reclaimed.
    squashed: usize,
}

impl RobBank {
    fn occupied(&self) -> usize {
        self.threads.iter().map(VecDeque::len).sum::<usize>() + self.squashed
    }
}

/// The reorder buffer.
#[derive(Clone, Debug)]
pub struct Rob {
    banks: Vec<RobBank>,
    bank_capacity: usize,
    thread_limit: usize,
    /// Micro-ops ever allocated per thread, minus squashed ones; selects the next bank.
    allocated: Vec<u64>,
    /// Micro-ops retired per thread; selects the bank holding the next to retire.
    retired: Vec<u64>,
}

impl Rob {
    /// Creates an empty ROB.
    pub fn new(config: &Config) -> Self {
        let r = &config.resources;
        let threads = config.general.num_threads;
        let banks = r.num_robs.max(1);
        let bank_capacity = r.num_rob_entries / banks;
        Self {
            banks: vec![
                RobBank {
                    threads: vec![VecDeque::new(); threads],
                    squashed: 0,
                };
                banks
            ],
            bank_capacity,
            thread_limit: thread_limit(
                config.smt.rob_policy,
                config.smt.rob_threshold,
                bank_capacity,
                threads,
            ),
            allocated: vec![0; threads],
            retired: vec![0; threads],
        }
    }

    fn next_bank(&self, tid: ThreadId) -> usize {
        (self.allocated[tid] % self.banks.len() as u64) as usize
    }

    fn retire_bank(&self, tid: ThreadId) -> usize {
        (self.retired[tid] % self.banks.len() as u64) as usize
    }

    /// True if thread `tid` can allocate its next entry.
    pub fn can_allocate(&self, tid: ThreadId) -> bool {
        let bank = &self.banks[self.next_bank(tid)];
        bank.occupied() < self.bank_capacity && bank.threads[tid].len() < self.thread_limit
    }

    /// Appends `seq` to thread `tid`'s program order.
    ///
    /// # Returns
    ///
    /// The bank that holds the entry, or `None` if it is full for this thread.
    pub fn allocate(&mut self, tid: ThreadId, seq: SeqNum) -> Option<usize> {
        if !self.can_allocate(tid) {
            return None;
        }
        let bank = self.next_bank(tid);
        self.banks[bank].threads[tid].push_back(seq);
        self.allocated[tid] += 1;
        Some(bank)
    }

    /// Oldest unretired micro-op of thread `tid`.
    pub fn head(&self, tid: ThreadId) -> Option<SeqNum> {
        self.banks[self.retire_bank(tid)].threads[tid].front().copied()
    }

    /// Retires the head of thread `tid`.
    pub fn retire_head(&mut self, tid: ThreadId) -> Option<SeqNum> {
        let bank = self.retire_bank(tid);
        let seq = self.banks[bank].threads[tid].pop_front()?;
        self.retired[tid] += 1;
        Some(seq)
    }

    /// Removes every entry of `tid` with `seq >= from` from program order.
    ///
    /// # Returns
    ///
    /// The number of entries squashed.
    pub fn squash(&mut self, tid: ThreadId, from: SeqNum) -> usize {
        let mut squashed = 0;
        for bank in &mut self.banks {
            let list = &mut bank.threads[tid];
            while list.back().is_some_and(|&s| s >= from) {
                list.pop_back();
                bank.squashed += 1;
                squashed += 1;
            }
        }
        self.allocated[tid] -= squashed as u64;
        squashed
    }

    /// Frees up to `width` slots held by squashed entries.
    pub fn reclaim(&mut self, width: usize) {
        let mut budget = width;
        for bank in &mut self.banks {
            let n = bank.squashed.min(budget);
            bank.squashed -= n;
            budget -= n;
        }
    }

    /// Slots still held by squashed entries.
    pub fn pending_reclaim(&self) -> usize {
        self.banks.iter().map(|b| b.squashed).sum()
    }

    /// Entries held by thread `tid`.
    pub fn thread_len(&self, tid: ThreadId) -> usize {
        self.banks.iter().map(|b| b.threads[tid].len()).sum()
    }

    /// Total live entries.
    pub fn len(&self) -> usize {
        self.banks
            .iter()
            .map(|b| b.threads.iter().map(VecDeque::len).sum::<usize>())
            .sum()
    }

    /// True if no thread has a live entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Thread `tid`'s live entries in program order.
    pub fn thread_entries(&self, tid: ThreadId) -> Vec<SeqNum> {
        let mut all: Vec<SeqNum> = self
            .banks
            .iter()
            .flat_map(|b| b.threads[tid].iter().copied())
            .collect();
        all.sort_unstable();
        all
    }
}
