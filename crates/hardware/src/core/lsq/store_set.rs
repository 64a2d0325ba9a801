//! Store-set memory dependence predictor.
//!
//! Two tables: the SSIT maps a (hashed) PC to a store-set id, and the LFST maps a store-set
//! id to the last fetched store of that set still in flight. A load whose PC belongs to a set
//! is predicted to depend on that set's last store. Sets are created and merged when a
//! memory-order violation is detected. The whole predictor is cleared every
//! `clear_period` memory operations.

use crate::common::{Addr, SeqNum, ThreadId};

/// Store-set identifier.
pub type StoreSetId = usize;

/// The store-set predictor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSetPredictor {
    ssit: Vec<Option<StoreSetId>>,
    lfst: Vec<Option<(ThreadId, SeqNum)>>,
    clear_period: u64,
    mem_ops: u64,
    clears: u64,
}

impl StoreSetPredictor {
    /// Creates an empty predictor.
    ///
    /// `ssit_size` and `lfst_size` are assumed to be powers of two.
    pub fn new(ssit_size: usize, lfst_size: usize, clear_period: u64) -> Self {
        Self {
            ssit: vec![None; ssit_size.max(1)],
            lfst: vec![None; lfst_size.max(1)],
            clear_period: clear_period.max(1),
            mem_ops: 0,
            clears: 0,
        }
    }

    fn ssit_index(&self, pc: Addr) -> usize {
        ((pc >> 2) as usize) & (self.ssit.len() - 1)
    }

    /// Counts one memory operation, clearing the tables first if a full period has elapsed.
    ///
    /// # Returns
    ///
    /// True if the tables were cleared.
    pub fn check_clear(&mut self) -> bool {
        let cleared = self.mem_ops >= self.clear_period;
        if cleared {
            self.clear();
            self.mem_ops = 0;
        }
        self.mem_ops += 1;
        cleared
    }

    /// Forgets every set and every in-flight store.
    pub fn clear(&mut self) {
        self.ssit.fill(None);
        self.lfst.fill(None);
        self.clears += 1;
        tracing::debug!(clears = self.clears, "store set predictor cleared");
    }

    /// Number of times the tables have been cleared.
    pub const fn clears(&self) -> u64 {
        self.clears
    }

    /// Store-set id of `pc`, if it has one.
    pub fn set_of(&self, pc: Addr) -> Option<StoreSetId> {
        self.ssit[self.ssit_index(pc)]
    }

    /// Predicts the in-flight store a load at `pc` must wait for.
    pub fn predict_load(&self, tid: ThreadId, pc: Addr) -> Option<SeqNum> {
        let set = self.set_of(pc)?;
        self.lfst[set].filter(|(t, _)| *t == tid).map(|(_, seq)| seq)
    }

    /// Records a store as its set's last fetched store.
    ///
    /// # Returns
    ///
    /// The previous last store of the set, which this store is ordered behind.
    pub fn insert_store(&mut self, tid: ThreadId, pc: Addr, seq: SeqNum) -> Option<SeqNum> {
        let set = self.set_of(pc)?;
        let prev = self.lfst[set].filter(|(t, _)| *t == tid).map(|(_, s)| s);
        self.lfst[set] = Some((tid, seq));
        prev
    }

    /// The store at `pc` has issued; loads no longer need to wait for it.
    pub fn store_issued(&mut self, tid: ThreadId, pc: Addr, seq: SeqNum) {
        if let Some(set) = self.set_of(pc)
            && self.lfst[set] == Some((tid, seq))
        {
            self.lfst[set] = None;
        }
    }

    /// Trains on a violation between the store at `store_pc` and the load at `load_pc`.
    pub fn violation(&mut self, store_pc: Addr, load_pc: Addr) {
        let load_index = self.ssit_index(load_pc);
        let store_index = self.ssit_index(store_pc);
        let set = match (self.ssit[load_index], self.ssit[store_index]) {
            (None, None) => load_index & (self.lfst.len() - 1),
            (Some(load_set), None) => load_set,
            (None, Some(store_set)) => store_set,
            (Some(load_set), Some(store_set)) => load_set.min(store_set),
        };
        self.ssit[load_index] = Some(set);
        self.ssit[store_index] = Some(set);
    }

    /// Drops LFST entries for stores of `tid` with `seq >= from`.
    pub fn squash(&mut self, tid: ThreadId, from: SeqNum) {
        for entry in &mut self.lfst {
            if entry.is_some_and(|(t, s)| t == tid && s >= from) {
                *entry = None;
            }
        }
    }
}
