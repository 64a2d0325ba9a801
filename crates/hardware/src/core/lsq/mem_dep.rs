//! Memory dependence unit.
//!
//! Sits between dispatch and issue for memory operations. At dispatch it asks the
//! store-set predictor which in-flight store a load (or store) should be ordered behind and
//! records the dependence; issue holds the operation back until that store has issued.

use std::collections::BTreeMap;

use super::store_set::StoreSetPredictor;
use crate::common::{Addr, SeqNum, ThreadId};
use crate::config::LsqConfig;

/// Predicted-dependence bookkeeping for dispatched memory operations.
#[derive(Clone, Debug)]
pub struct MemDepUnit {
    predictor: StoreSetPredictor,
    /// Memory operation to the store it waits for.
    waiting: BTreeMap<SeqNum, (ThreadId, SeqNum)>,
    predicted: u64,
}

impl MemDepUnit {
    /// Creates the unit with an empty predictor.
    pub fn new(config: &LsqConfig) -> Self {
        Self {
            predictor: StoreSetPredictor::new(
                config.ssit_size,
                config.lfst_size,
                config.store_set_clear_period,
            ),
            waiting: BTreeMap::new(),
            predicted: 0,
        }
    }

    /// The underlying predictor.
    pub const fn predictor(&self) -> &StoreSetPredictor {
        &self.predictor
    }

    /// Registers a dispatched load.
    ///
    /// # Returns
    ///
    /// The store the load was predicted to depend on, if any.
    pub fn insert_load(&mut self, tid: ThreadId, pc: Addr, seq: SeqNum) -> Option<SeqNum> {
        let _ = self.predictor.check_clear();
        let store = self.predictor.predict_load(tid, pc)?;
        let _ = self.waiting.insert(seq, (tid, store));
        self.predicted += 1;
        Some(store)
    }

    /// Registers a dispatched store, ordering it behind the previous store of its set.
    pub fn insert_store(&mut self, tid: ThreadId, pc: Addr, seq: SeqNum) {
        let _ = self.predictor.check_clear();
        if let Some(prev) = self.predictor.insert_store(tid, pc, seq) {
            let _ = self.waiting.insert(seq, (tid, prev));
        }
    }

    /// True if `seq` has no outstanding predicted dependence.
    pub fn is_ready(&self, seq: SeqNum) -> bool {
        !self.waiting.contains_key(&seq)
    }

    /// A store issued: release everything waiting on it.
    pub fn store_issued(&mut self, tid: ThreadId, pc: Addr, seq: SeqNum) {
        self.predictor.store_issued(tid, pc, seq);
        self.waiting.retain(|_, (t, store)| !(*t == tid && *store == seq));
    }

    /// Trains the predictor on a detected violation.
    pub fn violation(&mut self, store_pc: Addr, load_pc: Addr) {
        self.predictor.violation(store_pc, load_pc);
    }

    /// Forgets dependences of squashed operations and on squashed stores.
    pub fn squash(&mut self, tid: ThreadId, from: SeqNum) {
        self.predictor.squash(tid, from);
        self.waiting
            .retain(|seq, (t, store)| *t != tid || (*seq < from && *store < from));
    }

    /// Removes a committed operation.
    pub fn commit(&mut self, seq: SeqNum) {
        let _ = self.waiting.remove(&seq);
    }

    /// Loads that were held back by a prediction.
    pub const fn predicted_dependences(&self) -> u64 {
        self.predicted
    }

    /// Predictor clears so far.
    pub const fn clears(&self) -> u64 {
        self.predictor.clears()
    }
}
