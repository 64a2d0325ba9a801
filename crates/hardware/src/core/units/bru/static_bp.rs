//! Static Branch Predictor.
//!
//! Implements a simple "Always Not Taken" prediction policy for conditional branches.
//! Unconditional jumps and calls are predicted taken to their BTB target; returns are
//! handled by the fetching thread's return address stack before the predictor is asked.

use super::{BranchOutcome, BranchPredictor, Prediction, btb::Btb};
use crate::common::Addr;
use crate::isa::ControlKind;

/// Static Branch Predictor structure.
#[derive(Debug)]
pub struct StaticPredictor {
    btb: Btb,
}

impl StaticPredictor {
    /// Creates a new Static Predictor.
    ///
    /// # Arguments
    ///
    /// * `btb_size` - Number of entries in the BTB.
    pub fn new(btb_size: usize) -> Self {
        Self {
            btb: Btb::new(btb_size),
        }
    }
}

impl BranchPredictor for StaticPredictor {
    fn predict(&self, pc: Addr, _history: u64, kind: ControlKind) -> Prediction {
        if kind.is_unconditional() {
            Prediction {
                taken: true,
                target: self.btb.lookup(pc),
            }
        } else {
            Prediction::NOT_TAKEN
        }
    }

    /// Only the BTB is trained; no direction state is kept.
    fn update(&mut self, outcome: &BranchOutcome) {
        if outcome.taken {
            self.btb.update(outcome.pc, outcome.target);
        }
    }
}
