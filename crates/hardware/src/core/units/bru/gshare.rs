//! GShare Branch Predictor.
//!
//! GShare correlates global branch history with the program counter using an XOR
//! hash. This allows the predictor to distinguish the same branch instruction
//! in different execution contexts.
//!
//! # Performance
//!
//! - **Time Complexity:** `predict()` and `update()` are O(1)
//! - **Space Complexity:** O(2^N) two-bit counters, N = configured history bits
//! - **Best Case:** Correlated branches where outcome depends on recent history
//! - **Worst Case:** Uncorrelated branches or history length too short/long for pattern

use super::{BranchOutcome, BranchPredictor, Prediction, btb::Btb};
use crate::common::Addr;
use crate::isa::ControlKind;

/// Counter value at and above which a branch is predicted taken.
const TAKEN_THRESHOLD: u8 = 2;
/// Saturating counter maximum.
const COUNTER_MAX: u8 = 3;

/// GShare Predictor structure.
#[derive(Debug)]
pub struct GSharePredictor {
    /// Pattern History Table containing 2-bit saturating counters.
    pht: Vec<u8>,
    mask: u64,
    btb: Btb,
}

impl GSharePredictor {
    /// Creates a GShare predictor with a `2^history_bits` entry pattern table.
    pub fn new(btb_size: usize, history_bits: u32) -> Self {
        let size = 1usize << history_bits;
        Self {
            pht: vec![1; size],
            mask: size as u64 - 1,
            btb: Btb::new(btb_size),
        }
    }

    /// XOR of the word-aligned PC and the global history.
    const fn index(&self, pc: Addr, history: u64) -> usize {
        (((pc >> 2) ^ history) & self.mask) as usize
    }
}

impl BranchPredictor for GSharePredictor {
    fn predict(&self, pc: Addr, history: u64, kind: ControlKind) -> Prediction {
        let taken = kind.is_unconditional()
            || self.pht[self.index(pc, history)] >= TAKEN_THRESHOLD;
        if taken {
            Prediction {
                taken,
                target: self.btb.lookup(pc),
            }
        } else {
            Prediction::NOT_TAKEN
        }
    }

    /// Trains the counter selected at prediction time and records taken targets.
    fn update(&mut self, outcome: &BranchOutcome) {
        if outcome.kind == ControlKind::CondDirect {
            let idx = self.index(outcome.pc, outcome.history);
            let counter = &mut self.pht[idx];
            if outcome.taken {
                *counter = (*counter + 1).min(COUNTER_MAX);
            } else {
                *counter = counter.saturating_sub(1);
            }
        }
        if outcome.taken {
            self.btb.update(outcome.pc, outcome.target);
        }
    }
}
