//! Branch prediction unit (BRU) implementations.
//!
//! The core treats direction prediction as a pluggable collaborator. This module contains
//! the interface, two concrete variants (static and gshare), the shared branch target
//! buffer, and the per-thread return address stack.

pub use self::branch_predictor::{BranchOutcome, BranchPredictor, Prediction};

/// Branch predictor trait and prediction/outcome records.
pub mod branch_predictor;

/// Branch Target Buffer for storing predicted branch targets.
pub mod btb;

/// Global history branch predictor (gshare algorithm).
pub mod gshare;

/// Return Address Stack for predicting return addresses.
pub mod ras;

/// Static branch predictor (always not-taken).
pub mod static_bp;

use self::{gshare::GSharePredictor, static_bp::StaticPredictor};
use crate::common::Addr;
use crate::config::{BranchPredictorConfig, BranchPredictorKind};
use crate::isa::ControlKind;

/// Enum wrapper for static dispatch of Branch Predictors.
/// This avoids vtable lookups in the critical fetch loop.
#[derive(Debug)]
pub enum BranchPredictorWrapper {
    /// Always-not-taken predictor.
    Static(StaticPredictor),
    /// Global-history predictor.
    GShare(GSharePredictor),
}

impl BranchPredictorWrapper {
    /// Creates the predictor selected by the configuration.
    pub fn new(config: &BranchPredictorConfig) -> Self {
        match config.kind {
            BranchPredictorKind::Static => Self::Static(StaticPredictor::new(config.btb_size)),
            BranchPredictorKind::GShare => {
                Self::GShare(GSharePredictor::new(config.btb_size, config.history_bits))
            }
        }
    }
}

impl BranchPredictor for BranchPredictorWrapper {
    #[inline(always)]
    fn predict(&self, pc: Addr, history: u64, kind: ControlKind) -> Prediction {
        match self {
            Self::Static(bp) => bp.predict(pc, history, kind),
            Self::GShare(bp) => bp.predict(pc, history, kind),
        }
    }

    #[inline(always)]
    fn update(&mut self, outcome: &BranchOutcome) {
        match self {
            Self::Static(bp) => bp.update(outcome),
            Self::GShare(bp) => bp.update(outcome),
        }
    }
}
