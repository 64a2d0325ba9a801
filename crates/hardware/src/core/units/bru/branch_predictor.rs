//! Branch Predictor Interface.
//!
//! This module defines the `BranchPredictor` trait that pluggable direction/target
//! predictors implement. The global history register is owned by each hardware
//! thread's fetch state and passed in explicitly, so a predictor can be shared by
//! every thread and history can be rolled back on a squash without predictor support.

use crate::common::Addr;
use crate::isa::ControlKind;

/// A prediction made at fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Prediction {
    /// Whether control is predicted to transfer.
    pub taken: bool,
    /// Predicted target, if the predictor knows one.
    pub target: Option<Addr>,
}

impl Prediction {
    /// A not-taken prediction.
    pub const NOT_TAKEN: Self = Self {
        taken: false,
        target: None,
    };

    /// The next fetch PC implied by this prediction.
    ///
    /// A taken prediction without a known target falls through.
    pub const fn next_pc(&self, fallthrough: Addr) -> Addr {
        match (self.taken, self.target) {
            (true, Some(target)) => target,
            _ => fallthrough,
        }
    }
}

/// The resolved outcome of a committed branch, used for training.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchOutcome {
    /// Program counter of the branch.
    pub pc: Addr,
    /// Branch category.
    pub kind: ControlKind,
    /// Whether the branch was taken.
    pub taken: bool,
    /// Actual target when taken.
    pub target: Addr,
    /// Global history the prediction was made with.
    pub history: u64,
}

/// Trait for branch prediction algorithms.
pub trait BranchPredictor {
    /// Predicts the direction and target of the control instruction at `pc`.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter of the branch instruction
    /// * `history` - The fetching thread's global history register
    /// * `kind` - Control-flow category, known from pre-decode
    ///
    /// # Returns
    ///
    /// The predicted direction and, when known, the target.
    fn predict(&self, pc: Addr, history: u64, kind: ControlKind) -> Prediction;

    /// Trains the predictor with a resolved outcome.
    fn update(&mut self, outcome: &BranchOutcome);
}
