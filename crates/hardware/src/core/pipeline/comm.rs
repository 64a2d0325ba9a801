//! Signals exchanged between pipeline stages.
//!
//! Forward paths carry batches of sequence numbers. The backward path carries one
//! `BackwardSignals` record per cycle in which each later stage reports whether it is
//! blocked, which thread it has squashed and where fetch must resume, and (commit only)
//! how far each thread has retired.

use crate::common::{Addr, SeqNum};
use crate::config::MAX_THREADS;
use crate::isa::ControlKind;

/// Micro-ops moving forward between two stages in one cycle.
pub type StageBatch = Vec<SeqNum>;

/// A branch resolved by a squash, replayed into the fetch-side history on redirect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedBranch {
    /// Sequence number of the branch.
    pub seq: SeqNum,
    /// Branch category.
    pub kind: ControlKind,
    /// Actual direction.
    pub taken: bool,
    /// Return address pushed by a call.
    pub fallthrough: Addr,
}

/// Where fetch resumes after a squash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Redirect {
    /// Oldest squashed sequence number.
    pub from: SeqNum,
    /// Committed-path stream position of the next micro-op to fetch.
    pub index: u64,
    /// PC of that micro-op.
    pub pc: Addr,
    /// The mispredicted branch being corrected, if any.
    pub branch: Option<ResolvedBranch>,
}

/// What one stage reports to the stages before it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageSignals {
    /// The stage's input queue is over capacity.
    pub block: bool,
    /// Per-thread squash issued by this stage.
    pub redirect: [Option<Redirect>; MAX_THREADS],
    /// Per-thread youngest committed sequence number (commit only).
    pub done_seq: [Option<SeqNum>; MAX_THREADS],
}

/// One cycle's worth of backward signals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackwardSignals {
    /// From decode.
    pub decode: StageSignals,
    /// From rename.
    pub rename: StageSignals,
    /// From issue/execute/writeback.
    pub iew: StageSignals,
    /// From commit.
    pub commit: StageSignals,
}
