//! In-flight micro-op state.
//!
//! A `DynInst` is created by fetch and lives in the core's instruction list until it commits
//! or is squashed. Every other structure (stage queues, time buffers, ROB, IQ, LSQ) refers
//! to it by sequence number, so removing it from the list is what destroys it.

use std::collections::BTreeMap;

use crate::common::{Addr, Cycle, Fault, PhysRegId, SeqNum, ThreadId};
use crate::core::units::bru::Prediction;
use crate::isa::StaticInst;

/// All in-flight micro-ops, ordered by sequence number.
pub type InstList = BTreeMap<SeqNum, DynInst>;

/// Progress of a micro-op through the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum InstStatus {
    /// Produced by fetch.
    #[default]
    Fetched,
    /// Passed decode.
    Decoded,
    /// Registers, ROB, IQ, and LSQ resources allocated.
    Renamed,
    /// Waiting in the instruction queue.
    Dispatched,
    /// Sent to a functional unit.
    Issued,
    /// Result written back; waiting to become visible to commit.
    Executed,
}

/// A micro-op in flight.
#[derive(Clone, Debug)]
pub struct DynInst {
    /// Program-order sequence number.
    pub seq: SeqNum,
    /// Hardware thread.
    pub tid: ThreadId,
    /// The pre-decoded micro-op.
    pub inst: StaticInst,
    /// Position in the thread's committed-path stream; `None` on a mispredicted path.
    pub stream_index: Option<u64>,
    /// Fetch-time prediction for control instructions.
    pub prediction: Prediction,
    /// Next PC fetch followed after this micro-op.
    pub predicted_next_pc: Addr,
    /// Global history the prediction was made with.
    pub history: u64,
    /// Fetch followed the wrong path after this micro-op and it has not been redirected yet.
    pub mispredicted: bool,
    /// The fetch-time prediction was wrong (kept after the redirect, for statistics).
    pub was_mispredicted: bool,
    /// Renamed source registers.
    pub src_regs: Vec<PhysRegId>,
    /// Newly allocated destination registers.
    pub dest_regs: Vec<PhysRegId>,
    /// ROB bank holding the entry.
    pub rob_bank: usize,
    /// An IQ slot is reserved but the micro-op has not been dispatched.
    pub iq_reserved: bool,
    /// Pipeline progress.
    pub status: InstStatus,
    /// Commit has seen the completion (after the IEW-to-commit delay).
    pub can_commit: bool,
    /// The load has been replayed at least once.
    pub replayed: bool,
    /// Architectural fault raised by this micro-op.
    pub fault: Option<Fault>,
    /// Cycle fetch produced the micro-op.
    pub fetched_at: Cycle,
    /// Cycle the micro-op was renamed.
    pub renamed_at: Option<Cycle>,
    /// Cycle the micro-op issued.
    pub issued_at: Option<Cycle>,
}

impl DynInst {
    /// Creates a freshly fetched micro-op.
    pub fn new(
        seq: SeqNum,
        tid: ThreadId,
        inst: StaticInst,
        stream_index: Option<u64>,
        fetched_at: Cycle,
    ) -> Self {
        let predicted_next_pc = inst.fallthrough();
        let fault = stream_index.and(inst.fault);
        Self {
            seq,
            tid,
            inst,
            stream_index,
            prediction: Prediction::NOT_TAKEN,
            predicted_next_pc,
            history: 0,
            mispredicted: false,
            was_mispredicted: false,
            src_regs: Vec::new(),
            dest_regs: Vec::new(),
            rob_bank: 0,
            iq_reserved: false,
            status: InstStatus::Fetched,
            can_commit: false,
            replayed: false,
            fault,
            fetched_at,
            renamed_at: None,
            issued_at: None,
        }
    }

    /// True for micro-ops fetched down a mispredicted path.
    #[inline]
    pub const fn is_wrong_path(&self) -> bool {
        self.stream_index.is_none()
    }

    /// True once the result has been written back.
    #[inline]
    pub fn is_executed(&self) -> bool {
        self.status == InstStatus::Executed
    }

    /// True if the micro-op must go through the instruction queue.
    ///
    /// No-ops and micro-ops that already carry a fault complete at dispatch.
    pub fn needs_execution(&self) -> bool {
        self.fault.is_none() && self.inst.op_class != crate::isa::OpClass::Nop
    }
}
