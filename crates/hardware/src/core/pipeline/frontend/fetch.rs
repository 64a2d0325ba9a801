//! Fetch stage.
//!
//! Fetch walks each hardware thread's instruction stream and turns it into in-flight
//! micro-ops. Per cycle it:
//! 1. **Redirects:** Applies the redirect matching the thread's outstanding squash, repairing
//!    the global history and return address stack from the checkpoint taken at fetch.
//! 2. **Thread selection:** Orders the runnable threads with the SMT fetch policy and lets up
//!    to `num_fetching_threads` of them share `fetch_width` slots.
//! 3. **Prediction:** Looks up every control micro-op in the branch predictor (returns use the
//!    RAS) and follows the predicted path, stopping at a predicted-taken branch. A prediction
//!    that disagrees with the committed path sends the thread down the wrong path.
//! 4. **Instruction cache:** Micro-ops are only produced from a fetch-buffer block that has
//!    arrived from the L1I; one block request is issued per cycle, running ahead of fetch.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::common::{Addr, Fault, FaultKind, SeqNum, ThreadId};
use crate::config::Config;
use crate::core::Cpu;
use crate::core::dyn_inst::DynInst;
use crate::core::pipeline::comm::Redirect;
use crate::core::pipeline::smt::{self, ThreadLoad};
use crate::core::units::bru::ras::Ras;
use crate::core::units::bru::{BranchPredictor, Prediction};
use crate::isa::{ControlKind, InstSource};
use crate::soc::ReqId;

/// Blocks requested beyond the one fetch is currently reading.
const LOOKAHEAD_BLOCKS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FetchBlock {
    addr: Addr,
    req: ReqId,
    ready: bool,
}

/// Instruction bytes delivered by the L1I, in `fetch_buffer_size` aligned blocks.
#[derive(Clone, Debug)]
pub struct FetchBuffer {
    block_bytes: u64,
    blocks: VecDeque<FetchBlock>,
}

impl FetchBuffer {
    /// Creates an empty buffer of `block_bytes`-sized blocks.
    pub fn new(block_bytes: usize) -> Self {
        Self {
            block_bytes: block_bytes.max(1) as u64,
            blocks: VecDeque::new(),
        }
    }

    /// Aligned block holding `pc`.
    pub const fn block_of(&self, pc: Addr) -> Addr {
        pc & !(self.block_bytes - 1)
    }

    /// Drops blocks fetch has moved past. If `pc` is outside every buffered block the whole
    /// buffer is discarded.
    pub fn align(&mut self, pc: Addr) {
        let block = self.block_of(pc);
        match self.blocks.iter().position(|b| b.addr == block) {
            Some(pos) => {
                self.blocks.drain(..pos);
            }
            None => self.blocks.clear(),
        }
    }

    /// True if the block holding `pc` has arrived.
    pub fn is_ready(&self, pc: Addr) -> bool {
        self.blocks
            .front()
            .is_some_and(|b| b.ready && b.addr == self.block_of(pc))
    }

    /// Next block to request, if the buffer has room for one.
    pub fn next_request(&self, pc: Addr) -> Option<Addr> {
        match self.blocks.back() {
            None => Some(self.block_of(pc)),
            Some(last) if self.blocks.len() <= LOOKAHEAD_BLOCKS => Some(last.addr + self.block_bytes),
            Some(_) => None,
        }
    }

    /// Records an accepted request for `addr`.
    pub fn requested(&mut self, addr: Addr, req: ReqId) {
        self.blocks.push_back(FetchBlock {
            addr,
            req,
            ready: false,
        });
    }

    /// Marks the block of request `req` as arrived. Responses for discarded blocks are ignored.
    pub fn fill(&mut self, req: ReqId) {
        if let Some(block) = self.blocks.iter_mut().find(|b| b.req == req) {
            block.ready = true;
        }
    }

    /// Blocks buffered or in flight.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if nothing is buffered or in flight.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Speculative predictor state saved before a control micro-op was predicted.
#[derive(Clone, Debug)]
struct HistoryCheckpoint {
    seq: SeqNum,
    ghr: u64,
    ras: Ras,
}

/// Fetch state of one hardware thread.
#[derive(Clone, Debug)]
pub struct FetchThread {
    /// Next committed-path stream position; frozen while on a wrong path.
    pub index: u64,
    /// Next fetch PC.
    pub pc: Addr,
    /// Fetching down a mispredicted path.
    pub wrong_path: bool,
    /// The committed-path stream has ended.
    pub done: bool,
    /// Waiting for the redirect that follows a fetch fault.
    pub stalled: bool,
    /// Speculative global history register.
    pub ghr: u64,
    /// Speculative return address stack.
    pub ras: Ras,
    /// Fetched micro-ops not yet sent to decode.
    pub queue: VecDeque<SeqNum>,
    /// Instruction blocks from the L1I.
    pub buffer: FetchBuffer,
    checkpoints: VecDeque<HistoryCheckpoint>,
    history_mask: u64,
}

impl FetchThread {
    /// Creates a thread positioned at the start of its stream.
    pub fn new(config: &Config) -> Self {
        let bits = config.branch_predictor.history_bits;
        Self {
            index: 0,
            pc: 0,
            wrong_path: false,
            done: false,
            stalled: false,
            ghr: 0,
            ras: Ras::new(config.branch_predictor.ras_size),
            queue: VecDeque::new(),
            buffer: FetchBuffer::new(config.pipeline.fetch_buffer_size),
            checkpoints: VecDeque::new(),
            history_mask: 1u64.checked_shl(bits).map_or(u64::MAX, |v| v - 1),
        }
    }

    /// True if the thread can fetch this cycle.
    pub const fn is_active(&self) -> bool {
        !self.done && !self.stalled
    }

    fn shift_history(&mut self, taken: bool) {
        self.ghr = ((self.ghr << 1) | u64::from(taken)) & self.history_mask;
    }

    fn checkpoint(&mut self, seq: SeqNum) {
        self.checkpoints.push_back(HistoryCheckpoint {
            seq,
            ghr: self.ghr,
            ras: self.ras.clone(),
        });
    }

    fn restore(&mut self, checkpoint: &HistoryCheckpoint) {
        self.ghr = checkpoint.ghr;
        self.ras = checkpoint.ras.clone();
    }

    /// Resumes fetch at `redirect`, rolling the speculative history back to the squash point.
    ///
    /// When the redirect corrects a branch, the branch's own checkpoint is restored and its
    /// actual outcome replayed; otherwise the oldest squashed control micro-op's checkpoint
    /// is restored.
    pub fn redirect(&mut self, redirect: &Redirect) {
        self.index = redirect.index;
        self.pc = redirect.pc;
        self.wrong_path = false;
        self.done = false;
        self.stalled = false;

        let restore_point = match redirect.branch {
            Some(branch) => self.checkpoints.iter().find(|c| c.seq == branch.seq),
            None => self.checkpoints.iter().find(|c| c.seq >= redirect.from),
        }
        .cloned();
        if let Some(checkpoint) = restore_point {
            self.restore(&checkpoint);
        }
        if let Some(branch) = redirect.branch {
            match branch.kind {
                ControlKind::CondDirect => self.shift_history(branch.taken),
                ControlKind::Call => self.ras.push(branch.fallthrough),
                ControlKind::Return => {
                    let _ = self.ras.pop();
                }
                ControlKind::UncondDirect | ControlKind::Indirect => {}
            }
        }
        self.checkpoints.retain(|c| c.seq < redirect.from);
    }

    /// Forgets checkpoints of control micro-ops up to and including `seq`, which has committed.
    pub fn retire_checkpoints(&mut self, seq: SeqNum) {
        while self.checkpoints.front().is_some_and(|c| c.seq <= seq) {
            self.checkpoints.pop_front();
        }
    }

    /// Checkpoints still held.
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }
}

/// Executes the fetch stage for one cycle.
pub fn fetch_stage(cpu: &mut Cpu, source: &mut dyn InstSource) {
    apply_redirects(cpu);

    let p = &cpu.config.pipeline;
    let decode_blocked = cpu.backward.wire(p.decode_to_fetch_delay as usize).decode.block;
    let rename_blocked = cpu.backward.wire(p.rename_to_fetch_delay as usize).rename.block;
    let fetch_width = p.fetch_width;

    let candidates: Vec<ThreadId> = (0..cpu.threads)
        .filter(|&t| cpu.pending_redirect[t].is_none() && cpu.fetch[t].is_active())
        .collect();
    let loads = thread_loads(cpu);
    let order = smt::fetch_order(
        cpu.config.smt.fetch_policy,
        &candidates,
        &loads,
        cpu.fetch_rotation,
    );
    cpu.fetch_rotation = cpu.fetch_rotation.wrapping_add(1);

    let mut budget = fetch_width;
    for tid in order
        .into_iter()
        .take(cpu.config.smt.num_fetching_threads)
    {
        if budget == 0 {
            break;
        }
        budget -= fetch_thread(cpu, source, tid, budget);
        if !rename_blocked {
            request_block(cpu, tid);
        }
    }

    if !decode_blocked {
        send_to_decode(cpu, fetch_width);
    }
}

/// Applies, per thread, the redirect that matches its outstanding squash.
fn apply_redirects(cpu: &mut Cpu) {
    let p = &cpu.config.pipeline;
    let (d, i, c) = (
        p.decode_to_fetch_delay as usize,
        p.iew_to_fetch_delay as usize,
        p.commit_to_fetch_delay as usize,
    );
    for tid in 0..cpu.threads {
        let Some(pending) = cpu.pending_redirect[tid] else {
            continue;
        };
        let redirect = [
            cpu.backward.wire(d).decode.redirect[tid],
            cpu.backward.wire(i).iew.redirect[tid],
            cpu.backward.wire(c).commit.redirect[tid],
        ]
        .into_iter()
        .flatten()
        .find(|r| r.from == pending);
        if let Some(redirect) = redirect {
            cpu.fetch[tid].redirect(&redirect);
            cpu.pending_redirect[tid] = None;
            debug!(
                tid,
                from = %redirect.from,
                index = redirect.index,
                pc = redirect.pc,
                "fetch redirected"
            );
        }
    }
}

fn thread_loads(cpu: &Cpu) -> Vec<ThreadLoad> {
    let mut loads = vec![ThreadLoad::default(); cpu.threads];
    if cpu.threads > 1 {
        for inst in cpu.insts.values() {
            if inst.inst.is_control() && !inst.is_executed() {
                loads[inst.tid].branches += 1;
            }
        }
        for (tid, load) in loads.iter_mut().enumerate() {
            load.iq = cpu.iq.thread_count(tid);
            load.lsq = cpu.lsq.thread_count(tid);
        }
    }
    loads
}

/// Fetches up to `budget` micro-ops for `tid`.
///
/// # Returns
///
/// The number of micro-ops fetched.
fn fetch_thread(cpu: &mut Cpu, source: &mut dyn InstSource, tid: ThreadId, budget: usize) -> usize {
    let now = cpu.now;
    let mem_size = cpu.config.memory.size_bytes;
    let queue_size = cpu.config.pipeline.fetch_queue_size;
    let mut fetched = 0;

    while fetched < budget && cpu.fetch[tid].queue.len() < queue_size {
        let thread = &mut cpu.fetch[tid];
        if !thread.is_active() {
            break;
        }
        let (inst, stream_index) = if thread.wrong_path {
            (source.wrong_path(tid, thread.pc), None)
        } else {
            match source.inst_at(tid, thread.index) {
                Some(inst) => {
                    thread.pc = inst.pc;
                    (inst, Some(thread.index))
                }
                None => {
                    thread.done = true;
                    debug!(tid, index = thread.index, "instruction stream exhausted");
                    break;
                }
            }
        };
        let pc = thread.pc;

        if pc >= mem_size {
            if thread.wrong_path {
                break;
            }
            // Nothing to fetch from; the micro-op carries the fault to commit.
            thread.stalled = true;
            let seq = cpu.next_seq;
            cpu.next_seq = seq.next();
            let mut dyn_inst = DynInst::new(seq, tid, inst, stream_index, now);
            dyn_inst.fault = Some(Fault::new(FaultKind::InstructionAccess, pc));
            debug!(tid, %seq, pc, "instruction fetch fault");
            push_fetched(cpu, dyn_inst);
            fetched += 1;
            break;
        }

        thread.buffer.align(pc);
        if !thread.buffer.is_ready(pc) {
            if fetched == 0 {
                cpu.stats.icache_stall_cycles += 1;
            }
            break;
        }

        let seq = cpu.next_seq;
        cpu.next_seq = seq.next();
        let mut dyn_inst = DynInst::new(seq, tid, inst, stream_index, now);
        let fallthrough = dyn_inst.inst.fallthrough();
        let mut next_pc = fallthrough;

        if let Some(control) = dyn_inst.inst.control {
            let thread = &mut cpu.fetch[tid];
            thread.checkpoint(seq);
            dyn_inst.history = thread.ghr;
            let prediction = match control.kind {
                ControlKind::Return => Prediction {
                    taken: true,
                    target: thread.ras.pop(),
                },
                kind => cpu.predictor.predict(pc, thread.ghr, kind),
            };
            match control.kind {
                ControlKind::Call => thread.ras.push(fallthrough),
                ControlKind::CondDirect => thread.shift_history(prediction.taken),
                _ => {}
            }
            next_pc = prediction.next_pc(fallthrough);
            dyn_inst.prediction = prediction;
            cpu.stats.branch_lookups += 1;
        }
        dyn_inst.predicted_next_pc = next_pc;

        let thread = &mut cpu.fetch[tid];
        if thread.wrong_path {
            cpu.stats.wrong_path_fetched += 1;
        } else {
            thread.index += 1;
            if next_pc != dyn_inst.inst.next_pc() {
                dyn_inst.mispredicted = true;
                dyn_inst.was_mispredicted = true;
                thread.wrong_path = true;
                trace!(tid, %seq, pc, predicted = next_pc, "fetch follows a mispredicted path");
            }
        }
        thread.pc = next_pc;
        push_fetched(cpu, dyn_inst);
        fetched += 1;

        if next_pc != fallthrough {
            break;
        }
    }
    fetched
}

fn push_fetched(cpu: &mut Cpu, inst: DynInst) {
    cpu.fetch[inst.tid].queue.push_back(inst.seq);
    cpu.stats.fetched += 1;
    let _ = cpu.insts.insert(inst.seq, inst);
}

/// Issues the next instruction-block request of `tid`, if the L1I port is free.
fn request_block(cpu: &mut Cpu, tid: ThreadId) {
    let mem_size = cpu.config.memory.size_bytes;
    let thread = &mut cpu.fetch[tid];
    if !thread.is_active() || cpu.pending_redirect[tid].is_some() {
        return;
    }
    thread.buffer.align(thread.pc);
    let Some(addr) = thread.buffer.next_request(thread.pc) else {
        return;
    };
    if addr >= mem_size {
        return;
    }
    if let Ok(req) = cpu.mem.try_fetch(addr, cpu.now) {
        thread.buffer.requested(addr, req);
    }
}

/// Moves up to `width` fetched micro-ops into the fetch-to-decode buffer, oldest first.
fn send_to_decode(cpu: &mut Cpu, width: usize) {
    let mut sent = 0;
    while sent < width {
        let oldest = (0..cpu.threads)
            .filter_map(|t| cpu.fetch[t].queue.front().map(|&s| (s, t)))
            .min();
        let Some((seq, tid)) = oldest else {
            break;
        };
        cpu.fetch[tid].queue.pop_front();
        cpu.fetch_to_decode.current().push(seq);
        sent += 1;
    }
}
