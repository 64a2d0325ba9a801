//! CPU Core Definition and Cycle Loop.
//!
//! This module defines the central `Cpu` structure, which owns every pipeline structure and
//! the memory hierarchy, and steps them one cycle at a time. It coordinates the following:
//! 1. **Instruction Tracking:** All in-flight micro-ops live in one list keyed by sequence
//!    number; every other structure refers to them by sequence number.
//! 2. **Stage Scheduling:** Each cycle delivers memory responses, then runs Fetch, Decode,
//!    Rename, IEW and Commit, then advances every time buffer.
//! 3. **Squash:** Removes a thread's micro-ops from a sequence number on and tells fetch
//!    where to resume.
//! 4. **Inspection:** Drain detection, structural snapshots, and statistics.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use tracing::debug;

use crate::common::{Addr, Cycle, PhysRegId, SeqNum, ThreadId};
use crate::config::Config;
use crate::core::dyn_inst::InstList;
use crate::core::lsq::LoadStoreQueue;
use crate::core::lsq::mem_dep::MemDepUnit;
use crate::core::pipeline::backend::commit::{PendingTrap, commit_stage};
use crate::core::pipeline::backend::iew::{ExecEvent, LoadRetry, iew_stage};
use crate::core::pipeline::comm::{BackwardSignals, Redirect, StageBatch};
use crate::core::pipeline::frontend::decode::decode_stage;
use crate::core::pipeline::frontend::fetch::{FetchThread, fetch_stage};
use crate::core::pipeline::frontend::rename::rename_stage;
use crate::core::pipeline::inst_queue::InstQueue;
use crate::core::pipeline::rob::Rob;
use crate::core::pipeline::scoreboard::Scoreboard;
use crate::core::pipeline::time_buffer::TimeBuffer;
use crate::core::rename::Renamer;
use crate::core::units::bru::BranchPredictorWrapper;
use crate::core::units::fu_pool::FuPool;
use crate::isa::InstSource;
use crate::sim::EventQueue;
use crate::soc::{MemPort, MemoryHierarchy, ReqId};
use crate::stats::{SimStats, SquashCause};

/// The out-of-order core and its memory hierarchy.
///
/// Stages are free functions over `&mut Cpu`; the fields are public so they can reach any
/// structure without borrow-splitting helpers.
pub struct Cpu {
    /// Validated configuration.
    pub config: Config,
    /// Hardware threads.
    pub threads: usize,
    /// Current cycle.
    pub now: Cycle,
    /// Next sequence number to hand out.
    pub next_seq: SeqNum,
    /// Every in-flight micro-op.
    pub insts: InstList,

    /// Per-thread fetch state.
    pub fetch: Vec<FetchThread>,
    /// Micro-ops that reached decode and have not been sent on.
    pub decode_queue: Vec<VecDeque<SeqNum>>,
    /// Micro-ops that reached rename and have not been renamed.
    pub rename_queue: Vec<VecDeque<SeqNum>>,
    /// Renamed micro-ops that have not entered the IQ.
    pub dispatch_queue: Vec<VecDeque<SeqNum>>,

    /// Fetch to decode.
    pub fetch_to_decode: TimeBuffer<StageBatch>,
    /// Decode to rename.
    pub decode_to_rename: TimeBuffer<StageBatch>,
    /// Rename to IEW.
    pub rename_to_iew: TimeBuffer<StageBatch>,
    /// IEW to commit (completed micro-ops).
    pub iew_to_commit: TimeBuffer<StageBatch>,
    /// Block, squash, and commit signals flowing toward fetch.
    pub backward: TimeBuffer<BackwardSignals>,

    /// Direction and target predictor.
    pub predictor: BranchPredictorWrapper,
    /// Register renamer.
    pub renamer: Renamer,
    /// Physical register ready bits.
    pub scoreboard: Scoreboard,
    /// Reorder buffer.
    pub rob: Rob,
    /// Instruction queue.
    pub iq: InstQueue,
    /// Load and store queues.
    pub lsq: LoadStoreQueue,
    /// Store-set memory dependence unit.
    pub mem_dep: MemDepUnit,
    /// Functional units.
    pub fu_pool: FuPool,
    /// Caches, crossbars, and memory controller.
    pub mem: MemoryHierarchy,

    /// Functional-unit completions and address generations in flight.
    pub events: EventQueue<ExecEvent>,
    /// Micro-ops waiting for a writeback port.
    pub wb_ready: BTreeSet<SeqNum>,
    /// Loads waiting to retry.
    pub pending_loads: BTreeMap<SeqNum, LoadRetry>,
    /// Outstanding L1D load requests.
    pub load_requests: BTreeMap<ReqId, SeqNum>,
    /// Load responses delivered this cycle.
    pub load_responses: Vec<ReqId>,
    /// Per-thread store write in flight (total store order allows one).
    pub store_in_flight: Vec<Option<ReqId>>,
    /// Per-thread oldest squashed sequence number fetch has not yet been redirected for.
    pub pending_redirect: Vec<Option<SeqNum>>,
    /// Per-thread fault waiting out its trap latency.
    pub traps: Vec<Option<PendingTrap>>,

    /// Fetch round-robin position.
    pub fetch_rotation: usize,
    /// Commit round-robin position.
    pub commit_rotation: usize,
    /// Last cycle anything committed.
    pub last_commit: Cycle,
    /// Counters.
    pub stats: SimStats,
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("threads", &self.threads)
            .field("now", &self.now)
            .field("next_seq", &self.next_seq)
            .field("in_flight", &self.insts.len())
            .field("pending_redirect", &self.pending_redirect)
            .finish_non_exhaustive()
    }
}

/// Structural state of the core, for comparing two cores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CpuSnapshot {
    /// In-flight sequence numbers.
    pub insts: Vec<SeqNum>,
    /// ROB contents per thread, oldest first.
    pub rob: Vec<Vec<SeqNum>>,
    /// Load and store queue contents per thread.
    pub lsq: Vec<(Vec<SeqNum>, Vec<SeqNum>)>,
    /// Micro-ops waiting in the IQ.
    pub iq_waiting: Vec<SeqNum>,
    /// IQ slots held per thread.
    pub iq_threads: Vec<usize>,
    /// Free physical registers, sorted.
    pub free_regs: Vec<PhysRegId>,
    /// Mapped physical registers, sorted.
    pub live_regs: Vec<PhysRegId>,
    /// Outstanding redirects.
    pub pending_redirect: Vec<Option<SeqNum>>,
    /// Fetch position per thread: stream index and PC.
    pub fetch: Vec<(u64, Addr)>,
}

impl Cpu {
    /// Creates a core in its reset state.
    ///
    /// # Arguments
    ///
    /// * `config` - A configuration that has passed `Config::validate`
    pub fn new(config: &Config) -> Self {
        let threads = config.general.num_threads;
        let p = &config.pipeline;
        let forward = p.forward_com_size as usize;
        let backward = p.backward_com_size as usize;
        Self {
            config: config.clone(),
            threads,
            now: 0,
            next_seq: SeqNum(1),
            insts: InstList::new(),
            fetch: (0..threads).map(|_| FetchThread::new(config)).collect(),
            decode_queue: vec![VecDeque::new(); threads],
            rename_queue: vec![VecDeque::new(); threads],
            dispatch_queue: vec![VecDeque::new(); threads],
            fetch_to_decode: TimeBuffer::new(forward),
            decode_to_rename: TimeBuffer::new(forward),
            rename_to_iew: TimeBuffer::new(forward),
            iew_to_commit: TimeBuffer::new(forward),
            backward: TimeBuffer::new(backward),
            predictor: BranchPredictorWrapper::new(&config.branch_predictor),
            renamer: Renamer::new(&config.resources, threads),
            scoreboard: Scoreboard::new(&config.resources),
            rob: Rob::new(config),
            iq: InstQueue::new(config),
            lsq: LoadStoreQueue::new(config),
            mem_dep: MemDepUnit::new(&config.lsq),
            fu_pool: FuPool::new(&config.fu_pool, p.issue_width, p.wb_width),
            mem: MemoryHierarchy::new(config),
            events: EventQueue::new(),
            wb_ready: BTreeSet::new(),
            pending_loads: BTreeMap::new(),
            load_requests: BTreeMap::new(),
            load_responses: Vec::new(),
            store_in_flight: vec![None; threads],
            pending_redirect: vec![None; threads],
            traps: vec![None; threads],
            fetch_rotation: 0,
            commit_rotation: 0,
            last_commit: 0,
            stats: SimStats::new(threads, p.commit_width),
        }
    }

    /// Advances the core by one clock cycle.
    pub fn tick(&mut self, source: &mut dyn InstSource) {
        self.mem.begin_cycle();
        self.fu_pool.begin_cycle();

        for response in self.mem.tick(self.now) {
            match response.port {
                MemPort::Fetch => {
                    for thread in &mut self.fetch {
                        thread.buffer.fill(response.id);
                    }
                }
                MemPort::Load => self.load_responses.push(response.id),
                MemPort::Store => {
                    for slot in &mut self.store_in_flight {
                        if *slot == Some(response.id) {
                            *slot = None;
                        }
                    }
                }
            }
        }
        let line_bytes = self.mem.line_bytes();
        for line in self.mem.take_l1_d_invalidations() {
            self.lsq.snoop(line, line_bytes);
        }

        fetch_stage(self, source);
        decode_stage(self);
        rename_stage(self);
        iew_stage(self);
        let _ = commit_stage(self, source);

        self.fetch_to_decode.advance();
        self.decode_to_rename.advance();
        self.rename_to_iew.advance();
        self.iew_to_commit.advance();
        self.backward.advance();
        self.now += 1;
    }

    /// Squashes every micro-op of `tid` from `redirect.from` on and schedules the fetch
    /// redirect.
    ///
    /// A squash at or after one the thread is still waiting to be redirected for has already
    /// been covered and is ignored, so repeating a squash changes nothing.
    ///
    /// # Arguments
    ///
    /// * `tid` - Thread to squash
    /// * `cause` - Which stage detected the misspeculation
    /// * `redirect` - Oldest micro-op to remove and where fetch resumes
    pub fn squash(&mut self, tid: ThreadId, cause: SquashCause, redirect: Redirect) {
        let from = redirect.from;
        if self.pending_redirect[tid].is_some_and(|pending| from >= pending) {
            return;
        }

        let doomed: Vec<SeqNum> = self
            .insts
            .range(from..)
            .filter(|(_, inst)| inst.tid == tid)
            .map(|(&seq, _)| seq)
            .collect();
        for seq in &doomed {
            if let Some(inst) = self.insts.remove(seq)
                && inst.iq_reserved
            {
                self.iq.unreserve(tid);
            }
        }

        self.fetch[tid].queue.retain(|&s| s < from);
        self.decode_queue[tid].retain(|&s| s < from);
        self.rename_queue[tid].retain(|&s| s < from);
        self.dispatch_queue[tid].retain(|&s| s < from);

        let insts = &self.insts;
        let live = |s: &SeqNum| insts.contains_key(s);
        self.fetch_to_decode.for_each_mut(|b| b.retain(live));
        self.decode_to_rename.for_each_mut(|b| b.retain(live));
        self.rename_to_iew.for_each_mut(|b| b.retain(live));
        self.iew_to_commit.for_each_mut(|b| b.retain(live));
        self.wb_ready.retain(live);
        self.pending_loads.retain(|s, _| live(s));
        self.load_requests.retain(|_, s| live(s));
        self.events.retain(|e| e.tid != tid || e.seq < from);

        let _ = self.rob.squash(tid, from);
        self.iq.squash(tid, from);
        self.lsq.squash(tid, from);
        self.mem_dep.squash(tid, from);
        let _ = self.renamer.squash(tid, from);
        if self.traps[tid].is_some_and(|t| t.seq >= from) {
            self.traps[tid] = None;
        }

        self.pending_redirect[tid] = Some(from);
        let signals = self.backward.current();
        let stage = match cause {
            SquashCause::DecodeRedirect => &mut signals.decode,
            SquashCause::BranchMispredict | SquashCause::MemoryOrder => &mut signals.iew,
            SquashCause::Fault => &mut signals.commit,
        };
        stage.redirect[tid] = Some(redirect);

        self.stats.squashes.record(cause);
        self.stats.squashes.squashed_insts += doomed.len() as u64;
        debug!(
            tid,
            %from,
            ?cause,
            squashed = doomed.len(),
            resume_pc = redirect.pc,
            "squash"
        );
    }

    /// True once every stream has ended and nothing is left in flight.
    pub fn is_drained(&self) -> bool {
        self.fetch.iter().all(|t| t.done)
            && self.insts.is_empty()
            && self.lsq.is_empty()
            && self.traps.iter().all(Option::is_none)
            && self.store_in_flight.iter().all(Option::is_none)
            && self.pending_redirect.iter().all(Option::is_none)
    }

    /// Captures the structural state.
    pub fn snapshot(&self) -> CpuSnapshot {
        let mut free_regs = self.renamer.free_regs();
        free_regs.sort_unstable();
        let mut live_regs = self.renamer.live_regs();
        live_regs.sort_unstable();
        CpuSnapshot {
            insts: self.insts.keys().copied().collect(),
            rob: (0..self.threads)
                .map(|t| self.rob.thread_entries(t))
                .collect(),
            lsq: (0..self.threads)
                .map(|t| self.lsq.thread_entries(t))
                .collect(),
            iq_waiting: self.iq.waiting(),
            iq_threads: (0..self.threads).map(|t| self.iq.thread_count(t)).collect(),
            free_regs,
            live_regs,
            pending_redirect: self.pending_redirect.clone(),
            fetch: self.fetch.iter().map(|t| (t.index, t.pc)).collect(),
        }
    }

    /// Statistics so far, including the memory-side and dependence-predictor counters.
    pub fn stats(&self) -> SimStats {
        let mut stats = self.stats.clone();
        stats.cycles = self.now;
        self.mem.collect_stats(&mut stats);
        stats.predicted_dependences = self.mem_dep.predicted_dependences();
        stats.store_set_clears = self.mem_dep.clears();
        stats
    }
}
