//! Issue / Execute / Writeback (IEW) stage.
//!
//! IEW owns everything between rename and commit. Per cycle, in order:
//! 1. **Completions:** Load data returned by the L1D and functional-unit completions due this
//!    cycle become ready for writeback; memory micro-ops due for address generation execute
//!    against the LSQ.
//! 2. **Load retries:** Loads that were replayed or refused by the L1D try again.
//! 3. **Writeback:** Oldest first, at most `wb_width` per cycle across the stage. Writeback
//!    wakes dependents and resolves branches; a mispredicted branch squashes everything
//!    younger.
//! 4. **Dispatch:** Up to `dispatch_width` renamed micro-ops enter the IQ (memory micro-ops
//!    are registered with the memory dependence unit first).
//! 5. **Issue:** Oldest ready micro-ops are sent to free functional units.
//! 6. **Store drain:** Committed stores are written to the L1D from the head of the SQ.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::common::{Addr, Fault, FaultKind, SeqNum, ThreadId};
use crate::core::Cpu;
use crate::core::dyn_inst::InstStatus;
use crate::core::lsq::{LoadResolution, Violation};
use crate::core::pipeline::comm::{Redirect, ResolvedBranch, StageSignals};
use crate::stats::SquashCause;

/// What happens when a scheduled execution event fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecKind {
    /// The functional unit has produced the result.
    Complete,
    /// A memory micro-op's address is ready; access the LSQ and cache.
    Execute,
}

/// A scheduled execution event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecEvent {
    /// Thread of the micro-op.
    pub tid: ThreadId,
    /// The micro-op.
    pub seq: SeqNum,
    /// Event type.
    pub kind: ExecKind,
}

/// Why a load is waiting to try again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadRetry {
    /// An older store overlapped it only partially.
    Replay,
    /// The L1D refused the access at this address.
    Access(Addr),
}

/// Executes the IEW stage for one cycle.
pub fn iew_stage(cpu: &mut Cpu) {
    let p = &cpu.config.pipeline;
    let input_delay = p.rename_to_iew_delay;
    let width = p.dispatch_width;
    let commit = cpu.backward.wire(p.commit_to_iew_delay as usize).commit.clone();

    let arrived = cpu.rename_to_iew.wire(input_delay as usize).clone();
    for seq in arrived {
        if let Some(inst) = cpu.insts.get(&seq) {
            cpu.dispatch_queue[inst.tid].push_back(seq);
        }
    }
    for (tid, done) in commit.done_seq.iter().enumerate().take(cpu.threads) {
        if let Some(done) = *done {
            cpu.lsq.commit_stores_upto(tid, done);
        }
    }

    complete_loads(cpu);
    fire_events(cpu);
    retry_loads(cpu);
    writeback(cpu);
    dispatch(cpu, &commit, width);
    issue(cpu);
    drain_stores(cpu);

    let queued: usize = cpu.dispatch_queue.iter().map(VecDeque::len).sum();
    cpu.backward.current().iew.block = queued > width * (input_delay as usize + 1);
}

fn complete_loads(cpu: &mut Cpu) {
    for id in std::mem::take(&mut cpu.load_responses) {
        if let Some(seq) = cpu.load_requests.remove(&id)
            && cpu.insts.contains_key(&seq)
        {
            let _ = cpu.wb_ready.insert(seq);
        }
    }
}

fn fire_events(cpu: &mut Cpu) {
    for event in cpu.events.drain_due(cpu.now) {
        if !cpu.insts.contains_key(&event.seq) {
            continue;
        }
        match event.kind {
            ExecKind::Complete => {
                let _ = cpu.wb_ready.insert(event.seq);
            }
            ExecKind::Execute => execute_memory(cpu, event.seq),
        }
    }
}

fn retry_loads(cpu: &mut Cpu) {
    for (seq, retry) in std::mem::take(&mut cpu.pending_loads) {
        if !cpu.insts.contains_key(&seq) {
            continue;
        }
        match retry {
            LoadRetry::Replay => execute_load(cpu, seq),
            LoadRetry::Access(addr) => access_load(cpu, seq, addr),
        }
    }
}

/// Address generation for a load or store.
fn execute_memory(cpu: &mut Cpu, seq: SeqNum) {
    let mem_size = cpu.config.memory.size_bytes;
    let Some(inst) = cpu.insts.get_mut(&seq) else {
        return;
    };
    let tid = inst.tid;
    let pc = inst.inst.pc;
    let is_store = inst.inst.is_store();
    let Some(access) = inst.inst.mem else {
        let _ = cpu.wb_ready.insert(seq);
        return;
    };

    if access.end() >= mem_size {
        if !inst.is_wrong_path() {
            let kind = if is_store {
                FaultKind::StoreAccess
            } else {
                FaultKind::LoadAccess
            };
            inst.fault = Some(Fault::new(kind, access.addr));
            debug!(tid, %seq, addr = access.addr, "memory access fault");
        }
        if is_store {
            cpu.mem_dep.store_issued(tid, pc, seq);
        }
        let _ = cpu.wb_ready.insert(seq);
        return;
    }

    if is_store {
        let violation = cpu.lsq.execute_store(tid, seq, access);
        cpu.mem_dep.store_issued(tid, pc, seq);
        let _ = cpu.wb_ready.insert(seq);
        if let Some(violation) = violation {
            memory_order_violation(cpu, tid, violation, true);
        }
    } else {
        execute_load(cpu, seq);
    }
}

fn execute_load(cpu: &mut Cpu, seq: SeqNum) {
    let Some(inst) = cpu.insts.get(&seq) else {
        return;
    };
    let tid = inst.tid;
    let Some(access) = inst.inst.mem else {
        let _ = cpu.wb_ready.insert(seq);
        return;
    };

    let (resolution, violation) = cpu.lsq.execute_load(tid, seq, access);
    match resolution {
        LoadResolution::Forwarded(store) => {
            cpu.stats.forwarded_loads += 1;
            trace!(tid, %seq, %store, "load forwarded from store queue");
            cpu.events.schedule(
                cpu.now + 1,
                ExecEvent {
                    tid,
                    seq,
                    kind: ExecKind::Complete,
                },
            );
        }
        LoadResolution::Replay(_) => {
            if let Some(inst) = cpu.insts.get_mut(&seq)
                && !inst.replayed
            {
                inst.replayed = true;
                cpu.stats.load_replays += 1;
            }
            let _ = cpu.pending_loads.insert(seq, LoadRetry::Replay);
        }
        LoadResolution::Access => access_load(cpu, seq, access.addr),
    }
    if let Some(violation) = violation {
        memory_order_violation(cpu, tid, violation, false);
    }
}

fn access_load(cpu: &mut Cpu, seq: SeqNum, addr: Addr) {
    match cpu.mem.try_load(addr, cpu.now) {
        Ok(id) => {
            let _ = cpu.load_requests.insert(id, seq);
        }
        Err(_) => {
            let _ = cpu.pending_loads.insert(seq, LoadRetry::Access(addr));
        }
    }
}

/// Handles a load that read stale data: train the store-set predictor (for store-load
/// violations) and squash from the load so it re-executes.
fn memory_order_violation(cpu: &mut Cpu, tid: ThreadId, violation: Violation, train: bool) {
    cpu.stats.memory_order_violations += 1;
    if train {
        cpu.mem_dep.violation(violation.by_pc, violation.load_pc);
    }
    let Some(load) = cpu.insts.get(&violation.load) else {
        return;
    };
    let Some(index) = load.stream_index else {
        return;
    };
    let redirect = Redirect {
        from: violation.load,
        index,
        pc: load.inst.pc,
        branch: None,
    };
    debug!(tid, load = %violation.load, pc = load.inst.pc, "memory order violation");
    cpu.squash(tid, SquashCause::MemoryOrder, redirect);
}

fn writeback(cpu: &mut Cpu) {
    let ready: Vec<SeqNum> = cpu.wb_ready.iter().copied().collect();
    for seq in ready {
        let Some(inst) = cpu.insts.get(&seq) else {
            let _ = cpu.wb_ready.remove(&seq);
            continue;
        };
        if !cpu.fu_pool.try_writeback() {
            break;
        }
        let _ = cpu.wb_ready.remove(&seq);
        let Some(inst) = cpu.insts.get_mut(&seq) else {
            continue;
        };
        inst.status = InstStatus::Executed;
        for &reg in &inst.dest_regs {
            cpu.scoreboard.set_ready(reg);
        }
        cpu.iew_to_commit.current().push(seq);

        if !inst.mispredicted {
            continue;
        }
        inst.mispredicted = false;
        let (Some(control), Some(index)) = (inst.inst.control, inst.stream_index) else {
            continue;
        };
        let tid = inst.tid;
        let redirect = Redirect {
            from: seq.next(),
            index: index + 1,
            pc: inst.inst.next_pc(),
            branch: Some(ResolvedBranch {
                seq,
                kind: control.kind,
                taken: control.taken,
                fallthrough: inst.inst.fallthrough(),
            }),
        };
        cpu.squash(tid, SquashCause::BranchMispredict, redirect);
    }
}

fn dispatch(cpu: &mut Cpu, commit: &StageSignals, width: usize) {
    let mut budget = width;
    for tid in 0..cpu.threads {
        if commit.redirect[tid].is_some() {
            continue;
        }
        while budget > 0 {
            let Some(seq) = cpu.dispatch_queue[tid].pop_front() else {
                break;
            };
            budget -= 1;
            dispatch_one(cpu, seq);
        }
    }
}

fn dispatch_one(cpu: &mut Cpu, seq: SeqNum) {
    let Some(inst) = cpu.insts.get_mut(&seq) else {
        return;
    };
    inst.status = InstStatus::Dispatched;
    cpu.stats.dispatched += 1;
    if !inst.needs_execution() {
        let _ = cpu.wb_ready.insert(seq);
        return;
    }
    inst.iq_reserved = false;
    let (tid, pc) = (inst.tid, inst.inst.pc);
    if inst.inst.is_load() {
        if let Some(store) = cpu.mem_dep.insert_load(tid, pc, seq) {
            trace!(tid, %seq, %store, "load waits for predicted store");
        }
    } else if inst.inst.is_store() {
        cpu.mem_dep.insert_store(tid, pc, seq);
    }
    cpu.iq.insert(tid, seq);
}

fn issue(cpu: &mut Cpu) {
    let now = cpu.now;
    let delay = cpu.config.pipeline.issue_to_execute_delay;
    for seq in cpu.iq.waiting() {
        let Some(inst) = cpu.insts.get(&seq) else {
            continue;
        };
        if !cpu.scoreboard.all_ready(&inst.src_regs) {
            continue;
        }
        let op = inst.inst.op_class;
        if op.is_mem() && !cpu.mem_dep.is_ready(seq) {
            continue;
        }
        match cpu.fu_pool.try_issue(op, now) {
            Ok(grant) => {
                cpu.iq.remove(seq);
                let kind = if op.is_mem() {
                    ExecKind::Execute
                } else {
                    ExecKind::Complete
                };
                let tid = inst.tid;
                if let Some(inst) = cpu.insts.get_mut(&seq) {
                    inst.status = InstStatus::Issued;
                    inst.issued_at = Some(now);
                }
                cpu.events.schedule(
                    now + delay + grant.latency.max(1) - 1,
                    ExecEvent { tid, seq, kind },
                );
                cpu.stats.issued += 1;
            }
            Err(_) => cpu.stats.fu_busy += 1,
        }
    }
}

/// Writes committed stores to the L1D, oldest first per thread. Under TSO a thread has at
/// most one store in flight.
fn drain_stores(cpu: &mut Cpu) {
    let tso = cpu.lsq.needs_tso();
    for tid in 0..cpu.threads {
        if tso && cpu.store_in_flight[tid].is_some() {
            continue;
        }
        while let Some(entry) = cpu.lsq.drain_candidate(tid) {
            let Some(access) = entry.access else {
                let _ = cpu.lsq.store_written(tid);
                continue;
            };
            match cpu.mem.try_store(access.addr, cpu.now) {
                Ok(id) => {
                    let _ = cpu.lsq.store_written(tid);
                    if tso {
                        cpu.store_in_flight[tid] = Some(id);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }
}
