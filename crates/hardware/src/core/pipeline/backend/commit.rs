//! Commit stage.
//!
//! Retires completed micro-ops from the ROB heads in program order. Per cycle it:
//! 1. Frees up to `squash_width` ROB slots left behind by squashes.
//! 2. Takes any trap whose latency has elapsed: the fault handler runs, the faulting
//!    micro-op and everything younger are squashed, and fetch resumes after it.
//! 3. Retires up to `commit_width` micro-ops, picking among threads with the SMT commit
//!    policy. A faulting head starts a trap instead of retiring.

use tracing::debug;

use crate::common::{Cycle, Fault, SeqNum, ThreadId};
use crate::core::Cpu;
use crate::core::pipeline::comm::Redirect;
use crate::core::pipeline::smt;
use crate::core::units::bru::{BranchOutcome, BranchPredictor};
use crate::isa::InstSource;
use crate::stats::SquashCause;

/// A fault waiting out its trap latency at the head of a thread's ROB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTrap {
    /// The faulting micro-op.
    pub seq: SeqNum,
    /// Cycle at which the handler is entered.
    pub ready_at: Cycle,
    /// The fault.
    pub fault: Fault,
}

/// Executes the commit stage for one cycle.
///
/// # Returns
///
/// The number of micro-ops retired.
pub fn commit_stage(cpu: &mut Cpu, source: &mut dyn InstSource) -> usize {
    let p = &cpu.config.pipeline;
    let width = p.commit_width;
    cpu.rob.reclaim(p.squash_width);

    let arrived = cpu.iew_to_commit.wire(p.iew_to_commit_delay as usize).clone();
    for seq in arrived {
        if let Some(inst) = cpu.insts.get_mut(&seq) {
            inst.can_commit = true;
        }
    }

    take_traps(cpu, source);

    let mut committed = 0;
    while committed < width {
        let ready = ready_heads(cpu);
        let Some(tid) = smt::commit_choice(
            cpu.config.smt.commit_policy,
            &ready,
            cpu.commit_rotation,
            cpu.threads,
        ) else {
            break;
        };
        retire(cpu, tid);
        committed += 1;
    }
    cpu.commit_rotation = cpu.commit_rotation.wrapping_add(1);

    if let Some(slot) = cpu.stats.commit_histogram.get_mut(committed) {
        *slot += 1;
    }
    if committed > 0 {
        cpu.last_commit = cpu.now;
    }
    committed
}

fn take_traps(cpu: &mut Cpu, source: &mut dyn InstSource) {
    for tid in 0..cpu.threads {
        let Some(trap) = cpu.traps[tid] else {
            continue;
        };
        if trap.ready_at > cpu.now {
            continue;
        }
        cpu.traps[tid] = None;
        let Some(inst) = cpu.insts.get(&trap.seq) else {
            continue;
        };
        let Some(index) = inst.stream_index else {
            continue;
        };
        let redirect = Redirect {
            from: trap.seq,
            index: index + 1,
            pc: inst.inst.fallthrough(),
            branch: None,
        };
        debug!(tid, seq = %trap.seq, fault = %trap.fault, "taking trap");
        source.on_fault(tid, index, &trap.fault);
        cpu.stats.traps += 1;
        cpu.squash(tid, SquashCause::Fault, redirect);
    }
}

/// Threads whose ROB head may retire this cycle, with the head's sequence number.
///
/// A completed head that carries a fault starts its thread's trap instead.
fn ready_heads(cpu: &mut Cpu) -> Vec<(ThreadId, u64)> {
    let p = &cpu.config.pipeline;
    let (rob_delay, trap_latency, fetch_trap_latency) =
        (p.rename_to_rob_delay, p.trap_latency, p.fetch_trap_latency);
    let now = cpu.now;
    let mut ready = Vec::new();
    for tid in 0..cpu.threads {
        if cpu.traps[tid].is_some() {
            continue;
        }
        let Some(seq) = cpu.rob.head(tid) else {
            continue;
        };
        let Some(inst) = cpu.insts.get(&seq) else {
            continue;
        };
        if !inst.can_commit
            || inst.is_wrong_path()
            || inst.renamed_at.is_some_and(|t| t + rob_delay > now)
        {
            continue;
        }
        if let Some(fault) = inst.fault {
            let latency = if fault.is_fetch_fault() {
                fetch_trap_latency
            } else {
                trap_latency
            };
            cpu.traps[tid] = Some(PendingTrap {
                seq,
                ready_at: now + latency,
                fault,
            });
            debug!(tid, %seq, %fault, "fault reached commit");
            continue;
        }
        ready.push((tid, seq.0));
    }
    ready
}

fn retire(cpu: &mut Cpu, tid: ThreadId) {
    let Some(seq) = cpu.rob.retire_head(tid) else {
        return;
    };
    let Some(inst) = cpu.insts.remove(&seq) else {
        return;
    };
    cpu.renamer.commit(tid, seq);
    cpu.mem_dep.commit(seq);
    cpu.fetch[tid].retire_checkpoints(seq);

    let stats = &mut cpu.stats;
    stats.committed += 1;
    stats.committed_per_thread[tid] += 1;
    *stats
        .committed_by_class
        .entry(inst.inst.op_class)
        .or_default() += 1;
    if inst.inst.is_load() {
        cpu.lsq.commit_load(tid, seq);
        stats.committed_loads += 1;
    } else if inst.inst.is_store() {
        cpu.backward.current().commit.done_seq[tid] = Some(seq);
        stats.committed_stores += 1;
    }
    if let Some(control) = inst.inst.control {
        stats.committed_branches += 1;
        if inst.was_mispredicted {
            stats.branch_mispredicts += 1;
        }
        cpu.predictor.update(&BranchOutcome {
            pc: inst.inst.pc,
            kind: control.kind,
            taken: control.taken,
            target: control.target,
            history: inst.history,
        });
    }
    #[cfg(feature = "commit-log")]
    tracing::trace!(tid, %seq, pc = inst.inst.pc, class = ?inst.inst.op_class, "commit");
}
