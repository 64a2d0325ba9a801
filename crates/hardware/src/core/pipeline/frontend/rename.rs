//! Rename stage: physical registers, ROB, IQ and LSQ allocation.
//!
//! A micro-op leaves rename only when every resource it needs is available; otherwise its
//! thread stalls for the cycle and the reason is counted. Sources are mapped before the
//! destinations are remapped, so a micro-op that reads its own destination (e.g.
//! `add x5, x5, 16`) sees the previous producer. Each new destination is marked not ready
//! in the scoreboard until writeback.

use std::collections::VecDeque;

use crate::common::{SeqNum, ThreadId};
use crate::core::Cpu;
use crate::core::dyn_inst::InstStatus;
use crate::stats::RenameStalls;

/// The resource a stalled micro-op was waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameStall {
    /// Serializing micro-op waiting for older ones to commit.
    Serialize,
    /// ROB full.
    RobFull,
    /// IQ full.
    IqFull,
    /// Load queue full.
    LqFull,
    /// Store queue full.
    SqFull,
    /// No free physical register of a destination's class.
    NoFreeRegs,
}

impl RenameStall {
    fn record(self, stalls: &mut RenameStalls) {
        let counter = match self {
            Self::Serialize => &mut stalls.serialize,
            Self::RobFull => &mut stalls.rob_full,
            Self::IqFull => &mut stalls.iq_full,
            Self::LqFull => &mut stalls.lq_full,
            Self::SqFull => &mut stalls.sq_full,
            Self::NoFreeRegs => &mut stalls.no_free_regs,
        };
        *counter += 1;
    }
}

/// Executes the rename stage for one cycle.
pub fn rename_stage(cpu: &mut Cpu) {
    let p = &cpu.config.pipeline;
    let width = p.rename_width;
    let input_delay = p.decode_to_rename_delay;
    let iew_blocked = cpu.backward.wire(p.iew_to_rename_delay as usize).iew.block;

    let arrived = cpu.decode_to_rename.wire(input_delay as usize).clone();
    for seq in arrived {
        if let Some(inst) = cpu.insts.get(&seq) {
            cpu.rename_queue[inst.tid].push_back(seq);
        }
    }

    let queued: usize = cpu.rename_queue.iter().map(VecDeque::len).sum();
    if iew_blocked {
        if queued > 0 {
            cpu.stats.rename_stalls.backpressure += 1;
        }
    } else {
        let mut budget = width;
        for tid in 0..cpu.threads {
            if is_squashing(cpu, tid) {
                continue;
            }
            while budget > 0 {
                let Some(&seq) = cpu.rename_queue[tid].front() else {
                    break;
                };
                match try_rename(cpu, seq) {
                    Ok(()) => {
                        cpu.rename_queue[tid].pop_front();
                        cpu.rename_to_iew.current().push(seq);
                        budget -= 1;
                    }
                    Err(stall) => {
                        stall.record(&mut cpu.stats.rename_stalls);
                        break;
                    }
                }
            }
        }
    }

    let queued: usize = cpu.rename_queue.iter().map(VecDeque::len).sum();
    cpu.backward.current().rename.block = queued > width * (input_delay as usize + 1);
}

fn is_squashing(cpu: &Cpu, tid: ThreadId) -> bool {
    let p = &cpu.config.pipeline;
    cpu.backward.wire(p.iew_to_rename_delay as usize).iew.redirect[tid].is_some()
        || cpu.backward.wire(p.commit_to_rename_delay as usize).commit.redirect[tid].is_some()
}

/// Allocates every resource `seq` needs, or nothing.
fn try_rename(cpu: &mut Cpu, seq: SeqNum) -> Result<(), RenameStall> {
    let Some(inst) = cpu.insts.get(&seq) else {
        return Ok(());
    };
    let tid = inst.tid;
    let is_load = inst.inst.is_load();
    let is_store = inst.inst.is_store();
    let needs_iq = inst.needs_execution();

    if inst.inst.serializing && cpu.rob.thread_len(tid) > 0 {
        return Err(RenameStall::Serialize);
    }
    if !cpu.rob.can_allocate(tid) {
        return Err(RenameStall::RobFull);
    }
    if is_load && !cpu.lsq.can_insert_load(tid) {
        return Err(RenameStall::LqFull);
    }
    if is_store && !cpu.lsq.can_insert_store(tid) {
        return Err(RenameStall::SqFull);
    }
    if !cpu.renamer.can_rename(&inst.inst.dests) {
        return Err(RenameStall::NoFreeRegs);
    }
    if needs_iq && !cpu.iq.reserve(tid) {
        return Err(RenameStall::IqFull);
    }

    let pc = inst.inst.pc;
    let srcs = inst.inst.srcs.clone();
    let dests = inst.inst.dests.clone();
    let bank = cpu.rob.allocate(tid, seq).ok_or(RenameStall::RobFull)?;
    let renamed = cpu
        .renamer
        .rename(tid, seq, &srcs, &dests)
        .ok_or(RenameStall::NoFreeRegs)?;
    if is_load {
        cpu.lsq.insert_load(tid, seq, pc);
    } else if is_store {
        cpu.lsq.insert_store(tid, seq, pc);
    }
    for &reg in &renamed.dests {
        cpu.scoreboard.set_not_ready(reg);
    }

    let now = cpu.now;
    if let Some(inst) = cpu.insts.get_mut(&seq) {
        inst.src_regs = renamed.srcs;
        inst.dest_regs = renamed.dests;
        inst.rob_bank = bank;
        inst.iq_reserved = needs_iq;
        inst.status = InstStatus::Renamed;
        inst.renamed_at = Some(now);
    }
    cpu.stats.renamed += 1;
    Ok(())
}
