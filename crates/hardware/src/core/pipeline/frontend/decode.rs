//! Decode stage.
//!
//! Micro-ops arrive pre-decoded, so decode only paces them and catches one class of
//! misprediction early: a direct jump or call whose target is encoded in the instruction
//! but was predicted wrong (or not at all) is redirected here instead of waiting for
//! execute.

use std::collections::VecDeque;

use crate::common::{SeqNum, ThreadId};
use crate::core::Cpu;
use crate::core::dyn_inst::InstStatus;
use crate::core::pipeline::comm::{Redirect, ResolvedBranch};
use crate::isa::ControlKind;
use crate::stats::SquashCause;

/// Executes the decode stage for one cycle.
pub fn decode_stage(cpu: &mut Cpu) {
    let p = &cpu.config.pipeline;
    let width = p.decode_width;
    let input_delay = p.fetch_to_decode_delay;
    let rename_blocked = cpu.backward.wire(p.rename_to_decode_delay as usize).rename.block;

    let arrived = cpu.fetch_to_decode.wire(input_delay as usize).clone();
    for seq in arrived {
        if let Some(inst) = cpu.insts.get(&seq) {
            cpu.decode_queue[inst.tid].push_back(seq);
        }
    }

    if !rename_blocked {
        let mut budget = width;
        for tid in 0..cpu.threads {
            if is_squashing(cpu, tid) {
                continue;
            }
            while budget > 0 {
                let Some(seq) = cpu.decode_queue[tid].pop_front() else {
                    break;
                };
                budget -= 1;
                cpu.decode_to_rename.current().push(seq);
                decode_one(cpu, seq);
            }
        }
    }

    let queued: usize = cpu.decode_queue.iter().map(VecDeque::len).sum();
    cpu.backward.current().decode.block = queued > width * (input_delay as usize + 1);
}

/// True while a squash from a later stage is reaching decode for `tid`.
fn is_squashing(cpu: &Cpu, tid: ThreadId) -> bool {
    let p = &cpu.config.pipeline;
    cpu.backward.wire(p.iew_to_decode_delay as usize).iew.redirect[tid].is_some()
        || cpu.backward.wire(p.commit_to_decode_delay as usize).commit.redirect[tid].is_some()
}

fn decode_one(cpu: &mut Cpu, seq: SeqNum) {
    let Some(inst) = cpu.insts.get_mut(&seq) else {
        return;
    };
    inst.status = InstStatus::Decoded;
    cpu.stats.decoded += 1;

    if !inst.mispredicted {
        return;
    }
    let (Some(control), Some(index)) = (inst.inst.control, inst.stream_index) else {
        return;
    };
    if !matches!(control.kind, ControlKind::UncondDirect | ControlKind::Call) {
        return;
    }
    inst.mispredicted = false;
    let tid = inst.tid;
    let redirect = Redirect {
        from: seq.next(),
        index: index + 1,
        pc: control.target,
        branch: Some(ResolvedBranch {
            seq,
            kind: control.kind,
            taken: true,
            fallthrough: inst.inst.fallthrough(),
        }),
    };
    cpu.squash(tid, SquashCause::DecodeRedirect, redirect);
}
