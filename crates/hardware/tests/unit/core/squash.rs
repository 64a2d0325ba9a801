//! Squash Tests.
//!
//! A squash from sequence number `M` subsumes any later squash from `N > M` issued before
//! fetch is redirected: applying both, in either order, or the same one twice, leaves the
//! same structures behind as applying `M` alone.

use firestorm_core::common::SeqNum;
use firestorm_core::config::Config;
use firestorm_core::core::Cpu;
use firestorm_core::core::pipeline::comm::Redirect;
use firestorm_core::isa::{SyntheticWorkload, TraceProgram, generate};
use firestorm_core::stats::SquashCause;
use pretty_assertions::assert_eq;

use crate::common::harness;

const STREAM_LEN: usize = 600;

/// A core with a dependent chain in flight and two in-flight squash points `M < N`.
fn warmed_up() -> (Cpu, TraceProgram, Redirect, Redirect) {
    harness::init_tracing();
    let mut program = TraceProgram::single(generate(SyntheticWorkload::DependentChain, STREAM_LEN));
    let mut cpu = Cpu::new(&Config::default());
    harness::tick_until(&mut cpu, &mut program, 2_000, |cpu| cpu.insts.len() >= 64);

    let keys: Vec<SeqNum> = cpu.insts.keys().copied().collect();
    let redirect = |seq: SeqNum| {
        let inst = &cpu.insts[&seq];
        Redirect {
            from: seq,
            index: inst.stream_index.unwrap(),
            pc: inst.inst.pc,
            branch: None,
        }
    };
    let m = redirect(keys[keys.len() / 4]);
    let n = redirect(keys[keys.len() / 2]);
    (cpu, program, m, n)
}

#[test]
fn nested_squash_matches_the_older_one_alone() {
    let (mut both, _, m, n) = warmed_up();
    let (mut older_only, _, _, _) = warmed_up();

    both.squash(0, SquashCause::MemoryOrder, n);
    both.squash(0, SquashCause::MemoryOrder, m);
    older_only.squash(0, SquashCause::MemoryOrder, m);

    assert_eq!(both.snapshot(), older_only.snapshot());
    assert_eq!(both.pending_redirect[0], Some(m.from));
}

#[test]
fn younger_squash_after_older_is_ignored() {
    let (mut cpu, _, m, n) = warmed_up();
    cpu.squash(0, SquashCause::MemoryOrder, m);
    let after_first = cpu.snapshot();
    let squashes = cpu.stats.squashes.total();

    cpu.squash(0, SquashCause::BranchMispredict, n);
    cpu.squash(0, SquashCause::MemoryOrder, m);
    assert_eq!(cpu.snapshot(), after_first);
    assert_eq!(cpu.stats.squashes.total(), squashes);
}

#[test]
fn squash_removes_everything_from_the_point_on() {
    let (mut cpu, _, m, _) = warmed_up();
    cpu.squash(0, SquashCause::MemoryOrder, m);
    let snapshot = cpu.snapshot();
    assert!(snapshot.insts.iter().all(|&s| s < m.from));
    assert!(snapshot.rob[0].iter().all(|&s| s < m.from));
    assert!(snapshot.iq_waiting.iter().all(|&s| s < m.from));
    assert!(cpu.stats.squashes.squashed_insts > 0);
    assert_eq!(cpu.stats.squashes.memory_order, 1);
}

#[test]
fn squashed_stream_still_commits_in_full() {
    let (mut cpu, mut program, m, _) = warmed_up();
    cpu.squash(0, SquashCause::MemoryOrder, m);
    harness::tick_until(&mut cpu, &mut program, 100_000, Cpu::is_drained);
    assert_eq!(cpu.stats.committed, STREAM_LEN as u64);
    assert_eq!(cpu.pending_redirect[0], None);
}
