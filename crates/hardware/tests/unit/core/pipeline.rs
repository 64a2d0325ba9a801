//! Whole-Pipeline Tests.
//!
//! Runs complete streams through `Simulator` and checks throughput, determinism, recovery
//! from mispredictions and faults, and SMT sharing.

use firestorm_core::common::{ArchReg, Fault, FaultKind};
use firestorm_core::config::Config;
use firestorm_core::isa::{
    ControlKind, OpClass, StaticInst, SyntheticWorkload, TraceProgram, generate,
};
use firestorm_core::sim::Simulator;
use pretty_assertions::assert_eq;

use crate::common::harness;
use crate::common::mocks::MockSource;

// ══════════════════════════════════════════════════════════
// 1. Throughput
// ══════════════════════════════════════════════════════════

/// A thousand independent ALU ops on an 8-wide front end with a 7-wide commit settle
/// into retiring seven per cycle.
#[test]
fn independent_alu_stream_commits_at_commit_width() {
    let config = harness::wide_alu_config();
    assert_eq!(config.pipeline.fetch_width, 8);
    assert_eq!(config.pipeline.decode_width, 8);
    assert_eq!(config.pipeline.commit_width, 7);
    assert_eq!(config.resources.num_rob_entries, 330);

    let (stats, _) = harness::run_stream(&config, generate(SyntheticWorkload::IndependentAlu, 1_000));
    assert_eq!(stats.committed, 1_000);
    assert_eq!(stats.squashes.total(), 0);

    let full_cycles = stats.commit_histogram[7];
    let active_cycles: u64 = stats.commit_histogram[1..].iter().sum();
    assert!(full_cycles >= 120, "only {full_cycles} cycles retired seven");
    assert!(active_cycles <= 170, "commit was active for {active_cycles} cycles");
    // Cold L1I miss plus pipeline depth on top of ceil(1000 / 7).
    assert!(stats.cycles < 143 + 250, "took {} cycles", stats.cycles);
    assert!(stats.ipc() > 2.5);
}

/// Independent integer, FP and multiply ops spread over three functional-unit groups.
fn three_group_stream(len: usize) -> Vec<StaticInst> {
    (0..len)
        .map(|i| {
            let pc = 0x1000 + 4 * i as u64;
            let reg = 1 + (i % 31) as u16;
            match i % 3 {
                0 => StaticInst::alu(pc).with_dests([ArchReg::int(reg)]),
                1 => StaticInst::new(pc, OpClass::FloatAdd).with_dests([ArchReg::float(reg)]),
                _ => StaticInst::new(pc, OpClass::IntMult).with_dests([ArchReg::int(reg)]),
            }
        })
        .collect()
}

#[test]
fn writeback_width_bounds_the_whole_stage() {
    let mut narrow = harness::wide_alu_config();
    narrow.pipeline.wb_width = 1;
    let (limited, _) = harness::run_stream(&narrow, three_group_stream(600));
    assert_eq!(limited.committed, 600);
    assert!(
        limited.cycles >= 600,
        "{} results written back in {} cycles",
        limited.committed,
        limited.cycles
    );

    let (wide, _) = harness::run_stream(&harness::wide_alu_config(), three_group_stream(600));
    assert_eq!(wide.committed, 600);
    assert!(wide.cycles < limited.cycles);
}

#[test]
fn dependent_chain_is_latency_bound() {
    let config = harness::wide_alu_config();
    let (independent, _) =
        harness::run_stream(&config, generate(SyntheticWorkload::IndependentAlu, 400));
    let (chain, _) = harness::run_stream(&config, generate(SyntheticWorkload::DependentChain, 400));
    assert_eq!(chain.committed, 400);
    assert!(chain.cycles > independent.cycles);
    assert!(chain.cycles >= 400, "a serial chain cannot beat one op per cycle");
}

#[test]
fn identical_runs_produce_identical_statistics() {
    let config = harness::simple_memory_config();
    let run = || {
        let (stats, _) = harness::run_stream(&config, generate(SyntheticWorkload::Mixed, 1_500));
        harness::deterministic(stats)
    };
    assert_eq!(run(), run());
}

// ══════════════════════════════════════════════════════════
// 2. Speculation and recovery
// ══════════════════════════════════════════════════════════

#[test]
fn branchy_stream_recovers_from_mispredictions() {
    let config = harness::simple_memory_config();
    let len = 1_200;
    let (stats, _) = harness::run_stream(&config, generate(SyntheticWorkload::Branchy, len));
    assert_eq!(stats.committed, len as u64);
    assert!(stats.squashes.branch_mispredict + stats.squashes.decode_redirect >= 1);
    assert!(stats.branch_mispredicts >= 1);
    assert_eq!(stats.committed_branches, (len / 8) as u64);
}

#[test]
fn memory_stream_commits_every_access() {
    let config = harness::simple_memory_config();
    let insts = generate(SyntheticWorkload::Memory, 900);
    let loads = insts.iter().filter(|i| i.is_load()).count() as u64;
    let stores = insts.iter().filter(|i| i.is_store()).count() as u64;
    let (stats, _) = harness::run_stream(&config, insts);
    assert_eq!(stats.committed, 900);
    assert_eq!(stats.committed_loads, loads);
    assert_eq!(stats.committed_stores, stores);
    assert!(stats.l1_d.misses > 0);
    assert!(stats.l1_d.accesses() >= loads);
}

#[test]
fn faulting_op_traps_and_execution_resumes_after_it() {
    let fault = Fault::new(FaultKind::SystemCall, 0x1008);
    let insts = vec![
        StaticInst::alu(0x1000),
        StaticInst::alu(0x1004),
        StaticInst::alu(0x1008).with_fault(fault),
        StaticInst::alu(0x100c),
        StaticInst::alu(0x1010),
    ];
    let (stats, program) = harness::run_stream(&harness::simple_memory_config(), insts);
    assert_eq!(program.handled_faults, vec![(0, 2, fault)]);
    assert_eq!(stats.traps, 1);
    assert_eq!(stats.committed, 4);
    assert_eq!(stats.squashes.fault, 1);
}

#[test]
fn out_of_range_load_faults() {
    let config = harness::simple_memory_config();
    let beyond = config.memory.size_bytes + 64;
    let insts = vec![
        StaticInst::alu(0x1000).with_dests([ArchReg::int(1)]),
        StaticInst::load(0x1004, beyond, 8).with_dests([ArchReg::int(2)]),
        StaticInst::alu(0x1008).with_srcs([ArchReg::int(1)]),
    ];
    let (stats, program) = harness::run_stream(&config, insts);
    assert_eq!(program.handled_faults.len(), 1);
    let (_, index, fault) = program.handled_faults[0];
    assert_eq!(index, 1);
    assert_eq!(fault.kind, FaultKind::LoadAccess);
    assert_eq!(stats.committed, 2);
}

#[test]
fn fetch_outside_memory_faults() {
    let mut config = harness::simple_memory_config();
    config.memory.size_bytes = 0x2000;
    let insts = vec![
        StaticInst::alu(0x1000),
        StaticInst::branch(0x1004, ControlKind::UncondDirect, true, 0x4000),
        StaticInst::alu(0x4000),
    ];
    let (stats, program) = harness::run_stream(&config, insts);
    assert_eq!(
        program.handled_faults,
        vec![(0, 2, Fault::new(FaultKind::InstructionAccess, 0x4000))]
    );
    assert_eq!(stats.committed, 2);
}

#[test]
fn serializing_op_waits_for_an_empty_rob() {
    let config = harness::simple_memory_config();
    let mut insts = generate(SyntheticWorkload::IndependentAlu, 64);
    insts[32] = StaticInst::alu(insts[32].pc).serializing();
    let (stats, _) = harness::run_stream(&config, insts);
    assert_eq!(stats.committed, 64);
    assert!(stats.rename_stalls.serialize > 0);
}

#[test]
fn unconditional_jumps_redirect_fetch() {
    let config = harness::simple_memory_config();
    let insts = vec![
        StaticInst::alu(0x1000),
        StaticInst::branch(0x1004, ControlKind::UncondDirect, true, 0x2000),
        StaticInst::alu(0x2000),
        StaticInst::alu(0x2004),
    ];
    let (stats, _) = harness::run_stream(&config, insts);
    assert_eq!(stats.committed, 4);
    assert_eq!(stats.committed_branches, 1);
}

// ══════════════════════════════════════════════════════════
// 3. Sources and threads
// ══════════════════════════════════════════════════════════

#[test]
fn mocked_source_is_walked_in_order() {
    harness::init_tracing();
    let mut source = MockSource::new();
    source.expect_num_threads().return_const(1usize);
    source
        .expect_inst_at()
        .returning(|_, index| (index < 3).then(|| StaticInst::alu(0x1000 + 4 * index)));
    source.expect_wrong_path().returning(|_, pc| StaticInst::nop(pc));
    source.expect_on_fault().never();

    let mut sim = Simulator::new(&harness::simple_memory_config(), source).unwrap();
    let stats = sim.run().unwrap();
    assert_eq!(stats.committed, 3);
}

#[test]
fn mocked_source_sees_each_fault_once() {
    harness::init_tracing();
    let fault = Fault::new(FaultKind::Breakpoint, 0x1004);
    let mut source = MockSource::new();
    source.expect_num_threads().return_const(1usize);
    source.expect_inst_at().returning(move |_, index| match index {
        1 => Some(StaticInst::alu(0x1004).with_fault(fault)),
        0 | 2 => Some(StaticInst::alu(0x1000 + 4 * index)),
        _ => None,
    });
    source.expect_wrong_path().returning(|_, pc| StaticInst::nop(pc));
    source
        .expect_on_fault()
        .withf(move |tid, index, f| *tid == 0 && *index == 1 && *f == fault)
        .times(1)
        .return_const(());

    let mut sim = Simulator::new(&harness::simple_memory_config(), source).unwrap();
    let stats = sim.run().unwrap();
    assert_eq!(stats.committed, 2);
}

#[test]
fn two_threads_share_the_core() {
    let mut config = harness::simple_memory_config();
    config.general.num_threads = 2;
    let program = TraceProgram::new(vec![
        generate(SyntheticWorkload::IndependentAlu, 300),
        generate(SyntheticWorkload::DependentChain, 200),
    ]);
    let (stats, _) = harness::run_program(&config, program);
    assert_eq!(stats.committed_per_thread, vec![300, 200]);
    assert_eq!(stats.committed, 500);
}

#[test]
fn fewer_streams_than_threads_leaves_threads_idle() {
    let mut config = harness::simple_memory_config();
    config.general.num_threads = 2;
    let (stats, _) = harness::run_stream(&config, generate(SyntheticWorkload::IndependentAlu, 100));
    assert_eq!(stats.committed_per_thread, vec![100, 0]);
}
