//! Simulator Tests.

use firestorm_core::common::SimError;
use firestorm_core::config::{Config, MemoryController};
use firestorm_core::isa::{SyntheticWorkload, TraceProgram, generate};
use firestorm_core::sim::Simulator;

use crate::common::harness;

#[test]
fn rejects_an_invalid_configuration() {
    let mut config = Config::default();
    config.pipeline.commit_width = 0;
    let program = TraceProgram::single(generate(SyntheticWorkload::IndependentAlu, 8));
    let err = Simulator::new(&config, program).unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
    assert_eq!(
        err.to_string(),
        "invalid configuration: pipeline.commit_width must be greater than zero"
    );
}

#[test]
fn rejects_a_source_without_streams() {
    let err = Simulator::new(&Config::default(), TraceProgram::new(Vec::new())).unwrap_err();
    assert!(matches!(err, SimError::Trace(_)));
}

#[test]
fn rejects_more_streams_than_threads() {
    let program = TraceProgram::new(vec![
        generate(SyntheticWorkload::IndependentAlu, 8),
        generate(SyntheticWorkload::IndependentAlu, 8),
    ]);
    let err = Simulator::new(&Config::default(), program).unwrap_err();
    assert!(matches!(err, SimError::Trace(msg) if msg.contains("2 threads")));
}

#[test]
fn empty_stream_finishes_immediately() {
    let (stats, _) = harness::run_stream(&Config::default(), Vec::new());
    assert_eq!(stats.committed, 0);
    assert!(stats.cycles <= 1);
}

#[test]
fn max_cycles_stops_the_run_early() {
    let mut config = harness::simple_memory_config();
    config.general.max_cycles = 50;
    let (stats, _) = harness::run_stream(&config, generate(SyntheticWorkload::DependentChain, 2_000));
    assert_eq!(stats.cycles, 50);
    assert!(stats.committed < 2_000);
}

#[test]
fn long_commit_gap_is_reported_as_deadlock() {
    harness::init_tracing();
    let mut config = Config::default();
    config.memory.controller = MemoryController::Dram;
    config.general.deadlock_threshold = 5;
    let program = TraceProgram::single(generate(SyntheticWorkload::IndependentAlu, 100));
    let mut sim = Simulator::new(&config, program).unwrap();
    match sim.run() {
        Err(SimError::Deadlock { cycle, idle_cycles }) => {
            assert_eq!(idle_cycles, 6);
            assert_eq!(cycle, 6);
        }
        other => panic!("expected a deadlock, got {other:?}"),
    }
}

#[test]
fn manual_ticks_match_run() {
    let config = harness::simple_memory_config();
    let insts = generate(SyntheticWorkload::Mixed, 300);

    let (expected, _) = harness::run_stream(&config, insts.clone());

    let mut sim = Simulator::new(&config, TraceProgram::single(insts)).unwrap();
    while !sim.cpu.is_drained() {
        sim.tick();
    }
    let (cpu, _) = sim.into_parts();
    let mut stats = cpu.stats();
    stats.host_seconds = expected.host_seconds;
    assert_eq!(stats, expected);
}
