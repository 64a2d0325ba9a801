//! Configuration presets and run helpers.
//!
//! Most pipeline tests want a short, predictable memory path: a fixed-latency memory
//! controller and a next-line L1I prefetcher, so that after the first miss every fetch
//! block is already resident.

use firestorm_core::config::{self, Config, FuPoolConfig, MemoryController, Prefetcher};
use firestorm_core::core::Cpu;
use firestorm_core::isa::{InstSource, StaticInst, TraceProgram};
use firestorm_core::sim::Simulator;
use firestorm_core::stats::SimStats;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test writer; set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Default configuration with a fixed-latency memory controller.
pub fn simple_memory_config() -> Config {
    let mut config = Config::default();
    config.memory.controller = MemoryController::Simple;
    config.cache.l1_i.prefetcher = Prefetcher::NextLine;
    config.cache.l1_i.prefetch_degree = 1;
    config
}

/// A core that can issue, execute, and write back eight integer ALU ops per cycle.
///
/// Fetch, decode, and rename are eight wide and commit seven wide, so an independent ALU
/// stream is bounded by commit alone.
pub fn wide_alu_config() -> Config {
    let mut config = simple_memory_config();
    config.pipeline.issue_width = 8;
    config.pipeline.wb_width = 8;
    let mut units = config::default_fu_pool();
    if let Some(alu) = units.iter_mut().find(|u| u.name == "IntALU") {
        alu.count = 8;
    }
    config.fu_pool = FuPoolConfig::Custom { units };
    config
}

/// Runs a single-threaded stream to completion.
pub fn run_stream(config: &Config, insts: Vec<StaticInst>) -> (SimStats, TraceProgram) {
    run_program(config, TraceProgram::single(insts))
}

/// Runs a program to completion and hands the source back for inspection.
pub fn run_program(config: &Config, program: TraceProgram) -> (SimStats, TraceProgram) {
    init_tracing();
    let mut sim = Simulator::new(config, program).unwrap();
    let stats = sim.run().unwrap();
    let (_, program) = sim.into_parts();
    (stats, program)
}

/// Ticks `cpu` until `done` holds, failing the test after `limit` cycles.
pub fn tick_until(
    cpu: &mut Cpu,
    source: &mut dyn InstSource,
    limit: u64,
    mut done: impl FnMut(&Cpu) -> bool,
) {
    while !done(cpu) {
        assert!(cpu.now < limit, "condition not reached within {limit} cycles");
        cpu.tick(source);
    }
}

/// Statistics with host timing removed, for run-to-run comparison.
pub fn deterministic(mut stats: SimStats) -> SimStats {
    stats.host_seconds = 0.0;
    stats
}
