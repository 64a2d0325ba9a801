//! Memory Controller Tests.

use firestorm_core::config::{Config, DramTiming};
use firestorm_core::soc::memory::{DramController, MemoryController, SimpleController};

fn dram(config: &Config) -> DramController {
    DramController::new(config, &config.memory.dram)
}

fn timing() -> DramTiming {
    Config::default().memory.dram
}

#[test]
fn simple_controller_has_a_fixed_latency() {
    let mut c = SimpleController::new(100);
    assert_eq!(c.access(0x40, false, 0), 100);
    assert_eq!(c.access(0x40, false, 0), 100);
    assert_eq!(c.access(0x80, true, 7), 107);
    assert_eq!(c.stats().reads, 2);
    assert_eq!(c.stats().writes, 1);
    assert_eq!(c.stats().row_hits, 0);
}

#[test]
fn open_row_hits_beat_row_conflicts() {
    let config = Config::default();
    let t = timing();
    let mut c = dram(&config);
    let conflict = t.row_buffer_bytes * (t.ranks * t.banks_per_rank) as u64;

    let first = c.access(0, false, 0);
    let start = first + 1_000;
    let hit = c.access(64, false, start) - start;
    let start = start + 1_000;
    let miss = c.access(conflict, false, start) - start;

    assert!(hit < miss, "row hit {hit} vs conflict {miss}");
    assert_eq!(c.stats().row_hits, 1);
    assert_eq!(c.stats().row_misses, 2);
}

#[test]
fn different_banks_overlap() {
    let config = Config::default();
    let t = timing();
    let mut serial = dram(&config);
    let mut parallel = dram(&config);
    let same_bank = t.row_buffer_bytes * (t.ranks * t.banks_per_rank) as u64;

    let _ = serial.access(0, false, 0);
    let serial_done = serial.access(same_bank, false, 0);
    let _ = parallel.access(0, false, 0);
    let parallel_done = parallel.access(t.row_buffer_bytes, false, 0);
    assert!(parallel_done < serial_done);
}

#[test]
fn refresh_runs_every_interval() {
    let config = Config::default();
    let refi = config.ps_to_cycles(timing().t_refi_ps);
    let mut c = dram(&config);
    let _ = c.access(0, false, 2 * refi + refi / 2);
    assert_eq!(c.stats().refreshes, 2);
    // Refresh closes the open row.
    let _ = c.access(64, false, 3 * refi + refi / 2);
    assert_eq!(c.stats().refreshes, 3);
    assert_eq!(c.stats().row_hits, 0);
}

#[test]
fn writes_are_counted_separately() {
    let config = Config::default();
    let mut c = dram(&config);
    let _ = c.access(0, true, 0);
    let _ = c.access(64, false, 0);
    assert_eq!((c.stats().reads, c.stats().writes), (1, 1));
}
