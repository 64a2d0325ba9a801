//! Memory Hierarchy Tests.
//!
//! Port limits per cycle, MSHR merging and exhaustion, crossbar ordering between hits and
//! misses, and back-invalidation of L1 copies when an inclusive L2 evicts a line.

use firestorm_core::config::{Config, MemoryController, Prefetcher};
use firestorm_core::soc::{MemPort, MemRefusal, MemResponse, MemoryHierarchy};
use firestorm_core::stats::SimStats;

fn config() -> Config {
    let mut config = Config::default();
    config.memory.controller = MemoryController::Simple;
    config.cache.l1_d.prefetcher = Prefetcher::None;
    config.cache.l2.prefetcher = Prefetcher::None;
    config
}

fn stats(mem: &MemoryHierarchy) -> SimStats {
    let mut stats = SimStats::default();
    mem.collect_stats(&mut stats);
    stats
}

/// Ticks until the response to `id` arrives and returns its cycle.
fn wait_for(mem: &mut MemoryHierarchy, id: u64, from: u64) -> (u64, MemResponse) {
    for now in from..from + 10_000 {
        if let Some(response) = mem.tick(now).into_iter().find(|r| r.id == id) {
            return (now, response);
        }
    }
    panic!("request {id} never completed");
}

// ══════════════════════════════════════════════════════════
// 1. Ports
// ══════════════════════════════════════════════════════════

#[test]
fn store_ports_limit_stores_per_cycle() {
    let config = config();
    assert_eq!(config.lsq.cache_store_ports, 200);
    let mut mem = MemoryHierarchy::new(&config);
    mem.begin_cycle();
    for _ in 0..200 {
        assert!(mem.try_store(0x9000, 0).is_ok());
    }
    assert_eq!(mem.try_store(0x9000, 0), Err(MemRefusal::PortBusy));
    assert_eq!(stats(&mem).store_port_stalls, 1);

    mem.begin_cycle();
    assert!(mem.try_store(0x9000, 1).is_ok());
}

#[test]
fn load_ports_are_separate_from_store_ports() {
    let mut config = config();
    config.lsq.cache_load_ports = 2;
    config.lsq.cache_store_ports = 1;
    let mut mem = MemoryHierarchy::new(&config);
    mem.begin_cycle();
    assert!(mem.try_load(0x100, 0).is_ok());
    assert!(mem.try_load(0x100, 0).is_ok());
    assert_eq!(mem.try_load(0x100, 0), Err(MemRefusal::PortBusy));
    assert!(mem.try_store(0x100, 0).is_ok());
    assert_eq!(mem.try_store(0x100, 0), Err(MemRefusal::PortBusy));
    assert_eq!(stats(&mem).load_port_stalls, 1);
}

#[test]
fn one_fetch_per_cycle() {
    let mut mem = MemoryHierarchy::new(&config());
    mem.begin_cycle();
    assert!(mem.try_fetch(0x1000, 0).is_ok());
    assert_eq!(mem.try_fetch(0x1040, 0), Err(MemRefusal::PortBusy));
    mem.begin_cycle();
    assert!(mem.try_fetch(0x1040, 1).is_ok());
}

// ══════════════════════════════════════════════════════════
// 2. Misses
// ══════════════════════════════════════════════════════════

#[test]
fn merged_miss_completes_with_the_original() {
    let mut mem = MemoryHierarchy::new(&config());
    mem.begin_cycle();
    let first = mem.try_load(0x8000, 0).unwrap();
    let second = mem.try_load(0x8020, 0).unwrap();
    let responses = (1..10_000)
        .map(|now| mem.tick(now))
        .find(|batch| !batch.is_empty())
        .unwrap();
    assert_eq!(
        responses,
        vec![
            MemResponse {
                id: first,
                port: MemPort::Load,
                addr: 0x8000,
            },
            MemResponse {
                id: second,
                port: MemPort::Load,
                addr: 0x8020,
            },
        ]
    );

    let stats = stats(&mem);
    assert_eq!(stats.l1_d.misses, 1);
    assert_eq!(stats.l1_d.mshr_merges, 1);
    assert_eq!(stats.dram.reads, 1);
}

#[test]
fn exhausted_mshrs_refuse_new_misses() {
    let config = config();
    let mshrs = config.cache.l1_d.mshrs;
    let mut mem = MemoryHierarchy::new(&config);
    mem.begin_cycle();
    for k in 0..mshrs as u64 {
        assert!(mem.try_load(k * 0x1_0000, 0).is_ok());
    }
    assert_eq!(
        mem.try_load(mshrs as u64 * 0x1_0000, 0),
        Err(MemRefusal::MshrFull)
    );
    // A hit-under-miss to an outstanding line still merges.
    assert!(mem.try_load(0x8, 0).is_ok());
    assert_eq!(stats(&mem).l1_d.mshr_full, 1);
}

#[test]
fn responses_arrive_in_completion_order() {
    let mut mem = MemoryHierarchy::new(&config());
    mem.begin_cycle();
    let miss = mem.try_load(0x4_0000, 0).unwrap();
    let (done, _) = wait_for(&mut mem, miss, 0);
    mem.begin_cycle();
    let hit = mem.try_load(0x4_0008, done).unwrap();
    let (hit_at, _) = wait_for(&mut mem, hit, done);
    assert_eq!(hit_at, done + config().cache.l1_d.latency);
    assert!(!mem.has_pending());
}

/// Brings `addr` into L2 (but not L1D) through an instruction fetch.
fn warm_l2(mem: &mut MemoryHierarchy, addr: u64) -> u64 {
    mem.begin_cycle();
    let fetch = mem.try_fetch(addr, 0).unwrap();
    wait_for(mem, fetch, 0).0
}

#[test]
fn l2_hit_is_not_held_behind_an_older_dram_miss() {
    let mut alone = MemoryHierarchy::new(&config());
    let now = warm_l2(&mut alone, 0x1_0000);
    alone.begin_cycle();
    let hit = alone.try_load(0x1_0000, now).unwrap();
    let l2_hit_latency = wait_for(&mut alone, hit, now).0 - now;

    let mut mem = MemoryHierarchy::new(&config());
    assert_eq!(warm_l2(&mut mem, 0x1_0000), now);
    mem.begin_cycle();
    let miss = mem.try_load(0x90_0000, now).unwrap();
    let hit = mem.try_load(0x1_0000, now).unwrap();

    let (mut hit_at, mut miss_at) = (None, None);
    for cycle in now..now + 10_000 {
        for response in mem.tick(cycle) {
            if response.id == hit {
                hit_at = Some(cycle);
            } else if response.id == miss {
                miss_at = Some(cycle);
            }
        }
        if hit_at.is_some() && miss_at.is_some() {
            break;
        }
    }
    let (hit_at, miss_at) = (hit_at.unwrap(), miss_at.unwrap());
    assert!(
        hit_at - now <= l2_hit_latency + 1,
        "L2 hit took {} cycles behind the miss, {l2_hit_latency} alone",
        hit_at - now
    );
    assert!(hit_at < miss_at);
}

// ══════════════════════════════════════════════════════════
// 3. Inclusion
// ══════════════════════════════════════════════════════════

#[test]
fn inclusive_l2_eviction_invalidates_the_l1_copy() {
    let mut config = config();
    config.cache.inclusive = true;
    config.cache.l2.size_bytes = 64;
    config.cache.l2.ways = 1;
    let mut mem = MemoryHierarchy::new(&config);

    mem.begin_cycle();
    let first = mem.try_load(0x2000, 0).unwrap();
    let (t, _) = wait_for(&mut mem, first, 0);
    assert!(mem.take_l1_d_invalidations().is_empty());

    mem.begin_cycle();
    let second = mem.try_load(0x3000, t).unwrap();
    let _ = wait_for(&mut mem, second, t);
    assert_eq!(mem.take_l1_d_invalidations(), vec![0x2000]);
    assert_eq!(stats(&mem).l2.back_invalidations, 1);

    // The invalidated line misses again.
    mem.begin_cycle();
    let _ = mem.try_load(0x2000, t + 1_000).unwrap();
    assert_eq!(stats(&mem).l1_d.misses, 3);
}

#[test]
fn hierarchy_state_is_printable() {
    let mut mem = MemoryHierarchy::new(&config());
    mem.begin_cycle();
    mem.try_load(0x4_0000, 0).unwrap();
    let dump = format!("{mem:?}");
    assert!(dump.starts_with("MemoryHierarchy"));
    assert!(dump.contains("Crossbar"));
    assert!(dump.contains("SimpleController"));
}
