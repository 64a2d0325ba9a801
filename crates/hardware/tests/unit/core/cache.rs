//! Cache Tag Array Tests.
//!
//! Replacement victims for each policy on a single-set cache, write-back reporting, and
//! prefetch fills driven through `Cache::access`.

use firestorm_core::config::{CacheConfig, Prefetcher, ReplacementPolicy};
use firestorm_core::core::units::cache::{Cache, Evicted};
use firestorm_core::core::units::prefetch::{NextLinePrefetcher, Prefetcher as _, StridePrefetcher};
use rstest::rstest;

const LINE: u64 = 64;

fn config(ways: usize, sets: usize, policy: ReplacementPolicy, prefetcher: Prefetcher) -> CacheConfig {
    CacheConfig {
        size_bytes: ways * sets * LINE as usize,
        line_bytes: LINE as usize,
        ways,
        latency: 1,
        response_latency: 1,
        mshrs: 4,
        policy,
        prefetcher,
        prefetch_table_size: 16,
        prefetch_degree: 1,
    }
}

/// A one-set, four-way cache filled with lines 0..4 in order.
fn full_set(policy: ReplacementPolicy) -> Cache {
    let mut cache = Cache::new(&config(4, 1, policy, Prefetcher::None));
    for line in 0..4 {
        assert_eq!(cache.fill(line * LINE, false), None);
    }
    cache
}

// ══════════════════════════════════════════════════════════
// 1. Replacement
// ══════════════════════════════════════════════════════════

/// Line 0 is touched again after the fills; each policy picks its own victim.
#[rstest]
#[case::lru(ReplacementPolicy::Lru, 1)]
#[case::fifo(ReplacementPolicy::Fifo, 0)]
#[case::mru(ReplacementPolicy::Mru, 0)]
#[case::plru(ReplacementPolicy::Plru, 1)]
fn victim_selection(#[case] policy: ReplacementPolicy, #[case] victim_line: u64) {
    let mut cache = full_set(policy);
    assert!(cache.access(0, false).hit);
    let victim = cache.fill(4 * LINE, false);
    assert_eq!(victim.map(|v| v.addr), Some(victim_line * LINE));
    assert!(!cache.contains(victim_line * LINE));
    assert!(cache.contains(4 * LINE));
}

#[test]
fn random_replacement_is_reproducible() {
    let victims = |mut cache: Cache| -> Vec<u64> {
        (4..12)
            .filter_map(|line| cache.fill(line * LINE, false).map(|v| v.addr))
            .collect()
    };
    let first = victims(full_set(ReplacementPolicy::Random));
    let second = victims(full_set(ReplacementPolicy::Random));
    assert_eq!(first.len(), 8);
    assert_eq!(first, second);
}

#[test]
fn writes_make_victims_dirty() {
    let mut cache = full_set(ReplacementPolicy::Lru);
    assert!(cache.access(0, true).hit);
    for line in 1..4 {
        let _ = cache.access(line * LINE, false);
    }
    assert_eq!(
        cache.fill(4 * LINE, false),
        Some(Evicted {
            addr: 0,
            dirty: true,
        })
    );
}

#[test]
fn invalidate_returns_the_line_and_frees_the_way() {
    let mut cache = full_set(ReplacementPolicy::Lru);
    let _ = cache.access(2 * LINE + 8, true);
    assert_eq!(
        cache.invalidate(2 * LINE + 8),
        Some(Evicted {
            addr: 2 * LINE,
            dirty: true,
        })
    );
    assert_eq!(cache.invalidate(2 * LINE), None);
    // The freed way is reused before any valid line is displaced.
    assert_eq!(cache.fill(7 * LINE, false), None);
}

#[test]
fn refill_of_a_present_line_displaces_nothing() {
    let mut cache = full_set(ReplacementPolicy::Lru);
    assert_eq!(cache.fill(3 * LINE, true), None);
    assert_eq!(cache.line_addr(3 * LINE + 63), 3 * LINE);
    assert_eq!(cache.line_bytes(), LINE);
}

// ══════════════════════════════════════════════════════════
// 2. Prefetching
// ══════════════════════════════════════════════════════════

#[test]
fn next_line_prefetch_installs_the_following_line() {
    let mut cache = Cache::new(&config(4, 16, ReplacementPolicy::Lru, Prefetcher::NextLine));
    let access = cache.access(0x1000, false);
    assert!(!access.hit);
    assert_eq!(access.prefetched, vec![0x1040]);
    assert!(cache.contains(0x1040));
    assert!(cache.access(0x1040, false).hit);
}

#[test]
fn stride_prefetch_waits_for_confidence() {
    let mut cache = Cache::new(&config(4, 16, ReplacementPolicy::Lru, Prefetcher::Stride));
    for addr in [0x1000, 0x1080, 0x1100] {
        assert!(cache.access(addr, false).prefetched.is_empty());
    }
    assert_eq!(cache.access(0x1180, false).prefetched, vec![0x1200]);
}

#[test]
fn prefetchers_on_their_own() {
    let mut next = NextLinePrefetcher::new(64, 3);
    assert_eq!(next.observe(0x10, false), vec![0x40, 0x80, 0xc0]);

    let mut stride = StridePrefetcher::new(64, 16, 2);
    for addr in [0x2000, 0x2100, 0x2200] {
        let _ = stride.observe(addr, false);
    }
    assert_eq!(stride.observe(0x2300, false), vec![0x2400, 0x2500]);
    // A broken stride stops prefetching.
    assert!(stride.observe(0x2310, false).is_empty());
}
