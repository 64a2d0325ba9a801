//! Statistics Tests.

use firestorm_core::stats::{CacheStats, STATS_SECTIONS, SimStats, SquashCause, SquashStats};
use rstest::rstest;

fn sample() -> SimStats {
    let mut stats = SimStats::new(2, 7);
    stats.cycles = 400;
    stats.committed = 1_000;
    stats.committed_per_thread = vec![600, 400];
    stats
}

#[test]
fn new_sizes_per_thread_and_histogram_vectors() {
    let stats = SimStats::new(3, 7);
    assert_eq!(stats.committed_per_thread, vec![0, 0, 0]);
    assert_eq!(stats.commit_histogram.len(), 8);
}

#[test]
fn ipc_and_cpi_are_reciprocal() {
    let stats = sample();
    assert!((stats.ipc() - 2.5).abs() < 1e-9);
    assert!((stats.cpi() - 0.4).abs() < 1e-9);
}

#[test]
fn empty_run_has_zero_rates() {
    let stats = SimStats::default();
    assert_eq!(stats.ipc(), 0.0);
    assert_eq!(stats.cpi(), 0.0);
    assert_eq!(stats.l1_d.miss_rate(), 0.0);
}

#[rstest]
#[case(90, 10, 0, 10.0)]
#[case(75, 20, 5, 25.0)]
#[case(0, 4, 0, 100.0)]
fn miss_rate_counts_merges_as_misses(
    #[case] hits: u64,
    #[case] misses: u64,
    #[case] mshr_merges: u64,
    #[case] expected: f64,
) {
    let cache = CacheStats {
        hits,
        misses,
        mshr_merges,
        ..CacheStats::default()
    };
    assert_eq!(cache.accesses(), hits + misses + mshr_merges);
    assert!((cache.miss_rate() - expected).abs() < 1e-9);
}

#[test]
fn squash_causes_are_tallied_separately() {
    let mut squashes = SquashStats::default();
    for cause in [
        SquashCause::BranchMispredict,
        SquashCause::BranchMispredict,
        SquashCause::DecodeRedirect,
        SquashCause::MemoryOrder,
        SquashCause::Fault,
    ] {
        squashes.record(cause);
    }
    assert_eq!(squashes.branch_mispredict, 2);
    assert_eq!(squashes.decode_redirect, 1);
    assert_eq!(squashes.memory_order, 1);
    assert_eq!(squashes.fault, 1);
    assert_eq!(squashes.total(), 5);
}

#[test]
fn stats_serialize_to_json() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["committed"], 1_000);
    assert_eq!(json["committed_per_thread"][1], 400);
    assert!(json["l1_d"]["hits"].is_u64());
}

#[test]
fn every_section_prints() {
    let stats = sample();
    stats.print();
    for section in STATS_SECTIONS {
        stats.print_sections(&[(*section).to_string()]);
    }
    stats.print_sections(&["no_such_section".to_string()]);
}
