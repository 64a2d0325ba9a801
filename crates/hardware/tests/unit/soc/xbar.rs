//! Crossbar Tests.

use firestorm_core::config::XbarConfig;
use firestorm_core::soc::xbar::{Crossbar, HEADER_BYTES};
use rstest::rstest;

fn system_xbar() -> Crossbar {
    Crossbar::new(XbarConfig {
        width_bytes: 16,
        frontend_latency: 3,
        forward_latency: 4,
        response_latency: 2,
    })
}

#[rstest]
#[case(1, 1)]
#[case(16, 1)]
#[case(17, 2)]
#[case(64, 4)]
fn transfer_time_rounds_up(#[case] bytes: u64, #[case] cycles: u64) {
    assert_eq!(system_xbar().transfer_cycles(bytes), cycles);
}

#[test]
fn idle_crossbar_adds_only_fixed_latency() {
    let mut xbar = system_xbar();
    assert_eq!(xbar.request(100, HEADER_BYTES), 100 + 3 + 4 + 1);
    assert_eq!(xbar.response(200, 64), 200 + 2 + 4);
    assert_eq!(xbar.contention_cycles, 0);
}

#[test]
fn layers_serve_one_packet_at_a_time() {
    let mut xbar = system_xbar();
    let first = xbar.response(10, 64);
    let second = xbar.response(10, 64);
    assert_eq!(second - first, 4);
    assert_eq!(xbar.contention_cycles, 4);
    // The request layer is independent of the response layer.
    assert_eq!(xbar.request(10, HEADER_BYTES), 10 + 3 + 4 + 1);
}

#[test]
fn late_packets_do_not_wait() {
    let mut xbar = system_xbar();
    let _ = xbar.request(0, 64);
    assert_eq!(xbar.request(50, 64), 50 + 3 + 4 + 4);
    assert_eq!(xbar.contention_cycles, 0);
}
