//! Functional-Unit Pool Tests.

use firestorm_core::config::{FuDesc, FuPoolConfig, OpTiming};
use firestorm_core::core::units::fu_pool::{FuGrant, FuPool, FuRefusal};
use firestorm_core::isa::OpClass;

fn pool(units: Vec<FuDesc>, issue_width: usize, wb_width: usize) -> FuPool {
    FuPool::new(&FuPoolConfig::Custom { units }, issue_width, wb_width)
}

fn group(name: &str, count: usize, ops: Vec<OpTiming>) -> FuDesc {
    FuDesc {
        name: name.to_string(),
        count,
        ops,
    }
}

#[test]
fn default_pool_executes_every_class_but_nop() {
    let pool = FuPool::new(&FuPoolConfig::Default, 8, 8);
    for op in OpClass::ALL {
        assert_eq!(pool.is_capable(op), op != OpClass::Nop, "{op}");
    }
    assert_eq!(pool.latency(OpClass::IntMult), Some(3));
    assert_eq!(pool.latency(OpClass::FloatSqrt), Some(24));
    assert_eq!(pool.group_names().count(), 8);
}

#[test]
fn missing_class_is_incapable() {
    let mut pool = pool(vec![group("alu", 1, vec![OpTiming::pipelined(OpClass::IntAlu, 1)])], 4, 4);
    assert_eq!(pool.try_issue(OpClass::FloatDiv, 0), Err(FuRefusal::Incapable));
    assert_eq!(pool.latency(OpClass::FloatDiv), None);
}

#[test]
fn group_port_limits_issue_per_cycle() {
    let mut pool = pool(vec![group("alu", 8, vec![OpTiming::pipelined(OpClass::IntAlu, 1)])], 3, 3);
    for _ in 0..3 {
        assert_eq!(
            pool.try_issue(OpClass::IntAlu, 0),
            Ok(FuGrant {
                group: 0,
                latency: 1,
            })
        );
    }
    assert_eq!(pool.try_issue(OpClass::IntAlu, 0), Err(FuRefusal::Busy));
    pool.begin_cycle();
    assert!(pool.try_issue(OpClass::IntAlu, 1).is_ok());
}

#[test]
fn pipelined_units_accept_every_cycle() {
    let mut pool = pool(vec![group("mul", 1, vec![OpTiming::pipelined(OpClass::IntMult, 3)])], 1, 1);
    for now in 0..5 {
        pool.begin_cycle();
        assert_eq!(pool.try_issue(OpClass::IntMult, now).map(|g| g.latency), Ok(3));
    }
}

#[test]
fn blocking_op_holds_its_unit() {
    let mut pool = pool(
        vec![group("div", 1, vec![OpTiming::blocking(OpClass::FloatDiv, 12, 12)])],
        1,
        1,
    );
    assert!(pool.try_issue(OpClass::FloatDiv, 0).is_ok());
    for now in 1..12 {
        pool.begin_cycle();
        assert_eq!(pool.try_issue(OpClass::FloatDiv, now), Err(FuRefusal::Busy));
    }
    pool.begin_cycle();
    assert!(pool.try_issue(OpClass::FloatDiv, 12).is_ok());
}

#[test]
fn a_busy_group_falls_back_to_another_capable_group() {
    let mut pool = pool(
        vec![
            group("fast", 1, vec![OpTiming::pipelined(OpClass::SimdAlu, 1)]),
            group("slow", 1, vec![OpTiming::pipelined(OpClass::SimdAlu, 2)]),
        ],
        1,
        1,
    );
    assert_eq!(pool.try_issue(OpClass::SimdAlu, 0).map(|g| g.group), Ok(0));
    assert_eq!(
        pool.try_issue(OpClass::SimdAlu, 0),
        Ok(FuGrant {
            group: 1,
            latency: 2,
        })
    );
    assert_eq!(pool.try_issue(OpClass::SimdAlu, 0), Err(FuRefusal::Busy));
}

#[test]
fn writeback_width_is_shared_by_every_group() {
    let mut pool = FuPool::new(&FuPoolConfig::Default, 8, 1);
    let alu = pool.try_issue(OpClass::IntAlu, 0).unwrap();
    let fp = pool.try_issue(OpClass::FloatAdd, 0).unwrap();
    let mem = pool.try_issue(OpClass::MemRead, 0).unwrap();
    assert_ne!(alu.group, fp.group);
    assert_ne!(fp.group, mem.group);

    let granted = (0..3).filter(|_| pool.try_writeback()).count();
    assert_eq!(granted, 1);
    pool.begin_cycle();
    assert!(pool.try_writeback());
    assert!(!pool.try_writeback());
}
