//! Branch Prediction Unit Tests.
//!
//! Verifies the BTB, RAS, gshare training, and the static predictor behind the
//! `BranchPredictor` trait.

use firestorm_core::config::{BranchPredictorConfig, BranchPredictorKind, Config};
use firestorm_core::core::units::bru::btb::Btb;
use firestorm_core::core::units::bru::gshare::GSharePredictor;
use firestorm_core::core::units::bru::ras::Ras;
use firestorm_core::core::units::bru::static_bp::StaticPredictor;
use firestorm_core::core::units::bru::{
    BranchOutcome, BranchPredictor, BranchPredictorWrapper, Prediction,
};
use firestorm_core::isa::ControlKind;

const PC: u64 = 0x1000;
const TARGET: u64 = 0x2000;

fn outcome(kind: ControlKind, taken: bool, history: u64) -> BranchOutcome {
    BranchOutcome {
        pc: PC,
        kind,
        taken,
        target: TARGET,
        history,
    }
}

// ══════════════════════════════════════════════════════════
// 1. BTB and RAS
// ══════════════════════════════════════════════════════════

#[test]
fn btb_hits_only_on_matching_tag() {
    let mut btb = Btb::new(16);
    assert_eq!(btb.lookup(PC), None);
    btb.update(PC, TARGET);
    assert_eq!(btb.lookup(PC), Some(TARGET));
    // Aliases into the same slot with a different tag.
    assert_eq!(btb.lookup(PC + 16 * 4), None);
    btb.update(PC + 16 * 4, 0x3000);
    assert_eq!(btb.lookup(PC), None);
}

#[test]
fn ras_is_last_in_first_out() {
    let mut ras = Ras::new(4);
    assert_eq!(ras.top(), None);
    ras.push(0x10);
    ras.push(0x20);
    assert_eq!(ras.top(), Some(0x20));
    assert_eq!(ras.depth(), 2);
    assert_eq!(ras.pop(), Some(0x20));
    assert_eq!(ras.pop(), Some(0x10));
    assert_eq!(ras.pop(), None);
}

#[test]
fn zero_capacity_ras_ignores_pushes() {
    let mut ras = Ras::new(0);
    ras.push(0x10);
    assert_eq!(ras.pop(), None);
}

// ══════════════════════════════════════════════════════════
// 2. Direction predictors
// ══════════════════════════════════════════════════════════

#[test]
fn gshare_starts_weakly_not_taken() {
    let bp = GSharePredictor::new(64, 8);
    assert_eq!(bp.predict(PC, 0, ControlKind::CondDirect), Prediction::NOT_TAKEN);
}

#[test]
fn gshare_learns_a_taken_branch() {
    let mut bp = GSharePredictor::new(64, 8);
    bp.update(&outcome(ControlKind::CondDirect, true, 0));
    assert_eq!(
        bp.predict(PC, 0, ControlKind::CondDirect),
        Prediction {
            taken: true,
            target: Some(TARGET),
        }
    );
    // A different history selects an untrained counter.
    assert!(!bp.predict(PC, 0b1, ControlKind::CondDirect).taken);

    bp.update(&outcome(ControlKind::CondDirect, false, 0));
    assert!(!bp.predict(PC, 0, ControlKind::CondDirect).taken);
}

#[test]
fn gshare_counters_saturate() {
    let mut bp = GSharePredictor::new(64, 4);
    for _ in 0..10 {
        bp.update(&outcome(ControlKind::CondDirect, true, 3));
    }
    bp.update(&outcome(ControlKind::CondDirect, false, 3));
    assert!(bp.predict(PC, 3, ControlKind::CondDirect).taken);
    bp.update(&outcome(ControlKind::CondDirect, false, 3));
    assert!(!bp.predict(PC, 3, ControlKind::CondDirect).taken);
}

#[test]
fn unconditional_branches_are_always_taken() {
    let bp = GSharePredictor::new(64, 8);
    for kind in [ControlKind::UncondDirect, ControlKind::Call, ControlKind::Indirect] {
        let p = bp.predict(PC, 0, kind);
        assert!(p.taken);
        // No target yet, so fetch falls through.
        assert_eq!(p.next_pc(PC + 4), PC + 4);
    }
}

#[test]
fn static_predictor_never_takes_conditionals() {
    let mut bp = StaticPredictor::new(64);
    for _ in 0..4 {
        bp.update(&outcome(ControlKind::CondDirect, true, 0));
    }
    assert!(!bp.predict(PC, 0, ControlKind::CondDirect).taken);
    assert_eq!(
        bp.predict(PC, 0, ControlKind::UncondDirect).next_pc(PC + 4),
        TARGET
    );
}

#[test]
fn wrapper_follows_the_configured_kind() {
    let mut config = Config::default().branch_predictor;
    config.kind = BranchPredictorKind::Static;
    let mut bp = BranchPredictorWrapper::new(&config);
    bp.update(&outcome(ControlKind::CondDirect, true, 0));
    assert!(!bp.predict(PC, 0, ControlKind::CondDirect).taken);

    let mut bp = BranchPredictorWrapper::new(&BranchPredictorConfig {
        kind: BranchPredictorKind::GShare,
        ..config
    });
    bp.update(&outcome(ControlKind::CondDirect, true, 0));
    assert!(bp.predict(PC, 0, ControlKind::CondDirect).taken);
}
