//! Register Rename Tests.
//!
//! The invariant under test: within a class, no physical register is reachable from two
//! live mappings at once, and every register is either live or free, never both.

use std::collections::{BTreeSet, VecDeque};

use firestorm_core::common::{ArchReg, RegClass, SeqNum};
use firestorm_core::config::Config;
use firestorm_core::core::rename::Renamer;
use proptest::prelude::*;

fn renamer(threads: usize) -> (Renamer, Config) {
    let config = Config::default();
    (Renamer::new(&config.resources, threads), config)
}

/// Live and free sets are disjoint, duplicate-free, and together cover every register.
fn assert_partition(renamer: &Renamer, config: &Config) {
    let live = renamer.live_regs();
    let free = renamer.free_regs();
    let live_set: BTreeSet<_> = live.iter().copied().collect();
    let free_set: BTreeSet<_> = free.iter().copied().collect();
    assert_eq!(live_set.len(), live.len(), "a register is live twice");
    assert_eq!(free_set.len(), free.len(), "a register is free twice");
    assert!(live_set.is_disjoint(&free_set), "a live register is also free");
    for class in RegClass::ALL {
        let total = live_set.iter().filter(|r| r.class == class).count()
            + free_set.iter().filter(|r| r.class == class).count();
        assert_eq!(total, config.resources.phys_regs(class), "{class:?} registers leaked");
    }
}

// ══════════════════════════════════════════════════════════
// 1. Basic mapping
// ══════════════════════════════════════════════════════════

#[test]
fn initial_maps_are_disjoint_between_threads() {
    let (renamer, config) = renamer(2);
    for i in 0..32 {
        assert_ne!(
            renamer.lookup(0, ArchReg::int(i)),
            renamer.lookup(1, ArchReg::int(i))
        );
    }
    assert_eq!(
        renamer.available(RegClass::Int),
        config.resources.num_phys_int_regs - 64
    );
    assert_partition(&renamer, &config);
}

#[test]
fn sources_see_the_newest_mapping() {
    let (mut renamer, _) = renamer(1);
    let first = renamer
        .rename(0, SeqNum(1), &[], &[ArchReg::int(5)])
        .unwrap();
    let second = renamer
        .rename(0, SeqNum(2), &[ArchReg::int(5)], &[ArchReg::int(6)])
        .unwrap();
    assert_eq!(second.srcs, first.dests);
}

#[test]
fn commit_frees_the_previous_mapping() {
    let (mut renamer, config) = renamer(1);
    let before = renamer.lookup(0, ArchReg::float(3));
    let _ = renamer.rename(0, SeqNum(7), &[], &[ArchReg::float(3)]).unwrap();
    let available = renamer.available(RegClass::Float);
    renamer.commit(0, SeqNum(7));
    assert_eq!(renamer.available(RegClass::Float), available + 1);
    assert!(renamer.free_regs().contains(&before));
    assert_eq!(renamer.history_len(0), 0);
    assert_partition(&renamer, &config);
}

#[test]
fn squash_restores_mappings_youngest_first() {
    let (mut renamer, config) = renamer(1);
    let original = renamer.lookup(0, ArchReg::int(1));
    let _ = renamer.rename(0, SeqNum(1), &[], &[ArchReg::int(1)]).unwrap();
    let kept = renamer.lookup(0, ArchReg::int(1));
    let _ = renamer.rename(0, SeqNum(2), &[], &[ArchReg::int(1)]).unwrap();
    let _ = renamer.rename(0, SeqNum(3), &[], &[ArchReg::int(1)]).unwrap();

    assert_eq!(renamer.squash(0, SeqNum(2)), 2);
    assert_eq!(renamer.lookup(0, ArchReg::int(1)), kept);
    assert_eq!(renamer.squash(0, SeqNum(1)), 1);
    assert_eq!(renamer.lookup(0, ArchReg::int(1)), original);
    assert_partition(&renamer, &config);
}

#[test]
fn rename_fails_atomically_when_a_class_runs_out() {
    let mut config = Config::default();
    config.resources.num_phys_matrix_regs = 2;
    let mut renamer = Renamer::new(&config.resources, 1);
    let _ = renamer
        .rename(0, SeqNum(1), &[], &[ArchReg { class: RegClass::Matrix, index: 0 }])
        .unwrap();
    let int_free = renamer.available(RegClass::Int);
    let blocked = renamer.rename(
        0,
        SeqNum(2),
        &[],
        &[ArchReg::int(4), ArchReg { class: RegClass::Matrix, index: 0 }],
    );
    assert!(blocked.is_none());
    assert_eq!(renamer.available(RegClass::Int), int_free);
    assert_eq!(renamer.history_len(0), 1);
}

// ══════════════════════════════════════════════════════════
// 2. Uniqueness under random rename / commit / squash
// ══════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
enum Op {
    Rename { src: u16, int_dest: u16, float_dest: Option<u16> },
    Commit,
    Squash { keep: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u16..32, 0u16..32, proptest::option::of(0u16..32))
            .prop_map(|(src, int_dest, float_dest)| Op::Rename { src, int_dest, float_dest }),
        2 => Just(Op::Commit),
        1 => (0usize..64).prop_map(|keep| Op::Squash { keep }),
    ]
}

proptest! {
    #[test]
    fn physical_registers_are_never_shared(ops in proptest::collection::vec(op(), 1..300)) {
        let (mut renamer, config) = renamer(1);
        let mut in_flight: VecDeque<SeqNum> = VecDeque::new();
        let mut next = 1;

        for op in ops {
            match op {
                Op::Rename { src, int_dest, float_dest } => {
                    let seq = SeqNum(next);
                    next += 1;
                    let mut dests = vec![ArchReg::int(int_dest)];
                    dests.extend(float_dest.map(ArchReg::float));
                    if renamer.rename(0, seq, &[ArchReg::int(src)], &dests).is_some() {
                        in_flight.push_back(seq);
                    }
                }
                Op::Commit => {
                    if let Some(seq) = in_flight.pop_front() {
                        renamer.commit(0, seq);
                    }
                }
                Op::Squash { keep } => {
                    if !in_flight.is_empty() {
                        let keep = keep % in_flight.len();
                        let _ = renamer.squash(0, in_flight[keep]);
                        in_flight.truncate(keep);
                    }
                }
            }
            assert_partition(&renamer, &config);
        }

        while let Some(seq) = in_flight.pop_front() {
            renamer.commit(0, seq);
        }
        prop_assert_eq!(renamer.history_len(0), 0);
        prop_assert_eq!(
            renamer.available(RegClass::Int),
            config.resources.num_phys_int_regs - 32
        );
    }
}
