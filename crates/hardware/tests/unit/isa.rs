//! Instruction Stream Tests.
//!
//! Loading traces from disk, and the committed-path shape of the synthetic workloads.

use std::io::Write;

use firestorm_core::common::{ArchReg, SimError};
use firestorm_core::isa::{
    ControlKind, InstSource, MemAccess, OpClass, StaticInst, SyntheticWorkload, TraceProgram,
    generate,
};
use rstest::rstest;
use tempfile::NamedTempFile;

const TWO_THREADS: &str = r#"{ "threads": [
    [
        { "pc": 4096, "op_class": "IntAlu", "dests": [{"class": "int", "index": 1}] },
        { "pc": 4100, "op_class": "MemWrite", "mem": {"addr": 256, "size": 4},
          "srcs": [{"class": "int", "index": 1}] }
    ],
    [
        { "pc": 8192, "op_class": "Nop", "serializing": true }
    ]
] }"#;

fn trace_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

// ══════════════════════════════════════════════════════════
// 1. Trace files
// ══════════════════════════════════════════════════════════

#[test]
fn loads_a_multithreaded_trace_from_disk() {
    let file = trace_file(TWO_THREADS);
    let program = TraceProgram::from_file(file.path()).unwrap();
    assert_eq!(program.num_threads(), 2);
    assert_eq!(program.len(), 3);

    let store = program.inst_at(0, 1).unwrap();
    assert_eq!(store.mem, Some(MemAccess { addr: 256, size: 4 }));
    assert_eq!(store.srcs, vec![ArchReg::int(1)]);
    assert!(program.inst_at(1, 0).unwrap().serializing);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = TraceProgram::from_file(&path).unwrap_err();
    assert!(matches!(err, SimError::Io { path: p, .. } if p == path));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let file = trace_file("{ \"threads\": [[ { \"pc\": 1 ");
    let err = TraceProgram::from_file(file.path()).unwrap_err();
    assert!(matches!(err, SimError::Parse { .. }));
}

#[rstest]
#[case::no_threads(r#"{ "threads": [] }"#)]
#[case::zero_size(r#"{ "threads": [[ { "pc": 0, "size": 0, "op_class": "IntAlu" } ]] }"#)]
#[case::load_without_address(r#"{ "threads": [[ { "pc": 0, "op_class": "FloatMemRead" } ]] }"#)]
#[case::dest_register_out_of_range(
    r#"{ "threads": [[ { "pc": 0, "op_class": "IntAlu", "dests": [{ "class": "int", "index": 40 }] } ]] }"#
)]
#[case::src_register_out_of_range(
    r#"{ "threads": [[ { "pc": 0, "op_class": "FloatAdd", "srcs": [{ "class": "float", "index": 32 }] } ]] }"#
)]
fn inconsistent_traces_are_rejected(#[case] json: &str) {
    assert!(matches!(
        TraceProgram::from_json_str(json),
        Err(SimError::Trace(_))
    ));
}

#[test]
fn highest_register_of_each_class_is_accepted() {
    let json = r#"{ "threads": [[ { "pc": 0, "op_class": "IntAlu",
        "srcs": [{ "class": "int", "index": 31 }], "dests": [{ "class": "float", "index": 31 }] } ]] }"#;
    assert!(TraceProgram::from_json_str(json).is_ok());
}

#[test]
fn handled_faults_are_recorded_in_order() {
    use firestorm_core::common::{Fault, FaultKind};
    let mut program = TraceProgram::single(generate(SyntheticWorkload::IndependentAlu, 4));
    let a = Fault::new(FaultKind::Breakpoint, 0x1000);
    let b = Fault::new(FaultKind::SystemCall, 0x1008);
    program.on_fault(0, 0, &a);
    program.on_fault(0, 2, &b);
    assert_eq!(program.handled_faults, vec![(0, 0, a), (0, 2, b)]);
}

// ══════════════════════════════════════════════════════════
// 2. Micro-ops
// ══════════════════════════════════════════════════════════

#[test]
fn taken_branches_continue_at_their_target() {
    let taken = StaticInst::branch(0x1000, ControlKind::CondDirect, true, 0x800);
    let not_taken = StaticInst::branch(0x1000, ControlKind::CondDirect, false, 0x800);
    assert_eq!(taken.next_pc(), 0x800);
    assert_eq!(not_taken.next_pc(), 0x1004);
    assert_eq!(StaticInst::alu(0x2000).next_pc(), 0x2004);
}

#[test]
fn access_end_is_inclusive() {
    assert_eq!(MemAccess { addr: 0x40, size: 8 }.end(), 0x47);
    assert_eq!(MemAccess { addr: 0x40, size: 1 }.end(), 0x40);
}

#[test]
fn control_kinds_classify_direct_and_unconditional() {
    assert!(ControlKind::CondDirect.is_direct());
    assert!(!ControlKind::CondDirect.is_unconditional());
    assert!(!ControlKind::Return.is_direct());
    assert!(ControlKind::Indirect.is_unconditional());
}

#[test]
fn op_class_indices_are_dense() {
    for (i, class) in OpClass::ALL.iter().enumerate() {
        assert_eq!(class.index(), i);
    }
    assert!(OpClass::FloatMemWrite.is_store());
    assert!(OpClass::FloatMemRead.is_load());
    assert!(!OpClass::IntAlu.is_mem());
}

// ══════════════════════════════════════════════════════════
// 3. Synthetic workloads
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(SyntheticWorkload::IndependentAlu)]
#[case(SyntheticWorkload::DependentChain)]
#[case(SyntheticWorkload::Memory)]
#[case(SyntheticWorkload::Branchy)]
#[case(SyntheticWorkload::Mixed)]
fn generated_streams_follow_their_own_control_flow(#[case] kind: SyntheticWorkload) {
    let stream = generate(kind, 500);
    assert_eq!(stream.len(), 500);
    for pair in stream.windows(2) {
        assert_eq!(pair[0].next_pc(), pair[1].pc, "{kind:?}");
    }
}

#[test]
fn memory_workload_is_two_loads_per_store() {
    let stream = generate(SyntheticWorkload::Memory, 300);
    let loads = stream.iter().filter(|i| i.is_load()).count();
    let stores = stream.iter().filter(|i| i.is_store()).count();
    assert_eq!((loads, stores), (200, 100));
}

#[test]
fn dependent_chain_reads_what_it_writes() {
    for inst in generate(SyntheticWorkload::DependentChain, 16) {
        assert_eq!(inst.srcs, inst.dests);
    }
}
