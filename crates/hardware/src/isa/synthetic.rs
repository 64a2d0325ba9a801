//! Synthetic workload generators.
//!
//! These produce committed-path streams with a known shape, for smoke runs from the command
//! line and for timing tests that need a predictable instruction mix.

use serde::Deserialize;

use super::inst::{ControlKind, StaticInst};
use super::op_class::OpClass;
use crate::common::{Addr, ArchReg};

/// Base PC of generated code.
pub const CODE_BASE: Addr = 0x1000;

/// Base address of generated data accesses.
pub const DATA_BASE: Addr = 0x10_0000;

/// Shape of a generated stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticWorkload {
    /// Independent integer ALU operations with no source operands.
    IndependentAlu,
    /// A single serial chain: every ALU op reads the previous op's result.
    DependentChain,
    /// Strided loads and stores over a small array, with address-dependent reuse.
    Memory,
    /// A tight loop closed by a conditional backward branch.
    Branchy,
    /// A blend of ALU, multiply, FP, memory, and branch operations.
    Mixed,
}

/// Generates `len` micro-ops of the given shape.
pub fn generate(kind: SyntheticWorkload, len: usize) -> Vec<StaticInst> {
    match kind {
        SyntheticWorkload::IndependentAlu => independent_alu(len),
        SyntheticWorkload::DependentChain => dependent_chain(len),
        SyntheticWorkload::Memory => memory(len),
        SyntheticWorkload::Branchy => branchy(len),
        SyntheticWorkload::Mixed => mixed(len),
    }
}

fn pc_of(i: usize) -> Addr {
    CODE_BASE + 4 * i as Addr
}

fn dest_reg(i: usize) -> ArchReg {
    ArchReg::int(1 + (i % 31) as u16)
}

fn independent_alu(len: usize) -> Vec<StaticInst> {
    (0..len)
        .map(|i| StaticInst::alu(pc_of(i)).with_dests([dest_reg(i)]))
        .collect()
}

fn dependent_chain(len: usize) -> Vec<StaticInst> {
    (0..len)
        .map(|i| {
            StaticInst::alu(pc_of(i))
                .with_srcs([ArchReg::int(5)])
                .with_dests([ArchReg::int(5)])
        })
        .collect()
}

fn memory(len: usize) -> Vec<StaticInst> {
    (0..len)
        .map(|i| {
            let addr = DATA_BASE + 8 * (i % 512) as Addr;
            if i % 3 == 2 {
                StaticInst::store(pc_of(i), addr, 8).with_srcs([ArchReg::int(2), dest_reg(i)])
            } else {
                StaticInst::load(pc_of(i), addr, 8)
                    .with_srcs([ArchReg::int(2)])
                    .with_dests([dest_reg(i)])
            }
        })
        .collect()
}

/// Loop body length (including the closing branch) of the branchy workload.
const LOOP_BODY: usize = 8;
/// Iterations per loop instance of the branchy workload.
const LOOP_TRIPS: usize = 16;

fn branchy(len: usize) -> Vec<StaticInst> {
    // Each loop instance gets its own code region so the exit falls through to the next.
    let mut out = Vec::with_capacity(len);
    let mut iteration = 0;
    while out.len() < len {
        let instance = iteration / LOOP_TRIPS;
        let trip = iteration % LOOP_TRIPS;
        let base = instance * LOOP_BODY;
        for slot in 0..LOOP_BODY {
            if out.len() == len {
                break;
            }
            let pc = pc_of(base + slot);
            if slot + 1 == LOOP_BODY {
                let taken = trip + 1 < LOOP_TRIPS;
                out.push(
                    StaticInst::branch(pc, ControlKind::CondDirect, taken, pc_of(base))
                        .with_srcs([ArchReg::int(6)]),
                );
            } else {
                out.push(
                    StaticInst::alu(pc)
                        .with_srcs([ArchReg::int(6)])
                        .with_dests([dest_reg(slot)]),
                );
            }
        }
        iteration += 1;
    }
    out
}

fn mixed(len: usize) -> Vec<StaticInst> {
    // Straight-line blocks of 16 ending in an always-taken jump to the next block.
    (0..len)
        .map(|i| {
            let pc = pc_of(i);
            match i % 16 {
                15 => StaticInst::branch(pc, ControlKind::UncondDirect, true, pc + 4),
                3 | 9 => StaticInst::load(pc, DATA_BASE + 64 * (i % 97) as Addr, 8)
                    .with_srcs([ArchReg::int(2)])
                    .with_dests([dest_reg(i)]),
                6 => StaticInst::store(pc, DATA_BASE + 64 * (i % 89) as Addr, 8)
                    .with_srcs([ArchReg::int(2), dest_reg(i)]),
                7 => StaticInst::new(pc, OpClass::IntMult)
                    .with_srcs([dest_reg(i - 1)])
                    .with_dests([dest_reg(i)]),
                11 => StaticInst::new(pc, OpClass::FloatAdd)
                    .with_srcs([ArchReg::float(1), ArchReg::float(2)])
                    .with_dests([ArchReg::float(1)]),
                12 => StaticInst::new(pc, OpClass::FloatMultAcc)
                    .with_srcs([ArchReg::float(1), ArchReg::float(3)])
                    .with_dests([ArchReg::float(4)]),
                _ => StaticInst::alu(pc)
                    .with_srcs([dest_reg(i + 7)])
                    .with_dests([dest_reg(i)]),
            }
        })
        .collect()
}
