//! Operation classes.
//!
//! An operation class tells the functional-unit pool which kind of unit can execute a
//! micro-op and with what latency. The names follow the usual O3 model catalogue.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Functional-unit class of a micro-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OpClass {
    /// No operation; completes at dispatch without a functional unit.
    #[serde(alias = "No_OpClass")]
    Nop,
    /// Integer add/logic/shift/compare, and branches.
    IntAlu,
    /// Integer multiply.
    IntMult,
    /// Integer divide.
    IntDiv,
    /// FP add/subtract.
    FloatAdd,
    /// FP compare.
    FloatCmp,
    /// FP conversion.
    FloatCvt,
    /// FP multiply.
    FloatMult,
    /// FP fused multiply-accumulate.
    FloatMultAcc,
    /// FP divide.
    FloatDiv,
    /// FP miscellaneous (moves, sign injection).
    FloatMisc,
    /// FP square root.
    FloatSqrt,
    /// SIMD integer add.
    SimdAdd,
    /// SIMD integer logic / shift.
    SimdAlu,
    /// SIMD integer multiply.
    SimdMult,
    /// SIMD floating-point arithmetic.
    SimdFloat,
    /// Predicate ALU.
    SimdPredAlu,
    /// Integer load.
    MemRead,
    /// Integer store.
    MemWrite,
    /// FP / vector load.
    FloatMemRead,
    /// FP / vector store.
    FloatMemWrite,
    /// Privileged / system register access.
    IprAccess,
}

impl OpClass {
    /// All operation classes.
    pub const ALL: [Self; 22] = [
        Self::Nop,
        Self::IntAlu,
        Self::IntMult,
        Self::IntDiv,
        Self::FloatAdd,
        Self::FloatCmp,
        Self::FloatCvt,
        Self::FloatMult,
        Self::FloatMultAcc,
        Self::FloatDiv,
        Self::FloatMisc,
        Self::FloatSqrt,
        Self::SimdAdd,
        Self::SimdAlu,
        Self::SimdMult,
        Self::SimdFloat,
        Self::SimdPredAlu,
        Self::MemRead,
        Self::MemWrite,
        Self::FloatMemRead,
        Self::FloatMemWrite,
        Self::IprAccess,
    ];

    /// Number of operation classes.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index into per-class tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// True for loads.
    #[inline]
    pub const fn is_load(self) -> bool {
        matches!(self, Self::MemRead | Self::FloatMemRead)
    }

    /// True for stores.
    #[inline]
    pub const fn is_store(self) -> bool {
        matches!(self, Self::MemWrite | Self::FloatMemWrite)
    }

    /// True for any memory reference.
    #[inline]
    pub const fn is_mem(self) -> bool {
        self.is_load() || self.is_store()
    }

    /// True for floating-point and SIMD arithmetic.
    pub const fn is_fp(self) -> bool {
        matches!(
            self,
            Self::FloatAdd
                | Self::FloatCmp
                | Self::FloatCvt
                | Self::FloatMult
                | Self::FloatMultAcc
                | Self::FloatDiv
                | Self::FloatMisc
                | Self::FloatSqrt
                | Self::SimdAdd
                | Self::SimdAlu
                | Self::SimdMult
                | Self::SimdFloat
                | Self::SimdPredAlu
        )
    }
}

impl fmt::Display for OpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
