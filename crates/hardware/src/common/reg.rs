//! Register classes and register identifiers.
//!
//! Every register reference in a micro-op names a `RegClass` and an index. Rename
//! maps an [`ArchReg`] to a [`PhysRegId`] of the same class; each class has its own,
//! independently sized physical register file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Register class; each class owns a separate rename map and free list.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RegClass {
    /// General-purpose integer registers.
    Int,
    /// Scalar floating-point registers.
    Float,
    /// Vector (SIMD) registers.
    Vec,
    /// Vector predicate registers.
    VecPred,
    /// Matrix registers.
    Matrix,
    /// Condition-code / flag registers.
    #[serde(alias = "cc")]
    CondCode,
}

impl RegClass {
    /// All register classes, in the order used to index per-class tables.
    pub const ALL: [Self; 6] = [
        Self::Int,
        Self::Float,
        Self::Vec,
        Self::VecPred,
        Self::Matrix,
        Self::CondCode,
    ];

    /// Number of register classes.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index of this class into per-class tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Int => 0,
            Self::Float => 1,
            Self::Vec => 2,
            Self::VecPred => 3,
            Self::Matrix => 4,
            Self::CondCode => 5,
        }
    }

    /// Number of architectural registers of this class visible to one thread.
    pub const fn num_arch_regs(self) -> usize {
        match self {
            Self::Int | Self::Float | Self::Vec => 32,
            Self::VecPred => 16,
            Self::Matrix => 1,
            Self::CondCode => 5,
        }
    }

    /// Short lowercase name used in statistics and log output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec => "vec",
            Self::VecPred => "vec_pred",
            Self::Matrix => "matrix",
            Self::CondCode => "cc",
        }
    }
}

/// An architectural register as named by an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchReg {
    /// Register class.
    pub class: RegClass,
    /// Index within the class, `0..class.num_arch_regs()`.
    pub index: u16,
}

impl ArchReg {
    /// Integer register `index`.
    pub const fn int(index: u16) -> Self {
        Self {
            class: RegClass::Int,
            index,
        }
    }

    /// Floating-point register `index`.
    pub const fn float(index: u16) -> Self {
        Self {
            class: RegClass::Float,
            index,
        }
    }

    /// Vector register `index`.
    pub const fn vec(index: u16) -> Self {
        Self {
            class: RegClass::Vec,
            index,
        }
    }

    /// Condition-code register `index`.
    pub const fn cc(index: u16) -> Self {
        Self {
            class: RegClass::CondCode,
            index,
        }
    }
}

impl fmt::Display for ArchReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class.name(), self.index)
    }
}

/// A physical register: an entry in one class's physical register file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysRegId {
    /// Register class of the physical file.
    pub class: RegClass,
    /// Index within that class's physical file.
    pub index: u32,
}

impl fmt::Display for PhysRegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}{}", self.class.name(), self.index)
    }
}
