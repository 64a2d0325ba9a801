//! Pre-decoded micro-op description.
//!
//! A `StaticInst` carries everything the timing model needs to know about one micro-op
//! on the committed path: which unit executes it, which registers it reads and writes,
//! which memory bytes it touches, and where control goes next. Values are not modelled.

use serde::{Deserialize, Serialize};

use super::op_class::OpClass;
use crate::common::{Addr, ArchReg, Fault};

/// Default instruction size in bytes.
const DEFAULT_INST_SIZE: u8 = 4;

/// Control-flow category of a branch or jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Conditional branch with a PC-relative target.
    CondDirect,
    /// Unconditional jump with a PC-relative target.
    UncondDirect,
    /// Jump through a register.
    Indirect,
    /// Direct call (pushes the return address).
    Call,
    /// Function return (pops the return address).
    Return,
}

impl ControlKind {
    /// True when the target is encoded in the instruction, so decode can verify it.
    pub const fn is_direct(self) -> bool {
        matches!(self, Self::CondDirect | Self::UncondDirect | Self::Call)
    }

    /// True when the instruction always transfers control.
    pub const fn is_unconditional(self) -> bool {
        !matches!(self, Self::CondDirect)
    }
}

/// Resolved control-flow behaviour of a branch on the committed path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInfo {
    /// Branch category.
    pub kind: ControlKind,
    /// Whether the branch is taken on the committed path.
    pub taken: bool,
    /// Taken target.
    pub target: Addr,
}

/// A memory reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemAccess {
    /// Effective byte address.
    pub addr: Addr,
    /// Access size in bytes.
    pub size: u8,
}

impl MemAccess {
    /// Last byte touched by the access (inclusive).
    #[inline]
    pub const fn end(&self) -> Addr {
        self.addr + self.size.saturating_sub(1) as Addr
    }
}

/// A pre-decoded micro-op.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticInst {
    /// Program counter.
    pub pc: Addr,
    /// Instruction size in bytes.
    #[serde(default = "StaticInst::default_size")]
    pub size: u8,
    /// Functional-unit class.
    pub op_class: OpClass,
    /// Source registers.
    #[serde(default)]
    pub srcs: Vec<ArchReg>,
    /// Destination registers.
    #[serde(default)]
    pub dests: Vec<ArchReg>,
    /// Memory reference for loads and stores.
    #[serde(default)]
    pub mem: Option<MemAccess>,
    /// Control-flow outcome for branches.
    #[serde(default)]
    pub control: Option<ControlInfo>,
    /// Architectural fault raised by this micro-op.
    #[serde(default)]
    pub fault: Option<Fault>,
    /// Must wait for all older micro-ops to commit before rename.
    #[serde(default)]
    pub serializing: bool,
}

impl StaticInst {
    fn default_size() -> u8 {
        DEFAULT_INST_SIZE
    }

    /// Creates a micro-op of `op_class` at `pc` with no operands.
    pub const fn new(pc: Addr, op_class: OpClass) -> Self {
        Self {
            pc,
            size: DEFAULT_INST_SIZE,
            op_class,
            srcs: Vec::new(),
            dests: Vec::new(),
            mem: None,
            control: None,
            fault: None,
            serializing: false,
        }
    }

    /// A no-op at `pc`.
    pub const fn nop(pc: Addr) -> Self {
        Self::new(pc, OpClass::Nop)
    }

    /// An integer ALU operation at `pc`.
    pub const fn alu(pc: Addr) -> Self {
        Self::new(pc, OpClass::IntAlu)
    }

    /// A load of `size` bytes from `addr`.
    pub fn load(pc: Addr, addr: Addr, size: u8) -> Self {
        let mut inst = Self::new(pc, OpClass::MemRead);
        inst.mem = Some(MemAccess { addr, size });
        inst
    }

    /// A store of `size` bytes to `addr`.
    pub fn store(pc: Addr, addr: Addr, size: u8) -> Self {
        let mut inst = Self::new(pc, OpClass::MemWrite);
        inst.mem = Some(MemAccess { addr, size });
        inst
    }

    /// A branch of `kind` with the given committed-path outcome.
    pub fn branch(pc: Addr, kind: ControlKind, taken: bool, target: Addr) -> Self {
        let mut inst = Self::new(pc, OpClass::IntAlu);
        inst.control = Some(ControlInfo {
            kind,
            taken,
            target,
        });
        inst
    }

    /// Replaces the source registers.
    #[must_use]
    pub fn with_srcs(mut self, srcs: impl IntoIterator<Item = ArchReg>) -> Self {
        self.srcs = srcs.into_iter().collect();
        self
    }

    /// Replaces the destination registers.
    #[must_use]
    pub fn with_dests(mut self, dests: impl IntoIterator<Item = ArchReg>) -> Self {
        self.dests = dests.into_iter().collect();
        self
    }

    /// Attaches an architectural fault.
    #[must_use]
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Marks the micro-op as serializing.
    #[must_use]
    pub fn serializing(mut self) -> Self {
        self.serializing = true;
        self
    }

    /// PC of the sequentially next instruction.
    #[inline]
    pub const fn fallthrough(&self) -> Addr {
        self.pc + self.size as Addr
    }

    /// PC of the next instruction on the committed path.
    pub const fn next_pc(&self) -> Addr {
        match self.control {
            Some(ControlInfo {
                taken: true,
                target,
                ..
            }) => target,
            _ => self.fallthrough(),
        }
    }

    /// True for loads.
    #[inline]
    pub const fn is_load(&self) -> bool {
        self.op_class.is_load()
    }

    /// True for stores.
    #[inline]
    pub const fn is_store(&self) -> bool {
        self.op_class.is_store()
    }

    /// True for branches and jumps.
    #[inline]
    pub const fn is_control(&self) -> bool {
        self.control.is_some()
    }
}
