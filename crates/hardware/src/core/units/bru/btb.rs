//! Branch Target Buffer (BTB).
//!
//! Direct-mapped table of taken-branch targets, consulted at fetch before the control
//! instruction reaches decode. Entries are tagged with the PC bits above the index so two
//! branches that share a slot never hand each other's target back.

use crate::common::Addr;

/// Instruction alignment shift applied before indexing.
const ALIGN_SHIFT: u32 = 2;

#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    tag: Addr,
    target: Addr,
    valid: bool,
}

/// Branch Target Buffer.
#[derive(Clone, Debug)]
pub struct Btb {
    slots: Vec<Slot>,
    index_bits: u32,
}

impl Btb {
    /// Creates a BTB with `entries` slots (a power of two).
    pub fn new(entries: usize) -> Self {
        let entries = entries.max(1).next_power_of_two();
        Self {
            slots: vec![Slot::default(); entries],
            index_bits: entries.trailing_zeros(),
        }
    }

    #[inline]
    fn split(&self, pc: Addr) -> (usize, Addr) {
        let word = pc >> ALIGN_SHIFT;
        let index = (word & ((1 << self.index_bits) - 1)) as usize;
        (index, word >> self.index_bits)
    }

    /// The cached target of the branch at `pc`, if it owns its slot.
    pub fn lookup(&self, pc: Addr) -> Option<Addr> {
        let (index, tag) = self.split(pc);
        let slot = self.slots[index];
        (slot.valid && slot.tag == tag).then_some(slot.target)
    }

    /// Installs `target` for the branch at `pc`, displacing whatever shared the slot.
    pub fn update(&mut self, pc: Addr, target: Addr) {
        let (index, tag) = self.split(pc);
        self.slots[index] = Slot {
            tag,
            target,
            valid: true,
        };
    }
}
