//! Per-class physical register free lists.

use std::collections::VecDeque;

use crate::common::{PhysRegId, RegClass};

/// Free physical registers of every register class.
///
/// Registers are handed out in FIFO order so a freed register is reused as late as possible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeList {
    classes: [VecDeque<u32>; RegClass::COUNT],
}

impl FreeList {
    /// Creates a free list holding registers `reserved[c]..sizes[c]` of each class.
    ///
    /// The first `reserved[c]` registers of a class hold the initial architectural state.
    pub fn new(sizes: [usize; RegClass::COUNT], reserved: [usize; RegClass::COUNT]) -> Self {
        let classes = std::array::from_fn(|c| (reserved[c] as u32..sizes[c] as u32).collect());
        Self { classes }
    }

    /// Number of free registers of `class`.
    #[inline]
    pub fn available(&self, class: RegClass) -> usize {
        self.classes[class.index()].len()
    }

    /// Takes a free register of `class`.
    pub fn alloc(&mut self, class: RegClass) -> Option<PhysRegId> {
        self.classes[class.index()]
            .pop_front()
            .map(|index| PhysRegId { class, index })
    }

    /// Returns `reg` to its class's free list.
    pub fn free(&mut self, reg: PhysRegId) {
        self.classes[reg.class.index()].push_back(reg.index);
    }

    /// Iterates over every free register.
    pub fn iter(&self) -> impl Iterator<Item = PhysRegId> + '_ {
        RegClass::ALL.into_iter().flat_map(move |class| {
            self.classes[class.index()]
                .iter()
                .map(move |&index| PhysRegId { class, index })
        })
    }
}
