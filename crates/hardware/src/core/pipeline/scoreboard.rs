//! Physical register scoreboard.
//!
//! One ready bit per physical register of every class. Rename clears the bit of each newly
//! allocated destination; writeback sets it, which wakes up every waiting reader. Registers
//! holding the initial architectural state start ready.

use crate::common::{PhysRegId, RegClass};
use crate::config::ResourceConfig;

/// Ready bits for every physical register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scoreboard {
    ready: [Vec<bool>; RegClass::COUNT],
}

impl Scoreboard {
    /// Creates a scoreboard with every register ready.
    pub fn new(resources: &ResourceConfig) -> Self {
        Self {
            ready: RegClass::ALL.map(|c| vec![true; resources.phys_regs(c)]),
        }
    }

    /// True if `reg` holds its value.
    #[inline]
    pub fn is_ready(&self, reg: PhysRegId) -> bool {
        self.ready[reg.class.index()]
            .get(reg.index as usize)
            .copied()
            .unwrap_or(true)
    }

    /// True if every register in `regs` is ready.
    pub fn all_ready(&self, regs: &[PhysRegId]) -> bool {
        regs.iter().all(|&r| self.is_ready(r))
    }

    /// Marks `reg` as awaiting its producer.
    pub fn set_not_ready(&mut self, reg: PhysRegId) {
        if let Some(bit) = self.ready[reg.class.index()].get_mut(reg.index as usize) {
            *bit = false;
        }
    }

    /// Marks `reg` as written.
    pub fn set_ready(&mut self, reg: PhysRegId) {
        if let Some(bit) = self.ready[reg.class.index()].get_mut(reg.index as usize) {
            *bit = true;
        }
    }
}
