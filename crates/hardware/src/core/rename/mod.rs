//! Register renaming.
//!
//! Maps each thread's architectural registers to physical registers, one independently sized
//! physical file per register class. It provides:
//! 1. **Rename:** Sources are read from the current map before destinations are remapped, so
//!    an operation that reads its own destination sees the previous producer.
//! 2. **History:** Every remap is recorded as `(seq, arch, new, prev)`.
//! 3. **Commit:** Frees `prev`; every reader of it is older than the committing writer.
//! 4. **Squash:** Walks the history youngest first, restoring `prev` and freeing `new`.

/// Per-class physical register free lists.
pub mod free_list;

use std::collections::VecDeque;

use self::free_list::FreeList;
use crate::common::{ArchReg, PhysRegId, RegClass, SeqNum, ThreadId};
use crate::config::ResourceConfig;

/// One recorded remap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenameHistoryEntry {
    /// Micro-op that performed the remap.
    pub seq: SeqNum,
    /// Architectural register remapped.
    pub arch: ArchReg,
    /// Register allocated for the new value.
    pub new: PhysRegId,
    /// Mapping before the remap.
    pub prev: PhysRegId,
}

/// Result of renaming one micro-op.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Renamed {
    /// Physical source registers, in operand order.
    pub srcs: Vec<PhysRegId>,
    /// Newly allocated destination registers, in operand order.
    pub dests: Vec<PhysRegId>,
}

/// Architectural-to-physical map of one thread.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RenameMap {
    classes: [Vec<PhysRegId>; RegClass::COUNT],
}

impl RenameMap {
    fn lookup(&self, arch: ArchReg) -> PhysRegId {
        self.classes[arch.class.index()][usize::from(arch.index)]
    }

    fn set(&mut self, arch: ArchReg, reg: PhysRegId) {
        self.classes[arch.class.index()][usize::from(arch.index)] = reg;
    }
}

/// Rename maps, histories, and the shared free lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Renamer {
    free_list: FreeList,
    maps: Vec<RenameMap>,
    history: Vec<VecDeque<RenameHistoryEntry>>,
}

impl Renamer {
    /// Builds the initial state: thread `t`'s register `i` of class `c` maps to physical
    /// register `t * arch(c) + i`, and everything above is free.
    ///
    /// The configuration is assumed validated (enough physical registers per class).
    pub fn new(resources: &ResourceConfig, threads: usize) -> Self {
        let sizes = RegClass::ALL.map(|c| resources.phys_regs(c));
        let reserved = RegClass::ALL.map(|c| threads * c.num_arch_regs());
        let maps = (0..threads)
            .map(|tid| RenameMap {
                classes: RegClass::ALL.map(|class| {
                    let arch = class.num_arch_regs();
                    (0..arch)
                        .map(|i| PhysRegId {
                            class,
                            index: (tid * arch + i) as u32,
                        })
                        .collect()
                }),
            })
            .collect();
        Self {
            free_list: FreeList::new(sizes, reserved),
            maps,
            history: vec![VecDeque::new(); threads],
        }
    }

    /// Free registers of `class`.
    pub fn available(&self, class: RegClass) -> usize {
        self.free_list.available(class)
    }

    /// True if there are enough free registers for every destination in `dests`.
    pub fn can_rename(&self, dests: &[ArchReg]) -> bool {
        RegClass::ALL.iter().all(|&class| {
            dests.iter().filter(|d| d.class == class).count() <= self.available(class)
        })
    }

    /// Current mapping of `arch` in thread `tid`.
    pub fn lookup(&self, tid: ThreadId, arch: ArchReg) -> PhysRegId {
        self.maps[tid].lookup(arch)
    }

    /// Renames one micro-op.
    ///
    /// # Returns
    ///
    /// `None`, with no state changed, if some destination class has no free register.
    pub fn rename(
        &mut self,
        tid: ThreadId,
        seq: SeqNum,
        srcs: &[ArchReg],
        dests: &[ArchReg],
    ) -> Option<Renamed> {
        if !self.can_rename(dests) {
            return None;
        }
        let srcs = srcs.iter().map(|&a| self.maps[tid].lookup(a)).collect();
        let mut renamed = Renamed {
            srcs,
            dests: Vec::with_capacity(dests.len()),
        };
        for &arch in dests {
            let new = self.free_list.alloc(arch.class)?;
            let prev = self.maps[tid].lookup(arch);
            self.maps[tid].set(arch, new);
            self.history[tid].push_back(RenameHistoryEntry {
                seq,
                arch,
                new,
                prev,
            });
            renamed.dests.push(new);
        }
        Some(renamed)
    }

    /// Retires the remaps made by `seq`, freeing the registers they replaced.
    pub fn commit(&mut self, tid: ThreadId, seq: SeqNum) {
        while let Some(entry) = self.history[tid].front() {
            if entry.seq > seq {
                break;
            }
            let prev = entry.prev;
            self.history[tid].pop_front();
            self.free_list.free(prev);
        }
    }

    /// Undoes every remap made by micro-ops of `tid` with `seq >= from`, youngest first.
    ///
    /// # Returns
    ///
    /// The number of remaps undone.
    pub fn squash(&mut self, tid: ThreadId, from: SeqNum) -> usize {
        let mut undone = 0;
        while let Some(entry) = self.history[tid].back().copied() {
            if entry.seq < from {
                break;
            }
            self.history[tid].pop_back();
            self.maps[tid].set(entry.arch, entry.prev);
            self.free_list.free(entry.new);
            undone += 1;
        }
        undone
    }

    /// Registers currently reachable: every thread's map plus every `prev` still awaiting
    /// its writer's commit.
    pub fn live_regs(&self) -> Vec<PhysRegId> {
        let mapped = self
            .maps
            .iter()
            .flat_map(|m| m.classes.iter().flatten().copied());
        let pending = self.history.iter().flatten().map(|e| e.prev);
        mapped.chain(pending).collect()
    }

    /// Every free register.
    pub fn free_regs(&self) -> Vec<PhysRegId> {
        self.free_list.iter().collect()
    }

    /// Remaps not yet committed, per thread.
    pub fn history_len(&self, tid: ThreadId) -> usize {
        self.history[tid].len()
    }
}
