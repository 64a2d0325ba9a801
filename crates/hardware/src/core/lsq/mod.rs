//! Load/Store Queue (LSQ) and memory ordering.
//!
//! Tracks every in-flight load and store per thread in program order. It provides:
//! 1. **Allocation:** Rename allocates an LQ or SQ entry; the queues are bounded by
//!    `lq_entries`/`sq_entries` and the SMT partitioning policy.
//! 2. **Forwarding:** An executing load takes its data from the youngest older store that
//!    fully covers it; a partial overlap makes the load replay.
//! 3. **Violation detection:** When a store's address resolves, any younger load to an
//!    overlapping address (compared after `dep_check_shift`) that already executed has read
//!    stale data and must be squashed. With `check_loads` (always under TSO), loads also
//!    check younger executed loads whose line was snooped away.
//! 4. **Drain:** Committed stores stay in the SQ until the L1D accepts them.

/// Memory dependence unit.
pub mod mem_dep;

/// Store-set predictor tables.
pub mod store_set;

use std::collections::VecDeque;

use crate::common::{Addr, SeqNum, ThreadId};
use crate::config::Config;
use crate::core::pipeline::smt::thread_limit;
use crate::isa::MemAccess;

/// One load or store in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LsqEntry {
    /// Sequence number of the micro-op.
    pub seq: SeqNum,
    /// PC of the micro-op.
    pub pc: Addr,
    /// Resolved access; `None` until the micro-op executes.
    pub access: Option<MemAccess>,
    /// Loads: data has been obtained. Stores: address is resolved.
    pub executed: bool,
    /// The line a load read was invalidated while the load was in flight.
    pub possible_violation: bool,
    /// Stores: retired by commit and waiting to drain.
    pub committed: bool,
}

impl LsqEntry {
    fn new(seq: SeqNum, pc: Addr) -> Self {
        Self {
            seq,
            pc,
            access: None,
            executed: false,
            possible_violation: false,
            committed: false,
        }
    }
}

/// Outcome of executing a load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadResolution {
    /// Data comes from the older store with this sequence number.
    Forwarded(SeqNum),
    /// An older store overlaps only part of the load; retry later.
    Replay(SeqNum),
    /// No older store covers the load; read the cache.
    Access,
}

/// A detected ordering violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Violation {
    /// The load that read stale data; it and everything younger must be squashed.
    pub load: SeqNum,
    /// PC of that load.
    pub load_pc: Addr,
    /// PC of the operation that exposed it.
    pub by_pc: Addr,
}

/// Per-thread load and store queues.
#[derive(Clone, Debug)]
pub struct LoadStoreQueue {
    loads: Vec<VecDeque<LsqEntry>>,
    stores: Vec<VecDeque<LsqEntry>>,
    lq_capacity: usize,
    sq_capacity: usize,
    lq_limit: usize,
    sq_limit: usize,
    dep_check_shift: u32,
    check_loads: bool,
    needs_tso: bool,
}

impl LoadStoreQueue {
    /// Creates empty queues.
    pub fn new(config: &Config) -> Self {
        let threads = config.general.num_threads;
        let lsq = &config.lsq;
        let smt = &config.smt;
        Self {
            loads: vec![VecDeque::new(); threads],
            stores: vec![VecDeque::new(); threads],
            lq_capacity: lsq.lq_entries,
            sq_capacity: lsq.sq_entries,
            lq_limit: thread_limit(smt.lsq_policy, smt.lsq_threshold, lsq.lq_entries, threads),
            sq_limit: thread_limit(smt.lsq_policy, smt.lsq_threshold, lsq.sq_entries, threads),
            dep_check_shift: lsq.dep_check_shift,
            check_loads: lsq.check_loads || lsq.needs_tso,
            needs_tso: lsq.needs_tso,
        }
    }

    /// True under total store order.
    pub const fn needs_tso(&self) -> bool {
        self.needs_tso
    }

    /// True if thread `tid` can allocate a load.
    pub fn can_insert_load(&self, tid: ThreadId) -> bool {
        let total: usize = self.loads.iter().map(VecDeque::len).sum();
        total < self.lq_capacity && self.loads[tid].len() < self.lq_limit
    }

    /// True if thread `tid` can allocate a store.
    pub fn can_insert_store(&self, tid: ThreadId) -> bool {
        let total: usize = self.stores.iter().map(VecDeque::len).sum();
        total < self.sq_capacity && self.stores[tid].len() < self.sq_limit
    }

    /// Allocates an LQ entry; the caller checks `can_insert_load` first.
    pub fn insert_load(&mut self, tid: ThreadId, seq: SeqNum, pc: Addr) {
        self.loads[tid].push_back(LsqEntry::new(seq, pc));
    }

    /// Allocates an SQ entry; the caller checks `can_insert_store` first.
    pub fn insert_store(&mut self, tid: ThreadId, seq: SeqNum, pc: Addr) {
        self.stores[tid].push_back(LsqEntry::new(seq, pc));
    }

    /// Address granules `[first, last]` an access covers.
    fn granules(&self, access: &MemAccess) -> (Addr, Addr) {
        (
            access.addr >> self.dep_check_shift,
            access.end() >> self.dep_check_shift,
        )
    }

    fn overlaps(&self, a: &MemAccess, b: &MemAccess) -> bool {
        let (a0, a1) = self.granules(a);
        let (b0, b1) = self.granules(b);
        a0 <= b1 && b0 <= a1
    }

    /// Executes the load `seq` with its resolved access.
    ///
    /// # Returns
    ///
    /// How the load obtains its data, and a load-load violation it exposed, if any.
    pub fn execute_load(
        &mut self,
        tid: ThreadId,
        seq: SeqNum,
        access: MemAccess,
    ) -> (LoadResolution, Option<Violation>) {
        // Youngest older store with a resolved, byte-overlapping address.
        let older_store = self.stores[tid]
            .iter()
            .rev()
            .filter(|s| s.seq < seq)
            .find_map(|s| {
                let a = s.access?;
                (s.executed && a.addr <= access.end() && access.addr <= a.end()).then_some((s.seq, a))
            });
        let resolution = match older_store {
            Some((store, a)) if a.addr <= access.addr && access.end() <= a.end() => {
                LoadResolution::Forwarded(store)
            }
            Some((store, _)) => return (LoadResolution::Replay(store), None),
            None => LoadResolution::Access,
        };

        let violation = if self.check_loads {
            self.loads[tid]
                .iter()
                .filter(|l| l.seq > seq && l.executed && l.possible_violation)
                .find(|l| l.access.is_some_and(|a| self.overlaps(&a, &access)))
                .map(|l| Violation {
                    load: l.seq,
                    load_pc: l.pc,
                    by_pc: self.pc_of_load(tid, seq),
                })
        } else {
            None
        };

        if let Some(entry) = self.loads[tid].iter_mut().find(|l| l.seq == seq) {
            entry.access = Some(access);
            entry.executed = true;
        }
        (resolution, violation)
    }

    fn pc_of_load(&self, tid: ThreadId, seq: SeqNum) -> Addr {
        self.loads[tid]
            .iter()
            .find(|l| l.seq == seq)
            .map_or(0, |l| l.pc)
    }

    /// Resolves the address of store `seq` and checks younger loads.
    ///
    /// # Returns
    ///
    /// The oldest younger load that already executed against an overlapping address.
    pub fn execute_store(
        &mut self,
        tid: ThreadId,
        seq: SeqNum,
        access: MemAccess,
    ) -> Option<Violation> {
        let store_pc = self.stores[tid].iter_mut().find(|s| s.seq == seq).map(|s| {
            s.access = Some(access);
            s.executed = true;
            s.pc
        })?;
        self.loads[tid]
            .iter()
            .filter(|l| l.seq > seq && l.executed)
            .find(|l| l.access.is_some_and(|a| self.overlaps(&a, &access)))
            .map(|l| Violation {
                load: l.seq,
                load_pc: l.pc,
                by_pc: store_pc,
            })
    }

    /// Marks executed loads that read `line` as possibly stale.
    pub fn snoop(&mut self, line: Addr, line_bytes: u64) {
        for entry in self.loads.iter_mut().flatten() {
            if entry.executed
                && entry
                    .access
                    .is_some_and(|a| a.addr & !(line_bytes - 1) == line)
            {
                entry.possible_violation = true;
            }
        }
    }

    /// Retires the load at the head of thread `tid`'s LQ.
    pub fn commit_load(&mut self, tid: ThreadId, seq: SeqNum) {
        if self.loads[tid].front().is_some_and(|l| l.seq == seq) {
            self.loads[tid].pop_front();
        }
    }

    /// Marks every store of `tid` up to `done` as committed.
    pub fn commit_stores_upto(&mut self, tid: ThreadId, done: SeqNum) {
        for store in self.stores[tid].iter_mut().take_while(|s| s.seq <= done) {
            store.committed = true;
        }
    }

    /// The oldest committed store of `tid`, if it is ready to drain.
    pub fn drain_candidate(&self, tid: ThreadId) -> Option<&LsqEntry> {
        self.stores[tid].front().filter(|s| s.committed)
    }

    /// Removes the head store of `tid` after the cache accepted it.
    pub fn store_written(&mut self, tid: ThreadId) -> Option<LsqEntry> {
        self.stores[tid].pop_front()
    }

    /// Removes every uncommitted entry of `tid` with `seq >= from`.
    pub fn squash(&mut self, tid: ThreadId, from: SeqNum) {
        while self.loads[tid].back().is_some_and(|l| l.seq >= from) {
            self.loads[tid].pop_back();
        }
        while self.stores[tid]
            .back()
            .is_some_and(|s| s.seq >= from && !s.committed)
        {
            self.stores[tid].pop_back();
        }
    }

    /// Loads and stores held by `tid`.
    pub fn thread_count(&self, tid: ThreadId) -> usize {
        self.loads[tid].len() + self.stores[tid].len()
    }

    /// Stores of `tid` still in the SQ (including committed ones awaiting drain).
    pub fn store_count(&self, tid: ThreadId) -> usize {
        self.stores[tid].len()
    }

    /// Sequence numbers of every entry of `tid`, loads then stores.
    pub fn thread_entries(&self, tid: ThreadId) -> (Vec<SeqNum>, Vec<SeqNum>) {
        (
            self.loads[tid].iter().map(|l| l.seq).collect(),
            self.stores[tid].iter().map(|s| s.seq).collect(),
        )
    }

    /// True if every queue is empty.
    pub fn is_empty(&self) -> bool {
        self.loads.iter().all(VecDeque::is_empty) && self.stores.iter().all(VecDeque::is_empty)
    }
}
