//! Functional-unit pool.
//!
//! Holds the catalogue of execution units and their occupancy. Each group of identical
//! units has its own scheduler port: per cycle at most `issue_width` micro-ops may issue to a
//! group. Writeback is shared by the whole stage: at most `wb_width` results per cycle, from
//! any mix of groups and memory operations. A unit accepts a new
//! micro-op once the previous one's issue latency has elapsed; pipelined operations
//! (issue latency 1) free the unit on the next cycle.

use crate::common::Cycle;
use crate::config::FuPoolConfig;
use crate::isa::OpClass;

/// Why an issue attempt was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuRefusal {
    /// No unit in the pool executes this operation class.
    Incapable,
    /// Every capable unit is occupied or its group's issue port is used up this cycle.
    Busy,
}

/// A successful issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuGrant {
    /// Group that accepted the micro-op.
    pub group: usize,
    /// Cycles until the result is available.
    pub latency: u64,
}

#[derive(Debug)]
struct FuGroup {
    name: String,
    busy_until: Vec<Cycle>,
    issued: usize,
}

/// Capability of one group for one operation class.
#[derive(Debug, Clone, Copy)]
struct Capability {
    group: usize,
    latency: u64,
    issue_latency: u64,
}

/// The pool of functional units.
#[derive(Debug)]
pub struct FuPool {
    groups: Vec<FuGroup>,
    by_class: Vec<Vec<Capability>>,
    issue_width: usize,
    wb_width: usize,
    written_back: usize,
}

impl FuPool {
    /// Builds the pool from its configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Unit catalogue
    /// * `issue_width` - Micro-ops a group may accept per cycle
    /// * `wb_width` - Results the stage may write back per cycle
    pub fn new(config: &FuPoolConfig, issue_width: usize, wb_width: usize) -> Self {
        let mut groups = Vec::new();
        let mut by_class = vec![Vec::new(); OpClass::COUNT];
        for (group, desc) in config.units().into_iter().enumerate() {
            for op in &desc.ops {
                by_class[op.op_class.index()].push(Capability {
                    group,
                    latency: op.latency,
                    issue_latency: op.issue_latency,
                });
            }
            groups.push(FuGroup {
                name: desc.name,
                busy_until: vec![0; desc.count],
                issued: 0,
            });
        }
        Self {
            groups,
            by_class,
            issue_width,
            wb_width,
            written_back: 0,
        }
    }

    /// Resets the per-cycle issue and writeback port counters.
    pub fn begin_cycle(&mut self) {
        for g in &mut self.groups {
            g.issued = 0;
        }
        self.written_back = 0;
    }

    /// True if some unit can execute `op`.
    pub fn is_capable(&self, op: OpClass) -> bool {
        !self.by_class[op.index()].is_empty()
    }

    /// Execution latency of `op` on the first capable group.
    pub fn latency(&self, op: OpClass) -> Option<u64> {
        self.by_class[op.index()].first().map(|c| c.latency)
    }

    /// Tries to start `op` on a free unit at cycle `now`.
    pub fn try_issue(&mut self, op: OpClass, now: Cycle) -> Result<FuGrant, FuRefusal> {
        let caps = &self.by_class[op.index()];
        if caps.is_empty() {
            return Err(FuRefusal::Incapable);
        }
        for cap in caps {
            let group = &mut self.groups[cap.group];
            if group.issued >= self.issue_width {
                continue;
            }
            if let Some(unit) = group.busy_until.iter_mut().find(|b| **b <= now) {
                *unit = now + cap.issue_latency;
                group.issued += 1;
                return Ok(FuGrant {
                    group: cap.group,
                    latency: cap.latency,
                });
            }
        }
        Err(FuRefusal::Busy)
    }

    /// Claims one of this cycle's writeback slots.
    pub const fn try_writeback(&mut self) -> bool {
        if self.written_back < self.wb_width {
            self.written_back += 1;
            true
        } else {
            false
        }
    }

    /// Group names, in group order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }
}
