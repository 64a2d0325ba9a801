//! Memory controller implementations for latency modeling.
//!
//! This module provides:
//! 1. **SimpleController:** Fixed latency per access (no bank or row modeling).
//! 2. **DramController:** Banked DRAM with open-page row buffers, `tRAS`-constrained
//!    precharge, a shared data bus, and periodic refresh.
//!
//! A controller is asked when a request arriving at cycle `now` will have its data back.
//! Requests are scheduled in arrival order and every bank and the data bus only move
//! forward in time, so completions to one bank never overtake each other.

use crate::common::{Addr, Cycle};
use crate::config::{Config, DramTiming, MemoryController as ControllerKind};
use crate::stats::DramStats;

/// Trait for memory controller implementations.
///
/// Implementors must be `Send + Sync` so a simulator can be moved across threads.
pub trait MemoryController: Send + Sync + std::fmt::Debug {
    /// Schedules an access that arrives at `now`.
    ///
    /// # Arguments
    ///
    /// * `addr` - Line-aligned physical address.
    /// * `is_write` - True for write-backs.
    /// * `now` - Arrival cycle at the controller.
    ///
    /// # Returns
    ///
    /// The cycle at which the response leaves the controller.
    fn access(&mut self, addr: Addr, is_write: bool, now: Cycle) -> Cycle;

    /// Counters accumulated so far.
    fn stats(&self) -> &DramStats;
}

/// Builds the controller selected by the configuration.
pub fn build_controller(config: &Config) -> Box<dyn MemoryController> {
    match config.memory.controller {
        ControllerKind::Simple => Box::new(SimpleController::new(config.memory.simple_latency)),
        ControllerKind::Dram => Box::new(DramController::new(config, &config.memory.dram)),
    }
}

/// Fixed-latency memory controller; every access takes the same number of cycles.
#[derive(Debug)]
pub struct SimpleController {
    latency: u64,
    stats: DramStats,
}

impl SimpleController {
    /// Creates a simple controller with the given fixed latency in cycles.
    pub fn new(latency: u64) -> Self {
        Self {
            latency,
            stats: DramStats::default(),
        }
    }
}

impl MemoryController for SimpleController {
    fn access(&mut self, _addr: Addr, is_write: bool, now: Cycle) -> Cycle {
        if is_write {
            self.stats.writes += 1;
        } else {
            self.stats.reads += 1;
        }
        now + self.latency
    }

    fn stats(&self) -> &DramStats {
        &self.stats
    }
}

/// DRAM timing converted to core cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Timing {
    t_rcd: u64,
    t_cl: u64,
    t_rp: u64,
    t_ras: u64,
    t_burst: u64,
    t_refi: u64,
    t_rfc: u64,
    frontend: u64,
    backend: u64,
}

#[derive(Clone, Copy, Debug, Default)]
struct Bank {
    open_row: Option<u64>,
    /// Earliest cycle the bank accepts its next command.
    ready_at: Cycle,
    /// Cycle of the last activate (bounds the next precharge by `tRAS`).
    activated_at: Cycle,
}

/// DRAM controller with per-bank row buffers (open-page policy).
#[derive(Debug)]
pub struct DramController {
    timing: Timing,
    banks: Vec<Bank>,
    row_buffer_bytes: u64,
    bus_free_at: Cycle,
    next_refresh_at: Cycle,
    stats: DramStats,
}

impl DramController {
    /// Creates a controller with all rows closed; timings are converted with the core clock.
    pub fn new(config: &Config, dram: &DramTiming) -> Self {
        let cyc = |ps| config.ps_to_cycles(ps);
        let timing = Timing {
            t_rcd: cyc(dram.t_rcd_ps),
            t_cl: cyc(dram.t_cl_ps),
            t_rp: cyc(dram.t_rp_ps),
            t_ras: cyc(dram.t_ras_ps),
            t_burst: cyc(dram.t_burst_ps).max(1),
            t_refi: cyc(dram.t_refi_ps).max(1),
            t_rfc: cyc(dram.t_rfc_ps),
            frontend: cyc(dram.frontend_latency_ps),
            backend: cyc(dram.backend_latency_ps),
        };
        Self {
            timing,
            banks: vec![Bank::default(); (dram.ranks * dram.banks_per_rank).max(1)],
            row_buffer_bytes: dram.row_buffer_bytes,
            bus_free_at: 0,
            next_refresh_at: timing.t_refi,
            stats: DramStats::default(),
        }
    }

    /// Maps an address to (bank, row): consecutive row-buffer-sized chunks interleave across banks.
    const fn map(&self, addr: Addr) -> (usize, u64) {
        let chunk = addr / self.row_buffer_bytes;
        let banks = self.banks.len() as u64;
        ((chunk % banks) as usize, chunk / banks)
    }

    /// Performs every refresh due by `t`: all banks close their rows and stall for `tRFC`.
    fn refresh_until(&mut self, t: Cycle) {
        while self.next_refresh_at <= t {
            let end = self.next_refresh_at + self.timing.t_rfc;
            for bank in &mut self.banks {
                bank.open_row = None;
                bank.ready_at = bank.ready_at.max(end);
            }
            self.stats.refreshes += 1;
            self.next_refresh_at += self.timing.t_refi;
        }
    }
}

impl MemoryController for DramController {
    fn access(&mut self, addr: Addr, is_write: bool, now: Cycle) -> Cycle {
        let t = self.timing;
        let arrive = now + t.frontend;
        self.refresh_until(arrive);

        let (bank_idx, row) = self.map(addr);
        let bank = &mut self.banks[bank_idx];
        let start = arrive.max(bank.ready_at);

        let column_at = match bank.open_row {
            Some(open) if open == row => {
                self.stats.row_hits += 1;
                start
            }
            Some(_) => {
                self.stats.row_misses += 1;
                let precharge_at = start.max(bank.activated_at + t.t_ras);
                let activate_at = precharge_at + t.t_rp;
                bank.activated_at = activate_at;
                activate_at + t.t_rcd
            }
            None => {
                self.stats.row_misses += 1;
                bank.activated_at = start;
                start + t.t_rcd
            }
        };
        bank.open_row = Some(row);
        bank.ready_at = column_at + t.t_burst;

        let data_at = (column_at + t.t_cl).max(self.bus_free_at);
        self.bus_free_at = data_at + t.t_burst;

        if is_write {
            self.stats.writes += 1;
        } else {
            self.stats.reads += 1;
        }
        data_at + t.t_burst + t.backend
    }

    fn stats(&self) -> &DramStats {
        &self.stats
    }
}
