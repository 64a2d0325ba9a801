//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the out-of-order core. It provides:
//! 1. **Cycle and IPC:** Total cycles, committed micro-ops (overall and per thread), and derived IPC/CPI.
//! 2. **Pipeline activity:** Micro-ops fetched, decoded, renamed, dispatched, issued, and committed,
//!    plus the commit-width histogram.
//! 3. **Speculation:** Squashes by cause, branch mispredictions, memory-order violations, and traps.
//! 4. **Stalls:** Rename stall cycles per exhausted resource and cache port contention.
//! 5. **Memory hierarchy:** Hit/miss/MSHR counts per cache level and DRAM row-buffer behaviour.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::isa::OpClass;

/// Why the pipeline was squashed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SquashCause {
    /// Execute resolved a branch to a different next PC than predicted.
    BranchMispredict,
    /// Decode found a direct jump whose predicted target was wrong.
    DecodeRedirect,
    /// A load executed before an older store (or load) to the same address.
    MemoryOrder,
    /// A faulting micro-op reached the head of the reorder buffer.
    Fault,
}

/// Squash counts per cause.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SquashStats {
    /// Branch mispredictions resolved in execute.
    pub branch_mispredict: u64,
    /// Early redirects from decode.
    pub decode_redirect: u64,
    /// Memory-order violations.
    pub memory_order: u64,
    /// Faults taken at commit.
    pub fault: u64,
    /// Micro-ops removed by squashes.
    pub squashed_insts: u64,
}

impl SquashStats {
    /// Counts one squash of `cause`.
    pub const fn record(&mut self, cause: SquashCause) {
        match cause {
            SquashCause::BranchMispredict => self.branch_mispredict += 1,
            SquashCause::DecodeRedirect => self.decode_redirect += 1,
            SquashCause::MemoryOrder => self.memory_order += 1,
            SquashCause::Fault => self.fault += 1,
        }
    }

    /// Total squashes of every cause.
    pub const fn total(&self) -> u64 {
        self.branch_mispredict + self.decode_redirect + self.memory_order + self.fault
    }
}

/// Rename stall cycles, per resource that blocked rename.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenameStalls {
    /// Reorder buffer (or the thread's share of it) full.
    pub rob_full: u64,
    /// Instruction queue full.
    pub iq_full: u64,
    /// Load queue full.
    pub lq_full: u64,
    /// Store queue full.
    pub sq_full: u64,
    /// A physical register free list was empty.
    pub no_free_regs: u64,
    /// A serializing micro-op waited for the reorder buffer to drain.
    pub serialize: u64,
    /// Blocked by a later stage.
    pub backpressure: u64,
}

/// Access counts for one cache level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Demand accesses that hit.
    pub hits: u64,
    /// Demand accesses that missed and allocated an MSHR.
    pub misses: u64,
    /// Misses that merged into an already outstanding MSHR.
    pub mshr_merges: u64,
    /// Requests refused because every MSHR was busy.
    pub mshr_full: u64,
    /// Dirty lines written back on eviction.
    pub writebacks: u64,
    /// Lines installed by the prefetcher.
    pub prefetches: u64,
    /// Lines invalidated to maintain inclusion.
    pub back_invalidations: u64,
}

impl CacheStats {
    /// Demand accesses (hits, misses, and merges).
    pub const fn accesses(&self) -> u64 {
        self.hits + self.misses + self.mshr_merges
    }

    /// Fraction of demand accesses that did not hit, in percent.
    pub fn miss_rate(&self) -> f64 {
        let total = self.accesses();
        if total == 0 {
            0.0
        } else {
            100.0 * (self.misses + self.mshr_merges) as f64 / total as f64
        }
    }
}

/// DRAM controller counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DramStats {
    /// Read bursts.
    pub reads: u64,
    /// Write bursts.
    pub writes: u64,
    /// Accesses to an already open row.
    pub row_hits: u64,
    /// Accesses that needed an activate (and possibly a precharge).
    pub row_misses: u64,
    /// Refresh operations performed.
    pub refreshes: u64,
}

/// Simulation statistics structure tracking all performance metrics.
///
/// Collects counters from every pipeline stage and memory component. All counters are
/// deterministic functions of the configuration and instruction stream; host timing is kept
/// separately in `host_seconds` and filled in by the simulator at the end of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimStats {
    /// Wall-clock seconds the host spent simulating.
    pub host_seconds: f64,
    /// Total simulated cycles.
    pub cycles: u64,
    /// Micro-ops committed across all threads.
    pub committed: u64,
    /// Micro-ops committed per hardware thread.
    pub committed_per_thread: Vec<u64>,
    /// Committed micro-ops per operation class.
    pub committed_by_class: BTreeMap<OpClass, u64>,
    /// Committed branches.
    pub committed_branches: u64,
    /// Committed loads.
    pub committed_loads: u64,
    /// Committed stores.
    pub committed_stores: u64,

    /// Micro-ops delivered by fetch (correct and wrong path).
    pub fetched: u64,
    /// Micro-ops fetched on a mispredicted path.
    pub wrong_path_fetched: u64,
    /// Cycles fetch waited on the instruction cache.
    pub icache_stall_cycles: u64,
    /// Micro-ops decoded.
    pub decoded: u64,
    /// Micro-ops renamed.
    pub renamed: u64,
    /// Micro-ops dispatched into the instruction queue.
    pub dispatched: u64,
    /// Micro-ops issued to a functional unit.
    pub issued: u64,
    /// Issue attempts refused because the functional unit was busy.
    pub fu_busy: u64,
    /// Number of cycles in which exactly `i` micro-ops committed.
    pub commit_histogram: Vec<u64>,

    /// Branch predictions made at fetch.
    pub branch_lookups: u64,
    /// Committed branches that had been mispredicted.
    pub branch_mispredicts: u64,
    /// Squash counts per cause.
    pub squashes: SquashStats,
    /// Faults taken at commit.
    pub traps: u64,

    /// Rename stall cycles per reason.
    pub rename_stalls: RenameStalls,
    /// Loads that obtained their data from an older store.
    pub forwarded_loads: u64,
    /// Loads replayed because an older store only partially covered them.
    pub load_replays: u64,
    /// Loads held back by a store-set prediction.
    pub predicted_dependences: u64,
    /// Memory-order violations detected.
    pub memory_order_violations: u64,
    /// Times the store-set predictor was cleared.
    pub store_set_clears: u64,
    /// Loads refused by the L1D because every load port was used.
    pub load_port_stalls: u64,
    /// Stores refused by the L1D because every store port was used.
    pub store_port_stalls: u64,

    /// L1 instruction cache.
    pub l1_i: CacheStats,
    /// L1 data cache.
    pub l1_d: CacheStats,
    /// Shared L2 cache.
    pub l2: CacheStats,
    /// Main memory.
    pub dram: DramStats,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"pipeline"`, `"speculation"`, `"stalls"`,
/// `"instruction_mix"`, `"memory"`. Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &[
    "summary",
    "pipeline",
    "speculation",
    "stalls",
    "instruction_mix",
    "memory",
];

impl SimStats {
    /// Creates zeroed statistics for `threads` hardware threads and a commit width.
    pub fn new(threads: usize, commit_width: usize) -> Self {
        Self {
            committed_per_thread: vec![0; threads],
            commit_histogram: vec![0; commit_width + 1],
            ..Self::default()
        }
    }

    /// Committed micro-ops per cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.committed as f64 / self.cycles as f64
        }
    }

    /// Cycles per committed micro-op.
    pub fn cpi(&self) -> f64 {
        if self.committed == 0 {
            0.0
        } else {
            self.cycles as f64 / self.committed as f64
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let cyc = self.cycles.max(1) as f64;
        let instr = self.committed.max(1) as f64;

        if want("summary") {
            let khz = if self.host_seconds > 0.0 {
                self.cycles as f64 / self.host_seconds / 1000.0
            } else {
                0.0
            };
            println!("\n==========================================================");
            println!("FIRESTORM O3 SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {:.4} s", self.host_seconds);
            println!("sim_cycles               {}", self.cycles);
            println!("sim_freq                 {khz:.2} kHz");
            println!("sim_insts                {}", self.committed);
            println!("sim_ipc                  {:.4}", self.ipc());
            println!("sim_cpi                  {:.4}", self.cpi());
            for (tid, n) in self.committed_per_thread.iter().enumerate() {
                println!("  thread{tid}.committed     {n}");
            }
            println!("----------------------------------------------------------");
        }
        if want("pipeline") {
            println!("PIPELINE");
            println!("  fetch.insts            {}", self.fetched);
            println!("  fetch.wrong_path       {}", self.wrong_path_fetched);
            println!("  fetch.icache_stalls    {}", self.icache_stall_cycles);
            println!("  decode.insts           {}", self.decoded);
            println!("  rename.insts           {}", self.renamed);
            println!("  iew.dispatched         {}", self.dispatched);
            println!("  iew.issued             {}", self.issued);
            println!("  iew.fu_busy            {}", self.fu_busy);
            println!("  commit.width_histogram");
            for (width, n) in self.commit_histogram.iter().enumerate() {
                println!(
                    "    {width:>2} {:<12} ({:.2}%)",
                    n,
                    *n as f64 / cyc * 100.0
                );
            }
            println!("----------------------------------------------------------");
        }
        if want("speculation") {
            let lookups = self.branch_lookups.max(1) as f64;
            println!("SPECULATION");
            println!("  bp.lookups             {}", self.branch_lookups);
            println!("  bp.mispredicts         {}", self.branch_mispredicts);
            println!(
                "  bp.accuracy            {:.2}%",
                100.0 - self.branch_mispredicts as f64 / lookups * 100.0
            );
            println!("  squash.branch          {}", self.squashes.branch_mispredict);
            println!("  squash.decode          {}", self.squashes.decode_redirect);
            println!("  squash.memory_order    {}", self.squashes.memory_order);
            println!("  squash.fault           {}", self.squashes.fault);
            println!("  squash.insts           {}", self.squashes.squashed_insts);
            println!("  traps                  {}", self.traps);
            println!("  mem.order_violations   {}", self.memory_order_violations);
            println!("  mem.store_set_clears   {}", self.store_set_clears);
            println!("  mem.predicted_deps     {}", self.predicted_dependences);
            println!("----------------------------------------------------------");
        }
        if want("stalls") {
            let pct = |n: u64| n as f64 / cyc * 100.0;
            let r = &self.rename_stalls;
            println!("STALLS");
            for (name, n) in [
                ("rename.rob_full", r.rob_full),
                ("rename.iq_full", r.iq_full),
                ("rename.lq_full", r.lq_full),
                ("rename.sq_full", r.sq_full),
                ("rename.no_free_regs", r.no_free_regs),
                ("rename.serialize", r.serialize),
                ("rename.backpressure", r.backpressure),
                ("l1d.load_port", self.load_port_stalls),
                ("l1d.store_port", self.store_port_stalls),
            ] {
                println!("  {name:<22} {n} ({:.2}%)", pct(n));
            }
            println!("  lsq.forwarded_loads    {}", self.forwarded_loads);
            println!("  lsq.load_replays       {}", self.load_replays);
            println!("----------------------------------------------------------");
        }
        if want("instruction_mix") {
            println!("INSTRUCTION MIX");
            for (class, n) in &self.committed_by_class {
                println!(
                    "  op.{:<19} {} ({:.2}%)",
                    class.to_string(),
                    n,
                    *n as f64 / instr * 100.0
                );
            }
            println!("  op.branches            {}", self.committed_branches);
            println!("----------------------------------------------------------");
        }
        if want("memory") {
            let print_cache = |name: &str, c: &CacheStats| {
                println!(
                    "  {:<6} accesses: {:<10} | hits: {:<10} | miss_rate: {:.2}% | mshr_merges: {} | writebacks: {} | prefetches: {}",
                    name,
                    c.accesses(),
                    c.hits,
                    c.miss_rate(),
                    c.mshr_merges,
                    c.writebacks,
                    c.prefetches
                );
            };
            println!("MEMORY HIERARCHY");
            print_cache("L1-I", &self.l1_i);
            print_cache("L1-D", &self.l1_d);
            print_cache("L2", &self.l2);
            let d = &self.dram;
            let row_total = (d.row_hits + d.row_misses).max(1) as f64;
            println!(
                "  DRAM   reads: {} | writes: {} | row_hit_rate: {:.2}% | refreshes: {}",
                d.reads,
                d.writes,
                d.row_hits as f64 / row_total * 100.0,
                d.refreshes
            );
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
