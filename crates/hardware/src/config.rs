//! Configuration system for the Firestorm simulator.
//!
//! This module defines every parameter of the modelled core and memory system. It provides:
//! 1. **Defaults:** An Apple M1 "Firestorm" performance core at 3.2 GHz with its L1/L2 caches
//!    and a DDR4-2400 memory controller.
//! 2. **Structures:** Hierarchical config for general, pipeline, resources, LSQ, SMT,
//!    functional units, branch prediction, caches, and memory.
//! 3. **Enums:** Closed sets of policies and component variants, selected by name in JSON.
//! 4. **Validation:** `Config::validate` rejects inconsistent parameters before construction.
//!
//! Field names are snake_case; the camelCase names of the classic O3 parameter set
//! (`fetchWidth`, `numROBEntries`, `LSQDepCheckShift`, ...) are accepted as aliases.
//! A configuration is immutable once the simulator has been built from it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::common::{ConfigError, RegClass, SimError, SimResult};
use crate::isa::OpClass;

/// Default configuration constants (Apple M1 Firestorm).
mod defaults {
    /// Core clock period in picoseconds (3.2 GHz).
    pub const CLOCK_PERIOD_PS: u64 = 312;
    /// Hardware threads.
    pub const NUM_THREADS: usize = 1;
    /// Cycles without a commit before the run is declared deadlocked.
    pub const DEADLOCK_THRESHOLD: u64 = 100_000;

    pub const FETCH_WIDTH: usize = 8;
    pub const FETCH_BUFFER_SIZE: usize = 64;
    pub const FETCH_QUEUE_SIZE: usize = 32;
    pub const DECODE_WIDTH: usize = 8;
    pub const RENAME_WIDTH: usize = 8;
    pub const DISPATCH_WIDTH: usize = 8;
    pub const ISSUE_WIDTH: usize = 1;
    pub const WB_WIDTH: usize = 1;
    pub const COMMIT_WIDTH: usize = 7;
    pub const SQUASH_WIDTH: usize = 8;

    /// Default for every inter-stage delay except those listed below.
    pub const STAGE_DELAY: u64 = 1;
    pub const RENAME_TO_IEW_DELAY: u64 = 2;

    pub const BACKWARD_COM_SIZE: u64 = 20;
    pub const FORWARD_COM_SIZE: u64 = 20;
    pub const TRAP_LATENCY: u64 = 13;
    pub const FETCH_TRAP_LATENCY: u64 = 1;

    pub const NUM_ROBS: usize = 1;
    pub const NUM_ROB_ENTRIES: usize = 330;
    pub const NUM_IQ_ENTRIES: usize = 120;
    pub const PHYS_INT_REGS: usize = 380;
    pub const PHYS_FLOAT_REGS: usize = 216;
    pub const PHYS_VEC_REGS: usize = 216;
    pub const PHYS_VEC_PRED_REGS: usize = 32;
    pub const PHYS_MATRIX_REGS: usize = 2;
    pub const PHYS_CC_REGS: usize = 128;

    pub const LQ_ENTRIES: usize = 130;
    pub const SQ_ENTRIES: usize = 60;
    pub const LSQ_DEP_CHECK_SHIFT: u32 = 4;
    pub const STORE_SET_CLEAR_PERIOD: u64 = 250_000;
    pub const LFST_SIZE: usize = 1024;
    pub const SSIT_SIZE: usize = 1024;
    pub const CACHE_LOAD_PORTS: usize = 200;
    pub const CACHE_STORE_PORTS: usize = 200;

    pub const SMT_FETCHING_THREADS: usize = 1;
    pub const SMT_THRESHOLD: u32 = 100;

    pub const BTB_SIZE: usize = 4096;
    pub const RAS_SIZE: usize = 32;
    pub const GHR_BITS: u32 = 12;

    pub const CACHE_LINE: usize = 64;
    pub const PREFETCH_TABLE_SIZE: usize = 64;
    pub const PREFETCH_DEGREE: usize = 1;

    pub const L1I_SIZE: usize = 192 * 1024;
    pub const L1I_WAYS: usize = 6;
    pub const L1I_LATENCY: u64 = 2;
    pub const L1I_MSHRS: usize = 8;
    pub const L1D_SIZE: usize = 128 * 1024;
    pub const L1D_WAYS: usize = 8;
    pub const L1D_LATENCY: u64 = 3;
    pub const L1D_MSHRS: usize = 16;
    pub const L2_SIZE: usize = 12 * 1024 * 1024;
    pub const L2_WAYS: usize = 12;
    pub const L2_LATENCY: u64 = 16;
    pub const L2_MSHRS: usize = 32;
    pub const RESPONSE_LATENCY: u64 = 1;

    pub const L2_XBAR_WIDTH: u64 = 32;
    pub const L2_XBAR_FRONTEND: u64 = 1;
    pub const L2_XBAR_FORWARD: u64 = 0;
    pub const L2_XBAR_RESPONSE: u64 = 1;
    pub const SYSTEM_XBAR_WIDTH: u64 = 16;
    pub const SYSTEM_XBAR_FRONTEND: u64 = 3;
    pub const SYSTEM_XBAR_FORWARD: u64 = 4;
    pub const SYSTEM_XBAR_RESPONSE: u64 = 2;

    pub const MEM_SIZE: u64 = 512 * 1024 * 1024;
    pub const SIMPLE_LATENCY: u64 = 100;

    // DDR4-2400 8x8 timings in picoseconds.
    pub const DRAM_RANKS: usize = 2;
    pub const DRAM_BANKS: usize = 16;
    pub const DRAM_ROW_BUFFER: u64 = 1024;
    pub const T_RCD_PS: u64 = 14_160;
    pub const T_CL_PS: u64 = 14_160;
    pub const T_RP_PS: u64 = 14_160;
    pub const T_RAS_PS: u64 = 32_000;
    pub const T_BURST_PS: u64 = 3_332;
    pub const T_REFI_PS: u64 = 7_800_000;
    pub const T_RFC_PS: u64 = 350_000;
    pub const DRAM_FRONTEND_PS: u64 = 10_000;
    pub const DRAM_BACKEND_PS: u64 = 10_000;
}

/// Largest supported hardware thread count.
pub const MAX_THREADS: usize = 8;

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use firestorm_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.pipeline.fetch_width, 8);
/// assert_eq!(config.resources.num_rob_entries, 330);
/// assert!(config.validate().is_ok());
/// ```
///
/// Overriding a few parameters from JSON, using either naming style:
///
/// ```
/// use firestorm_core::config::Config;
///
/// let json = r#"{
///     "pipeline": { "commitWidth": 4, "issue_width": 8 },
///     "lsq": { "LSQDepCheckShift": 6 }
/// }"#;
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.pipeline.commit_width, 4);
/// assert_eq!(config.pipeline.issue_width, 8);
/// assert_eq!(config.lsq.dep_check_shift, 6);
/// assert_eq!(config.pipeline.fetch_width, 8);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General simulation settings.
    pub general: GeneralConfig,
    /// Stage widths, inter-stage delays, and buffer sizes.
    pub pipeline: PipelineConfig,
    /// ROB, IQ, and physical register file sizes.
    pub resources: ResourceConfig,
    /// Load/store queue and memory-ordering parameters.
    pub lsq: LsqConfig,
    /// Simultaneous multithreading policies.
    pub smt: SmtConfig,
    /// Functional-unit pool.
    pub fu_pool: FuPoolConfig,
    /// Branch predictor.
    pub branch_predictor: BranchPredictorConfig,
    /// Cache hierarchy and crossbars.
    pub cache: CacheHierarchyConfig,
    /// Memory controller and DRAM timing.
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses a configuration from JSON text and validates it.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file and validates it.
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| SimError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Converts a duration in picoseconds to core cycles, rounding up.
    pub const fn ps_to_cycles(&self, ps: u64) -> u64 {
        ps.div_ceil(self.general.clock_period_ps)
    }

    /// Checks every parameter; the first violation found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.general;
        nonzero("general.clock_period_ps", g.clock_period_ps)?;
        in_range("general.num_threads", g.num_threads as u64, 1, MAX_THREADS as u64)?;
        nonzero("general.deadlock_threshold", g.deadlock_threshold)?;

        self.pipeline.validate()?;
        self.resources.validate(g.num_threads)?;
        self.lsq.validate()?;
        self.smt.validate(g.num_threads)?;
        self.fu_pool.validate()?;
        self.branch_predictor.validate()?;
        self.cache.validate()?;
        self.memory.validate()?;

        // The dependence-check granule must not be coarser than an L1D line.
        let line_bits = self.cache.l1_d.line_bytes.trailing_zeros();
        if self.lsq.dep_check_shift > line_bits {
            return Err(ConfigError::OutOfRange {
                field: "lsq.dep_check_shift",
                value: u64::from(self.lsq.dep_check_shift),
                min: 0,
                max: u64::from(line_bits),
            });
        }
        if self.pipeline.fetch_buffer_size > self.cache.l1_i.line_bytes {
            return Err(ConfigError::Inconsistent(format!(
                "pipeline.fetch_buffer_size ({}) exceeds the L1I line size ({})",
                self.pipeline.fetch_buffer_size, self.cache.l1_i.line_bytes
            )));
        }
        if self.resources.num_rob_entries % self.resources.num_robs != 0 {
            return Err(ConfigError::Inconsistent(format!(
                "resources.num_rob_entries ({}) is not divisible by resources.num_robs ({})",
                self.resources.num_rob_entries, self.resources.num_robs
            )));
        }
        if self.resources.num_rob_entries / self.resources.num_robs < g.num_threads {
            return Err(ConfigError::Inconsistent(
                "each ROB bank needs at least one entry per thread".into(),
            ));
        }
        Ok(())
    }
}

fn nonzero(field: &'static str, value: impl Into<u64>) -> Result<(), ConfigError> {
    if value.into() == 0 {
        Err(ConfigError::Zero { field })
    } else {
        Ok(())
    }
}

fn nonzero_usize(field: &'static str, value: usize) -> Result<(), ConfigError> {
    nonzero(field, value as u64)
}

fn in_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

fn power_of_two(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::NotPowerOfTwo { field, value })
    }
}

/// General simulation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Core clock period in picoseconds; DRAM timings are converted with it.
    #[serde(default = "GeneralConfig::default_clock_period")]
    pub clock_period_ps: u64,

    /// Number of hardware threads (SMT contexts).
    #[serde(default = "GeneralConfig::default_num_threads", alias = "numThreads")]
    pub num_threads: usize,

    /// Cycles without a commit, while work remains, before the run fails with a deadlock.
    #[serde(default = "GeneralConfig::default_deadlock_threshold")]
    pub deadlock_threshold: u64,

    /// Stop after this many cycles (0 = run until every stream drains).
    #[serde(default)]
    pub max_cycles: u64,
}

impl GeneralConfig {
    const fn default_clock_period() -> u64 {
        defaults::CLOCK_PERIOD_PS
    }

    const fn default_num_threads() -> usize {
        defaults::NUM_THREADS
    }

    const fn default_deadlock_threshold() -> u64 {
        defaults::DEADLOCK_THRESHOLD
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            clock_period_ps: defaults::CLOCK_PERIOD_PS,
            num_threads: defaults::NUM_THREADS,
            deadlock_threshold: defaults::DEADLOCK_THRESHOLD,
            max_cycles: 0,
        }
    }
}

/// Stage widths, inter-stage delays, and stage buffer sizes.
///
/// Every `*_delay` is the number of cycles a signal takes to travel between two stages
/// through a time buffer; it must lie in `1..=` the relevant buffer depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Micro-ops fetched per cycle.
    #[serde(default = "PipelineConfig::default_fetch_width", alias = "fetchWidth")]
    pub fetch_width: usize,
    /// Fetch buffer size in bytes (one aligned block).
    #[serde(default = "PipelineConfig::default_fetch_buffer", alias = "fetchBufferSize")]
    pub fetch_buffer_size: usize,
    /// Fetch queue size in micro-ops.
    #[serde(default = "PipelineConfig::default_fetch_queue", alias = "fetchQueueSize")]
    pub fetch_queue_size: usize,
    /// Micro-ops decoded per cycle.
    #[serde(default = "PipelineConfig::default_decode_width", alias = "decodeWidth")]
    pub decode_width: usize,
    /// Micro-ops renamed per cycle.
    #[serde(default = "PipelineConfig::default_rename_width", alias = "renameWidth")]
    pub rename_width: usize,
    /// Micro-ops dispatched into the instruction queue per cycle.
    #[serde(default = "PipelineConfig::default_dispatch_width", alias = "dispatchWidth")]
    pub dispatch_width: usize,
    /// Micro-ops issued per cycle to each functional-unit class.
    #[serde(default = "PipelineConfig::default_issue_width", alias = "issueWidth")]
    pub issue_width: usize,
    /// Results written back per cycle.
    #[serde(default = "PipelineConfig::default_wb_width", alias = "wbWidth")]
    pub wb_width: usize,
    /// Micro-ops committed per cycle.
    #[serde(default = "PipelineConfig::default_commit_width", alias = "commitWidth")]
    pub commit_width: usize,
    /// Squashed ROB entries reclaimed per cycle.
    #[serde(default = "PipelineConfig::default_squash_width", alias = "squashWidth")]
    pub squash_width: usize,

    /// Decode to fetch (block and early redirect).
    #[serde(default = "PipelineConfig::default_delay", alias = "decodeToFetchDelay")]
    pub decode_to_fetch_delay: u64,
    /// Rename to fetch (serialization stall).
    #[serde(default = "PipelineConfig::default_delay", alias = "renameToFetchDelay")]
    pub rename_to_fetch_delay: u64,
    /// IEW to fetch (branch and memory-order redirects).
    #[serde(default = "PipelineConfig::default_delay", alias = "iewToFetchDelay")]
    pub iew_to_fetch_delay: u64,
    /// Commit to fetch (trap redirects).
    #[serde(default = "PipelineConfig::default_delay", alias = "commitToFetchDelay")]
    pub commit_to_fetch_delay: u64,
    /// Fetch to decode (micro-op transport).
    #[serde(default = "PipelineConfig::default_delay", alias = "fetchToDecodeDelay")]
    pub fetch_to_decode_delay: u64,
    /// Rename to decode (block).
    #[serde(default = "PipelineConfig::default_delay", alias = "renameToDecodeDelay")]
    pub rename_to_decode_delay: u64,
    /// IEW to decode (squash notification).
    #[serde(default = "PipelineConfig::default_delay", alias = "iewToDecodeDelay")]
    pub iew_to_decode_delay: u64,
    /// Commit to decode (squash notification).
    #[serde(default = "PipelineConfig::default_delay", alias = "commitToDecodeDelay")]
    pub commit_to_decode_delay: u64,
    /// Decode to rename (micro-op transport).
    #[serde(default = "PipelineConfig::default_delay", alias = "decodeToRenameDelay")]
    pub decode_to_rename_delay: u64,
    /// IEW to rename (block and squash notification).
    #[serde(default = "PipelineConfig::default_delay", alias = "iewToRenameDelay")]
    pub iew_to_rename_delay: u64,
    /// Commit to rename (squash notification).
    #[serde(default = "PipelineConfig::default_delay", alias = "commitToRenameDelay")]
    pub commit_to_rename_delay: u64,
    /// Rename to IEW (micro-op transport).
    #[serde(default = "PipelineConfig::default_rename_to_iew", alias = "renameToIEWDelay")]
    pub rename_to_iew_delay: u64,
    /// Issue to execute.
    #[serde(default = "PipelineConfig::default_delay", alias = "issueToExecuteDelay")]
    pub issue_to_execute_delay: u64,
    /// IEW to commit (completion notification).
    #[serde(default = "PipelineConfig::default_delay", alias = "iewToCommitDelay")]
    pub iew_to_commit_delay: u64,
    /// Commit to IEW (committed stores become drainable, squash notification).
    #[serde(default = "PipelineConfig::default_delay", alias = "commitToIEWDelay")]
    pub commit_to_iew_delay: u64,
    /// Rename to ROB (entries become visible to commit).
    #[serde(default = "PipelineConfig::default_delay", alias = "renameToROBDelay")]
    pub rename_to_rob_delay: u64,

    /// Depth of the backward (toward fetch) time buffer.
    #[serde(default = "PipelineConfig::default_backward_com", alias = "backComSize")]
    pub backward_com_size: u64,
    /// Depth of the forward (toward commit) time buffers.
    #[serde(default = "PipelineConfig::default_forward_com", alias = "forwardComSize")]
    pub forward_com_size: u64,

    /// Cycles from a fault reaching the ROB head to the handler redirect.
    #[serde(default = "PipelineConfig::default_trap_latency", alias = "trapLatency")]
    pub trap_latency: u64,
    /// Trap latency for faults raised by fetch.
    #[serde(
        default = "PipelineConfig::default_fetch_trap_latency",
        alias = "fetchTrapLatency"
    )]
    pub fetch_trap_latency: u64,
}

impl PipelineConfig {
    const fn default_fetch_width() -> usize {
        defaults::FETCH_WIDTH
    }
    const fn default_fetch_buffer() -> usize {
        defaults::FETCH_BUFFER_SIZE
    }
    const fn default_fetch_queue() -> usize {
        defaults::FETCH_QUEUE_SIZE
    }
    const fn default_decode_width() -> usize {
        defaults::DECODE_WIDTH
    }
    const fn default_rename_width() -> usize {
        defaults::RENAME_WIDTH
    }
    const fn default_dispatch_width() -> usize {
        defaults::DISPATCH_WIDTH
    }
    const fn default_issue_width() -> usize {
        defaults::ISSUE_WIDTH
    }
    const fn default_wb_width() -> usize {
        defaults::WB_WIDTH
    }
    const fn default_commit_width() -> usize {
        defaults::COMMIT_WIDTH
    }
    const fn default_squash_width() -> usize {
        defaults::SQUASH_WIDTH
    }
    const fn default_delay() -> u64 {
        defaults::STAGE_DELAY
    }
    const fn default_rename_to_iew() -> u64 {
        defaults::RENAME_TO_IEW_DELAY
    }
    const fn default_backward_com() -> u64 {
        defaults::BACKWARD_COM_SIZE
    }
    const fn default_forward_com() -> u64 {
        defaults::FORWARD_COM_SIZE
    }
    const fn default_trap_latency() -> u64 {
        defaults::TRAP_LATENCY
    }
    const fn default_fetch_trap_latency() -> u64 {
        defaults::FETCH_TRAP_LATENCY
    }

    fn validate(&self) -> Result<(), ConfigError> {
        nonzero_usize("pipeline.fetch_width", self.fetch_width)?;
        nonzero_usize("pipeline.fetch_queue_size", self.fetch_queue_size)?;
        nonzero_usize("pipeline.decode_width", self.decode_width)?;
        nonzero_usize("pipeline.rename_width", self.rename_width)?;
        nonzero_usize("pipeline.dispatch_width", self.dispatch_width)?;
        nonzero_usize("pipeline.issue_width", self.issue_width)?;
        nonzero_usize("pipeline.wb_width", self.wb_width)?;
        nonzero_usize("pipeline.commit_width", self.commit_width)?;
        nonzero_usize("pipeline.squash_width", self.squash_width)?;
        power_of_two("pipeline.fetch_buffer_size", self.fetch_buffer_size as u64)?;
        nonzero("pipeline.backward_com_size", self.backward_com_size)?;
        nonzero("pipeline.forward_com_size", self.forward_com_size)?;
        nonzero("pipeline.trap_latency", self.trap_latency)?;
        nonzero("pipeline.fetch_trap_latency", self.fetch_trap_latency)?;

        let back = self.backward_com_size;
        for (field, delay) in [
            ("pipeline.decode_to_fetch_delay", self.decode_to_fetch_delay),
            ("pipeline.rename_to_fetch_delay", self.rename_to_fetch_delay),
            ("pipeline.iew_to_fetch_delay", self.iew_to_fetch_delay),
            ("pipeline.commit_to_fetch_delay", self.commit_to_fetch_delay),
            ("pipeline.rename_to_decode_delay", self.rename_to_decode_delay),
            ("pipeline.iew_to_decode_delay", self.iew_to_decode_delay),
            ("pipeline.commit_to_decode_delay", self.commit_to_decode_delay),
            ("pipeline.iew_to_rename_delay", self.iew_to_rename_delay),
            ("pipeline.commit_to_rename_delay", self.commit_to_rename_delay),
            ("pipeline.commit_to_iew_delay", self.commit_to_iew_delay),
        ] {
            in_range(field, delay, 1, back)?;
        }
        let fwd = self.forward_com_size;
        for (field, delay) in [
            ("pipeline.fetch_to_decode_delay", self.fetch_to_decode_delay),
            ("pipeline.decode_to_rename_delay", self.decode_to_rename_delay),
            ("pipeline.rename_to_iew_delay", self.rename_to_iew_delay),
            ("pipeline.iew_to_commit_delay", self.iew_to_commit_delay),
            ("pipeline.issue_to_execute_delay", self.issue_to_execute_delay),
            ("pipeline.rename_to_rob_delay", self.rename_to_rob_delay),
        ] {
            in_range(field, delay, 1, fwd)?;
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let d = defaults::STAGE_DELAY;
        Self {
            fetch_width: defaults::FETCH_WIDTH,
            fetch_buffer_size: defaults::FETCH_BUFFER_SIZE,
            fetch_queue_size: defaults::FETCH_QUEUE_SIZE,
            decode_width: defaults::DECODE_WIDTH,
            rename_width: defaults::RENAME_WIDTH,
            dispatch_width: defaults::DISPATCH_WIDTH,
            issue_width: defaults::ISSUE_WIDTH,
            wb_width: defaults::WB_WIDTH,
            commit_width: defaults::COMMIT_WIDTH,
            squash_width: defaults::SQUASH_WIDTH,
            decode_to_fetch_delay: d,
            rename_to_fetch_delay: d,
            iew_to_fetch_delay: d,
            commit_to_fetch_delay: d,
            fetch_to_decode_delay: d,
            rename_to_decode_delay: d,
            iew_to_decode_delay: d,
            commit_to_decode_delay: d,
            decode_to_rename_delay: d,
            iew_to_rename_delay: d,
            commit_to_rename_delay: d,
            rename_to_iew_delay: defaults::RENAME_TO_IEW_DELAY,
            issue_to_execute_delay: d,
            iew_to_commit_delay: d,
            commit_to_iew_delay: d,
            rename_to_rob_delay: d,
            backward_com_size: defaults::BACKWARD_COM_SIZE,
            forward_com_size: defaults::FORWARD_COM_SIZE,
            trap_latency: defaults::TRAP_LATENCY,
            fetch_trap_latency: defaults::FETCH_TRAP_LATENCY,
        }
    }
}

/// Reorder buffer, instruction queue, and physical register file sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Number of ROB banks; each holds `num_rob_entries / num_robs` entries.
    #[serde(default = "ResourceConfig::default_num_robs", alias = "numRobs")]
    pub num_robs: usize,
    /// Total ROB entries.
    #[serde(default = "ResourceConfig::default_rob_entries", alias = "numROBEntries")]
    pub num_rob_entries: usize,
    /// Instruction queue entries.
    #[serde(default = "ResourceConfig::default_iq_entries", alias = "numIQEntries")]
    pub num_iq_entries: usize,
    /// Integer physical registers.
    #[serde(default = "ResourceConfig::default_int_regs", alias = "numPhysIntRegs")]
    pub num_phys_int_regs: usize,
    /// Floating-point physical registers.
    #[serde(default = "ResourceConfig::default_float_regs", alias = "numPhysFloatRegs")]
    pub num_phys_float_regs: usize,
    /// Vector physical registers.
    #[serde(default = "ResourceConfig::default_vec_regs", alias = "numPhysVecRegs")]
    pub num_phys_vec_regs: usize,
    /// Vector predicate physical registers.
    #[serde(
        default = "ResourceConfig::default_vec_pred_regs",
        alias = "numPhysVecPredRegs"
    )]
    pub num_phys_vec_pred_regs: usize,
    /// Matrix physical registers.
    #[serde(default = "ResourceConfig::default_matrix_regs", alias = "numPhysMatRegs")]
    pub num_phys_matrix_regs: usize,
    /// Condition-code physical registers.
    #[serde(default = "ResourceConfig::default_cc_regs", alias = "numPhysCCRegs")]
    pub num_phys_cc_regs: usize,
}

impl ResourceConfig {
    const fn default_num_robs() -> usize {
        defaults::NUM_ROBS
    }
    const fn default_rob_entries() -> usize {
        defaults::NUM_ROB_ENTRIES
    }
    const fn default_iq_entries() -> usize {
        defaults::NUM_IQ_ENTRIES
    }
    const fn default_int_regs() -> usize {
        defaults::PHYS_INT_REGS
    }
    const fn default_float_regs() -> usize {
        defaults::PHYS_FLOAT_REGS
    }
    const fn default_vec_regs() -> usize {
        defaults::PHYS_VEC_REGS
    }
    const fn default_vec_pred_regs() -> usize {
        defaults::PHYS_VEC_PRED_REGS
    }
    const fn default_matrix_regs() -> usize {
        defaults::PHYS_MATRIX_REGS
    }
    const fn default_cc_regs() -> usize {
        defaults::PHYS_CC_REGS
    }

    /// Physical register count for a class.
    pub const fn phys_regs(&self, class: RegClass) -> usize {
        match class {
            RegClass::Int => self.num_phys_int_regs,
            RegClass::Float => self.num_phys_float_regs,
            RegClass::Vec => self.num_phys_vec_regs,
            RegClass::VecPred => self.num_phys_vec_pred_regs,
            RegClass::Matrix => self.num_phys_matrix_regs,
            RegClass::CondCode => self.num_phys_cc_regs,
        }
    }

    fn validate(&self, threads: usize) -> Result<(), ConfigError> {
        nonzero_usize("resources.num_robs", self.num_robs)?;
        nonzero_usize("resources.num_rob_entries", self.num_rob_entries)?;
        nonzero_usize("resources.num_iq_entries", self.num_iq_entries)?;
        for class in RegClass::ALL {
            let phys = self.phys_regs(class);
            let arch = class.num_arch_regs();
            if phys < arch * threads {
                return Err(ConfigError::TooFewPhysRegs {
                    class: class.name(),
                    phys,
                    arch,
                    threads,
                });
            }
        }
        Ok(())
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            num_robs: defaults::NUM_ROBS,
            num_rob_entries: defaults::NUM_ROB_ENTRIES,
            num_iq_entries: defaults::NUM_IQ_ENTRIES,
            num_phys_int_regs: defaults::PHYS_INT_REGS,
            num_phys_float_regs: defaults::PHYS_FLOAT_REGS,
            num_phys_vec_regs: defaults::PHYS_VEC_REGS,
            num_phys_vec_pred_regs: defaults::PHYS_VEC_PRED_REGS,
            num_phys_matrix_regs: defaults::PHYS_MATRIX_REGS,
            num_phys_cc_regs: defaults::PHYS_CC_REGS,
        }
    }
}

/// Load/store queue and memory-ordering parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsqConfig {
    /// Load queue entries.
    #[serde(default = "LsqConfig::default_lq", alias = "LQEntries")]
    pub lq_entries: usize,
    /// Store queue entries.
    #[serde(default = "LsqConfig::default_sq", alias = "SQEntries")]
    pub sq_entries: usize,
    /// Address bits ignored when comparing addresses for ordering violations.
    #[serde(default = "LsqConfig::default_shift", alias = "LSQDepCheckShift")]
    pub dep_check_shift: u32,
    /// Also check load-load ordering.
    #[serde(default = "LsqConfig::default_true", alias = "LSQCheckLoads")]
    pub check_loads: bool,
    /// Memory instructions between store-set predictor resets.
    #[serde(default = "LsqConfig::default_clear_period")]
    pub store_set_clear_period: u64,
    /// Last fetched store table entries.
    #[serde(default = "LsqConfig::default_lfst", alias = "LFSTSize")]
    pub lfst_size: usize,
    /// Store set id table entries.
    #[serde(default = "LsqConfig::default_ssit", alias = "SSITSize")]
    pub ssit_size: usize,
    /// Enforce total store order.
    #[serde(default, alias = "needsTSO")]
    pub needs_tso: bool,
    /// L1D load ports per cycle.
    #[serde(default = "LsqConfig::default_load_ports", alias = "cacheLoadPorts")]
    pub cache_load_ports: usize,
    /// L1D store ports per cycle.
    #[serde(default = "LsqConfig::default_store_ports", alias = "cacheStorePorts")]
    pub cache_store_ports: usize,
}

impl LsqConfig {
    const fn default_lq() -> usize {
        defaults::LQ_ENTRIES
    }
    const fn default_sq() -> usize {
        defaults::SQ_ENTRIES
    }
    const fn default_shift() -> u32 {
        defaults::LSQ_DEP_CHECK_SHIFT
    }
    const fn default_true() -> bool {
        true
    }
    const fn default_clear_period() -> u64 {
        defaults::STORE_SET_CLEAR_PERIOD
    }
    const fn default_lfst() -> usize {
        defaults::LFST_SIZE
    }
    const fn default_ssit() -> usize {
        defaults::SSIT_SIZE
    }
    const fn default_load_ports() -> usize {
        defaults::CACHE_LOAD_PORTS
    }
    const fn default_store_ports() -> usize {
        defaults::CACHE_STORE_PORTS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        nonzero_usize("lsq.lq_entries", self.lq_entries)?;
        nonzero_usize("lsq.sq_entries", self.sq_entries)?;
        nonzero("lsq.store_set_clear_period", self.store_set_clear_period)?;
        power_of_two("lsq.lfst_size", self.lfst_size as u64)?;
        power_of_two("lsq.ssit_size", self.ssit_size as u64)?;
        nonzero_usize("lsq.cache_load_ports", self.cache_load_ports)?;
        nonzero_usize("lsq.cache_store_ports", self.cache_store_ports)?;
        in_range("lsq.dep_check_shift", u64::from(self.dep_check_shift), 0, 12)
    }
}

impl Default for LsqConfig {
    fn default() -> Self {
        Self {
            lq_entries: defaults::LQ_ENTRIES,
            sq_entries: defaults::SQ_ENTRIES,
            dep_check_shift: defaults::LSQ_DEP_CHECK_SHIFT,
            check_loads: true,
            store_set_clear_period: defaults::STORE_SET_CLEAR_PERIOD,
            lfst_size: defaults::LFST_SIZE,
            ssit_size: defaults::SSIT_SIZE,
            needs_tso: false,
            cache_load_ports: defaults::CACHE_LOAD_PORTS,
            cache_store_ports: defaults::CACHE_STORE_PORTS,
        }
    }
}

/// Partitioning of a shared structure between SMT threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmtPartitionPolicy {
    /// No static partition; threads allocate first-come, first-served.
    Dynamic,
    /// Each thread gets an equal static share.
    #[default]
    Partitioned,
    /// Each thread may hold at most `threshold` percent of the structure.
    Threshold,
}

/// Thread selection policy for fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmtFetchPolicy {
    /// Rotate through threads.
    #[default]
    RoundRobin,
    /// Prefer the thread with the fewest unresolved branches.
    Branch,
    /// Prefer the thread with the fewest instruction queue entries.
    #[serde(alias = "IQCount")]
    IqCount,
    /// Prefer the thread with the fewest load/store queue entries.
    #[serde(alias = "LSQCount")]
    LsqCount,
}

/// Thread selection policy for commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmtCommitPolicy {
    /// Rotate through commit-ready threads.
    #[default]
    RoundRobin,
    /// Commit the thread whose ready head is oldest.
    OldestReady,
}

/// Simultaneous multithreading policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtConfig {
    /// Threads that may fetch in the same cycle.
    #[serde(default = "SmtConfig::default_fetching", alias = "smtNumFetchingThreads")]
    pub num_fetching_threads: usize,
    /// Fetch thread selection.
    #[serde(default, alias = "smtFetchPolicy")]
    pub fetch_policy: SmtFetchPolicy,
    /// Load/store queue sharing.
    #[serde(default, alias = "smtLSQPolicy")]
    pub lsq_policy: SmtPartitionPolicy,
    /// Load/store queue threshold in percent.
    #[serde(default = "SmtConfig::default_threshold", alias = "smtLSQThreshold")]
    pub lsq_threshold: u32,
    /// Instruction queue sharing.
    #[serde(default, alias = "smtIQPolicy")]
    pub iq_policy: SmtPartitionPolicy,
    /// Instruction queue threshold in percent.
    #[serde(default = "SmtConfig::default_threshold", alias = "smtIQThreshold")]
    pub iq_threshold: u32,
    /// Reorder buffer sharing.
    #[serde(default, alias = "smtROBPolicy")]
    pub rob_policy: SmtPartitionPolicy,
    /// Reorder buffer threshold in percent.
    #[serde(default = "SmtConfig::default_threshold", alias = "smtROBThreshold")]
    pub rob_threshold: u32,
    /// Commit thread selection.
    #[serde(default, alias = "smtCommitPolicy")]
    pub commit_policy: SmtCommitPolicy,
}

impl SmtConfig {
    const fn default_fetching() -> usize {
        defaults::SMT_FETCHING_THREADS
    }
    const fn default_threshold() -> u32 {
        defaults::SMT_THRESHOLD
    }

    fn validate(&self, threads: usize) -> Result<(), ConfigError> {
        in_range(
            "smt.num_fetching_threads",
            self.num_fetching_threads as u64,
            1,
            threads as u64,
        )?;
        in_range("smt.lsq_threshold", u64::from(self.lsq_threshold), 1, 100)?;
        in_range("smt.iq_threshold", u64::from(self.iq_threshold), 1, 100)?;
        in_range("smt.rob_threshold", u64::from(self.rob_threshold), 1, 100)
    }
}

impl Default for SmtConfig {
    fn default() -> Self {
        Self {
            num_fetching_threads: defaults::SMT_FETCHING_THREADS,
            fetch_policy: SmtFetchPolicy::default(),
            lsq_policy: SmtPartitionPolicy::default(),
            lsq_threshold: defaults::SMT_THRESHOLD,
            iq_policy: SmtPartitionPolicy::default(),
            iq_threshold: defaults::SMT_THRESHOLD,
            rob_policy: SmtPartitionPolicy::default(),
            rob_threshold: defaults::SMT_THRESHOLD,
            commit_policy: SmtCommitPolicy::default(),
        }
    }
}

/// Timing of one operation class on a functional unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpTiming {
    /// Operation class.
    pub op_class: OpClass,
    /// Cycles from execute to result.
    #[serde(default = "OpTiming::default_latency", alias = "opLat")]
    pub latency: u64,
    /// Cycles before the unit accepts another operation (1 = fully pipelined).
    #[serde(default = "OpTiming::default_latency", alias = "issueLat")]
    pub issue_latency: u64,
}

impl OpTiming {
    const fn default_latency() -> u64 {
        1
    }

    /// A fully pipelined operation of the given latency.
    pub const fn pipelined(op_class: OpClass, latency: u64) -> Self {
        Self {
            op_class,
            latency,
            issue_latency: 1,
        }
    }

    /// An unpipelined operation that occupies its unit for `issue_latency` cycles.
    pub const fn blocking(op_class: OpClass, latency: u64, issue_latency: u64) -> Self {
        Self {
            op_class,
            latency,
            issue_latency,
        }
    }
}

/// A group of identical functional units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuDesc {
    /// Display name.
    pub name: String,
    /// Number of identical units.
    pub count: usize,
    /// Operation classes the units can execute.
    pub ops: Vec<OpTiming>,
}

/// Functional-unit pool selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "PascalCase")]
pub enum FuPoolConfig {
    /// The standard O3 pool (6 integer ALUs, 2 mul/div, 4 FP ALUs, 2 FP mul/div,
    /// 4 SIMD, 1 predicate ALU, 4 memory ports, 1 IPR port).
    #[default]
    Default,
    /// An explicit list of unit groups.
    Custom {
        /// Unit groups.
        units: Vec<FuDesc>,
    },
}

impl FuPoolConfig {
    /// The unit groups of this pool.
    pub fn units(&self) -> Vec<FuDesc> {
        match self {
            Self::Default => default_fu_pool(),
            Self::Custom { units } => units.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let units = self.units();
        for unit in &units {
            if unit.count == 0 {
                return Err(ConfigError::Inconsistent(format!(
                    "functional unit group {} has zero units",
                    unit.name
                )));
            }
            for op in &unit.ops {
                if op.latency == 0 || op.issue_latency == 0 {
                    return Err(ConfigError::Inconsistent(format!(
                        "functional unit group {} has a zero latency for {}",
                        unit.name, op.op_class
                    )));
                }
            }
        }
        for required in OpClass::ALL.into_iter().filter(|c| *c != OpClass::Nop) {
            if !units
                .iter()
                .any(|u| u.ops.iter().any(|op| op.op_class == required))
            {
                return Err(ConfigError::MissingCapability(required.to_string()));
            }
        }
        Ok(())
    }
}

/// The standard O3 functional-unit pool.
pub fn default_fu_pool() -> Vec<FuDesc> {
    use OpClass as O;
    let group = |name: &str, count: usize, ops: Vec<OpTiming>| FuDesc {
        name: name.to_string(),
        count,
        ops,
    };
    vec![
        group("IntALU", 6, vec![OpTiming::pipelined(O::IntAlu, 1)]),
        group(
            "IntMultDiv",
            2,
            vec![
                OpTiming::pipelined(O::IntMult, 3),
                OpTiming::blocking(O::IntDiv, 20, 19),
            ],
        ),
        group(
            "FP_ALU",
            4,
            vec![
                OpTiming::pipelined(O::FloatAdd, 2),
                OpTiming::pipelined(O::FloatCmp, 2),
                OpTiming::pipelined(O::FloatCvt, 2),
            ],
        ),
        group(
            "FP_MultDiv",
            2,
            vec![
                OpTiming::pipelined(O::FloatMult, 4),
                OpTiming::pipelined(O::FloatMultAcc, 5),
                OpTiming::pipelined(O::FloatMisc, 3),
                OpTiming::blocking(O::FloatDiv, 12, 12),
                OpTiming::blocking(O::FloatSqrt, 24, 24),
            ],
        ),
        group(
            "SIMD_Unit",
            4,
            vec![
                OpTiming::pipelined(O::SimdAdd, 1),
                OpTiming::pipelined(O::SimdAlu, 1),
                OpTiming::pipelined(O::SimdMult, 3),
                OpTiming::pipelined(O::SimdFloat, 4),
            ],
        ),
        group("PredALU", 1, vec![OpTiming::pipelined(O::SimdPredAlu, 1)]),
        group(
            "RdWrPort",
            4,
            vec![
                OpTiming::pipelined(O::MemRead, 1),
                OpTiming::pipelined(O::MemWrite, 1),
                OpTiming::pipelined(O::FloatMemRead, 1),
                OpTiming::pipelined(O::FloatMemWrite, 1),
            ],
        ),
        group("IprPort", 1, vec![OpTiming::blocking(O::IprAccess, 3, 3)]),
    ]
}

/// Branch direction predictor variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BranchPredictorKind {
    /// Conditional branches always predicted not taken.
    Static,
    /// Global history XOR PC indexed two-bit counters.
    #[default]
    #[serde(alias = "Gshare")]
    GShare,
}

/// Branch predictor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPredictorConfig {
    /// Direction predictor.
    #[serde(default)]
    pub kind: BranchPredictorKind,
    /// Branch target buffer entries.
    #[serde(default = "BranchPredictorConfig::default_btb", alias = "BTBEntries")]
    pub btb_size: usize,
    /// Return address stack entries per thread.
    #[serde(default = "BranchPredictorConfig::default_ras", alias = "RASSize")]
    pub ras_size: usize,
    /// Global history bits (also log2 of the pattern table size).
    #[serde(default = "BranchPredictorConfig::default_ghr_bits")]
    pub history_bits: u32,
}

impl BranchPredictorConfig {
    const fn default_btb() -> usize {
        defaults::BTB_SIZE
    }
    const fn default_ras() -> usize {
        defaults::RAS_SIZE
    }
    const fn default_ghr_bits() -> u32 {
        defaults::GHR_BITS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        power_of_two("branch_predictor.btb_size", self.btb_size as u64)?;
        nonzero_usize("branch_predictor.ras_size", self.ras_size)?;
        in_range(
            "branch_predictor.history_bits",
            u64::from(self.history_bits),
            1,
            24,
        )
    }
}

impl Default for BranchPredictorConfig {
    fn default() -> Self {
        Self {
            kind: BranchPredictorKind::default(),
            btb_size: defaults::BTB_SIZE,
            ras_size: defaults::RAS_SIZE,
            history_bits: defaults::GHR_BITS,
        }
    }
}

/// Cache replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least recently used.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Bit-based pseudo-LRU.
    #[serde(alias = "Plru")]
    Plru,
    /// First in, first out.
    #[serde(alias = "Fifo")]
    Fifo,
    /// Pseudo-random.
    #[serde(alias = "Random")]
    Random,
    /// Most recently used.
    #[serde(alias = "Mru")]
    Mru,
}

/// Hardware prefetcher attached to a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Prefetcher {
    /// No prefetching.
    #[default]
    None,
    /// Next sequential line(s) on every access.
    NextLine,
    /// Per-region constant-stride detection.
    Stride,
}

/// One cache level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Capacity in bytes.
    pub size_bytes: usize,
    /// Line size in bytes.
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,
    /// Associativity.
    #[serde(alias = "assoc")]
    pub ways: usize,
    /// Hit latency in cycles (tag plus data).
    #[serde(alias = "tag_latency")]
    pub latency: u64,
    /// Extra cycles to return a fill to the requester.
    #[serde(default = "CacheConfig::default_response_latency")]
    pub response_latency: u64,
    /// Outstanding line misses.
    pub mshrs: usize,
    /// Replacement policy.
    #[serde(default)]
    pub policy: ReplacementPolicy,
    /// Prefetcher.
    #[serde(default)]
    pub prefetcher: Prefetcher,
    /// Stride prefetcher table entries.
    #[serde(default = "CacheConfig::default_prefetch_table")]
    pub prefetch_table_size: usize,
    /// Lines prefetched per trigger.
    #[serde(default = "CacheConfig::default_prefetch_degree")]
    pub prefetch_degree: usize,
}

impl CacheConfig {
    const fn default_line() -> usize {
        defaults::CACHE_LINE
    }
    const fn default_response_latency() -> u64 {
        defaults::RESPONSE_LATENCY
    }
    const fn default_prefetch_table() -> usize {
        defaults::PREFETCH_TABLE_SIZE
    }
    const fn default_prefetch_degree() -> usize {
        defaults::PREFETCH_DEGREE
    }

    /// Number of sets.
    pub const fn num_sets(&self) -> usize {
        self.size_bytes / self.line_bytes / self.ways
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        nonzero_usize(name, self.size_bytes)?;
        nonzero_usize(name, self.ways)?;
        nonzero_usize(name, self.mshrs)?;
        nonzero(name, self.latency)?;
        power_of_two(name, self.line_bytes as u64)?;
        if self.size_bytes % (self.line_bytes * self.ways) != 0 {
            return Err(ConfigError::Inconsistent(format!(
                "{name}: size {} is not a multiple of line size x ways",
                self.size_bytes
            )));
        }
        power_of_two(name, self.num_sets() as u64)?;
        if self.prefetcher == Prefetcher::Stride {
            power_of_two(name, self.prefetch_table_size as u64)?;
        }
        Ok(())
    }
}

/// A crossbar between cache levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbarConfig {
    /// Data path width in bytes per cycle.
    pub width_bytes: u64,
    /// Cycles to accept a request.
    pub frontend_latency: u64,
    /// Cycles to forward a request downstream.
    pub forward_latency: u64,
    /// Cycles to return a response upstream.
    pub response_latency: u64,
}

impl XbarConfig {
    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        nonzero(name, self.width_bytes)
    }
}

/// Cache hierarchy: L1I and L1D behind an L2 crossbar, and a shared L2 on the system crossbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHierarchyConfig {
    /// L1 instruction cache.
    pub l1_i: CacheConfig,
    /// L1 data cache.
    pub l1_d: CacheConfig,
    /// Shared L2 cache.
    pub l2: CacheConfig,
    /// Crossbar between the L1s and the L2.
    pub l2_xbar: XbarConfig,
    /// Crossbar between the L2 and the memory controller.
    pub system_xbar: XbarConfig,
    /// L2 evictions back-invalidate L1 copies.
    #[serde(default)]
    pub inclusive: bool,
}

impl CacheHierarchyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.l1_i.validate("cache.l1_i")?;
        self.l1_d.validate("cache.l1_d")?;
        self.l2.validate("cache.l2")?;
        self.l2_xbar.validate("cache.l2_xbar.width_bytes")?;
        self.system_xbar.validate("cache.system_xbar.width_bytes")?;
        if self.l1_i.line_bytes != self.l2.line_bytes || self.l1_d.line_bytes != self.l2.line_bytes
        {
            return Err(ConfigError::Inconsistent(
                "all cache levels must share one line size".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        let level = |size_bytes, ways, latency, mshrs, prefetcher| CacheConfig {
            size_bytes,
            line_bytes: defaults::CACHE_LINE,
            ways,
            latency,
            response_latency: defaults::RESPONSE_LATENCY,
            mshrs,
            policy: ReplacementPolicy::Lru,
            prefetcher,
            prefetch_table_size: defaults::PREFETCH_TABLE_SIZE,
            prefetch_degree: defaults::PREFETCH_DEGREE,
        };
        Self {
            l1_i: level(
                defaults::L1I_SIZE,
                defaults::L1I_WAYS,
                defaults::L1I_LATENCY,
                defaults::L1I_MSHRS,
                Prefetcher::NextLine,
            ),
            l1_d: level(
                defaults::L1D_SIZE,
                defaults::L1D_WAYS,
                defaults::L1D_LATENCY,
                defaults::L1D_MSHRS,
                Prefetcher::Stride,
            ),
            l2: level(
                defaults::L2_SIZE,
                defaults::L2_WAYS,
                defaults::L2_LATENCY,
                defaults::L2_MSHRS,
                Prefetcher::None,
            ),
            l2_xbar: XbarConfig {
                width_bytes: defaults::L2_XBAR_WIDTH,
                frontend_latency: defaults::L2_XBAR_FRONTEND,
                forward_latency: defaults::L2_XBAR_FORWARD,
                response_latency: defaults::L2_XBAR_RESPONSE,
            },
            system_xbar: XbarConfig {
                width_bytes: defaults::SYSTEM_XBAR_WIDTH,
                frontend_latency: defaults::SYSTEM_XBAR_FRONTEND,
                forward_latency: defaults::SYSTEM_XBAR_FORWARD,
                response_latency: defaults::SYSTEM_XBAR_RESPONSE,
            },
            inclusive: false,
        }
    }
}

/// Memory controller implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryController {
    /// Fixed latency per access.
    Simple,
    /// Banked DRAM with open-row timing.
    #[default]
    #[serde(alias = "DRAM")]
    Dram,
}

/// DRAM organisation and timing, in picoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DramTiming {
    /// Ranks per channel.
    pub ranks: usize,
    /// Banks per rank.
    pub banks_per_rank: usize,
    /// Row buffer size in bytes.
    pub row_buffer_bytes: u64,
    /// Activate to read.
    #[serde(alias = "tRCD")]
    pub t_rcd_ps: u64,
    /// Read to data (CAS latency).
    #[serde(alias = "tCL")]
    pub t_cl_ps: u64,
    /// Precharge.
    #[serde(alias = "tRP")]
    pub t_rp_ps: u64,
    /// Activate to precharge.
    #[serde(alias = "tRAS")]
    pub t_ras_ps: u64,
    /// Data burst on the bus.
    #[serde(alias = "tBURST")]
    pub t_burst_ps: u64,
    /// Refresh interval.
    #[serde(alias = "tREFI")]
    pub t_refi_ps: u64,
    /// Refresh duration.
    #[serde(alias = "tRFC")]
    pub t_rfc_ps: u64,
    /// Controller frontend (request queueing) latency.
    pub frontend_latency_ps: u64,
    /// Controller backend (response) latency.
    pub backend_latency_ps: u64,
}

impl Default for DramTiming {
    fn default() -> Self {
        Self {
            ranks: defaults::DRAM_RANKS,
            banks_per_rank: defaults::DRAM_BANKS,
            row_buffer_bytes: defaults::DRAM_ROW_BUFFER,
            t_rcd_ps: defaults::T_RCD_PS,
            t_cl_ps: defaults::T_CL_PS,
            t_rp_ps: defaults::T_RP_PS,
            t_ras_ps: defaults::T_RAS_PS,
            t_burst_ps: defaults::T_BURST_PS,
            t_refi_ps: defaults::T_REFI_PS,
            t_rfc_ps: defaults::T_RFC_PS,
            frontend_latency_ps: defaults::DRAM_FRONTEND_PS,
            backend_latency_ps: defaults::DRAM_BACKEND_PS,
        }
    }
}

/// Main memory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Controller implementation.
    #[serde(default)]
    pub controller: MemoryController,
    /// Physical memory size; accesses beyond it fault.
    #[serde(default = "MemoryConfig::default_size")]
    pub size_bytes: u64,
    /// Latency of the simple controller in cycles.
    #[serde(default = "MemoryConfig::default_simple_latency")]
    pub simple_latency: u64,
    /// DRAM timing for the DRAM controller.
    #[serde(default)]
    pub dram: DramTiming,
}

impl MemoryConfig {
    const fn default_size() -> u64 {
        defaults::MEM_SIZE
    }
    const fn default_simple_latency() -> u64 {
        defaults::SIMPLE_LATENCY
    }

    fn validate(&self) -> Result<(), ConfigError> {
        nonzero("memory.size_bytes", self.size_bytes)?;
        nonzero("memory.simple_latency", self.simple_latency)?;
        let d = &self.dram;
        nonzero_usize("memory.dram.ranks", d.ranks)?;
        power_of_two("memory.dram.banks_per_rank", d.banks_per_rank as u64)?;
        power_of_two("memory.dram.row_buffer_bytes", d.row_buffer_bytes)?;
        nonzero("memory.dram.t_burst_ps", d.t_burst_ps)?;
        if d.t_rfc_ps >= d.t_refi_ps {
            return Err(ConfigError::Inconsistent(
                "memory.dram.t_rfc_ps must be shorter than memory.dram.t_refi_ps".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            controller: MemoryController::default(),
            size_bytes: defaults::MEM_SIZE,
            simple_latency: defaults::SIMPLE_LATENCY,
            dram: DramTiming::default(),
        }
    }
}
