//! Simulator: owns the core and the instruction source side-by-side.
//!
//! Keeping the source outside `Cpu` lets every stage borrow the core mutably while fetch and
//! commit still reach the source. The run loop stops when every stream has drained, when
//! `max_cycles` is reached, or with an error when nothing commits for `deadlock_threshold`
//! cycles.

use std::time::Instant;

use tracing::{debug, info};

use crate::common::{SimError, SimResult};
use crate::config::Config;
use crate::core::Cpu;
use crate::isa::InstSource;
use crate::stats::SimStats;

/// Top-level simulator: the core plus the instruction streams it runs.
#[derive(Debug)]
pub struct Simulator<S> {
    /// The core and its memory hierarchy.
    pub cpu: Cpu,
    /// Instruction streams.
    pub source: S,
}

impl<S: InstSource> Simulator<S> {
    /// Validates `config` and builds a core for `source`.
    ///
    /// The source may provide fewer streams than `general.num_threads`; the remaining
    /// hardware threads stay idle. Providing more is an error.
    pub fn new(config: &Config, source: S) -> SimResult<Self> {
        config.validate()?;
        let streams = source.num_threads();
        if streams == 0 {
            return Err(SimError::Trace("instruction source has no threads".into()));
        }
        if streams > config.general.num_threads {
            return Err(SimError::Trace(format!(
                "instruction source has {streams} threads but the core is configured for {}",
                config.general.num_threads
            )));
        }
        debug!(
            threads = config.general.num_threads,
            streams, "simulator created"
        );
        Ok(Self {
            cpu: Cpu::new(config),
            source,
        })
    }

    /// Advances the simulation by one clock cycle.
    pub fn tick(&mut self) {
        self.cpu.tick(&mut self.source);
    }

    /// Runs until every stream has drained or `max_cycles` is reached.
    ///
    /// # Returns
    ///
    /// The final statistics, with `host_seconds` filled in.
    pub fn run(&mut self) -> SimResult<SimStats> {
        let started = Instant::now();
        let general = &self.cpu.config.general;
        let (max_cycles, threshold) = (general.max_cycles, general.deadlock_threshold);

        while !self.cpu.is_drained() {
            if max_cycles != 0 && self.cpu.now >= max_cycles {
                info!(cycle = self.cpu.now, "cycle limit reached");
                break;
            }
            self.tick();
            let idle = self.cpu.now - self.cpu.last_commit;
            if idle > threshold {
                return Err(SimError::Deadlock {
                    cycle: self.cpu.now,
                    idle_cycles: idle,
                });
            }
        }

        let mut stats = self.cpu.stats();
        stats.host_seconds = started.elapsed().as_secs_f64();
        info!(
            cycles = stats.cycles,
            committed = stats.committed,
            ipc = stats.ipc(),
            "simulation finished"
        );
        Ok(stats)
    }

    /// Splits the simulator into its core and source.
    pub fn into_parts(self) -> (Cpu, S) {
        (self.cpu, self.source)
    }
}
