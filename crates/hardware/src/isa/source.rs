//! Instruction stream providers.
//!
//! The core walks each hardware thread's committed-path stream by position (`index`). Fetch
//! asks for `inst_at(tid, index)` while it is on the predicted-correct path; once a
//! misprediction sends it down a wrong path it asks for `wrong_path(tid, pc)` instead until
//! the branch resolves and fetch is redirected back to a stream index.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::inst::StaticInst;
use crate::common::{Addr, Fault, SimError, SimResult, ThreadId};

/// Supplies pre-decoded micro-ops to the pipeline.
pub trait InstSource {
    /// Number of hardware threads with a stream.
    fn num_threads(&self) -> usize;

    /// The micro-op at position `index` of thread `tid`'s committed-path stream, or `None`
    /// once the stream has ended.
    fn inst_at(&self, tid: ThreadId, index: u64) -> Option<StaticInst>;

    /// A micro-op fetched from `pc` on a mispredicted path.
    ///
    /// Wrong-path micro-ops never commit. The default is a no-op.
    fn wrong_path(&self, _tid: ThreadId, pc: Addr) -> StaticInst {
        StaticInst::nop(pc)
    }

    /// Called when the micro-op at `index` faults at commit, after the trap latency.
    ///
    /// Execution then resumes at `index + 1`.
    fn on_fault(&mut self, _tid: ThreadId, _index: u64, _fault: &Fault) {}
}

impl<T: InstSource + ?Sized> InstSource for Box<T> {
    fn num_threads(&self) -> usize {
        (**self).num_threads()
    }

    fn inst_at(&self, tid: ThreadId, index: u64) -> Option<StaticInst> {
        (**self).inst_at(tid, index)
    }

    fn wrong_path(&self, tid: ThreadId, pc: Addr) -> StaticInst {
        (**self).wrong_path(tid, pc)
    }

    fn on_fault(&mut self, tid: ThreadId, index: u64, fault: &Fault) {
        (**self).on_fault(tid, index, fault);
    }
}

/// A fixed, pre-recorded instruction stream per thread.
///
/// JSON layout:
///
/// ```json
/// { "threads": [ [ { "pc": 4096, "op_class": "IntAlu", "dests": [ {"class": "int", "index": 1} ] } ] ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceProgram {
    /// Committed-path stream of each thread.
    pub threads: Vec<Vec<StaticInst>>,
    /// Faults handled so far, in order.
    #[serde(skip)]
    pub handled_faults: Vec<(ThreadId, u64, Fault)>,
}

impl TraceProgram {
    /// Builds a single-threaded program.
    pub fn single(insts: Vec<StaticInst>) -> Self {
        Self::new(vec![insts])
    }

    /// Builds a program with one stream per thread.
    pub const fn new(threads: Vec<Vec<StaticInst>>) -> Self {
        Self {
            threads,
            handled_faults: Vec::new(),
        }
    }

    /// Parses a program from JSON text.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let program: Self = serde_json::from_str(json)?;
        program.check()?;
        Ok(program)
    }

    /// Loads a program from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let program: Self = serde_json::from_str(&text).map_err(|source| SimError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        program.check()?;
        Ok(program)
    }

    fn check(&self) -> SimResult<()> {
        if self.threads.is_empty() {
            return Err(SimError::Trace("program has no threads".into()));
        }
        for (tid, stream) in self.threads.iter().enumerate() {
            for (index, inst) in stream.iter().enumerate() {
                if inst.op_class.is_mem() && inst.mem.is_none() {
                    return Err(SimError::Trace(format!(
                        "thread {tid} index {index}: {} without a memory access",
                        inst.op_class
                    )));
                }
                if inst.size == 0 {
                    return Err(SimError::Trace(format!(
                        "thread {tid} index {index}: zero-sized instruction"
                    )));
                }
                if let Some(reg) = inst
                    .srcs
                    .iter()
                    .chain(&inst.dests)
                    .find(|reg| usize::from(reg.index) >= reg.class.num_arch_regs())
                {
                    return Err(SimError::Trace(format!(
                        "thread {tid} index {index}: {} register {} out of range (0..{})",
                        reg.class.name(),
                        reg.index,
                        reg.class.num_arch_regs()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of micro-ops across all threads.
    pub fn len(&self) -> usize {
        self.threads.iter().map(Vec::len).sum()
    }

    /// True if every stream is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InstSource for TraceProgram {
    fn num_threads(&self) -> usize {
        self.threads.len()
    }

    fn inst_at(&self, tid: ThreadId, index: u64) -> Option<StaticInst> {
        self.threads
            .get(tid)
            .and_then(|stream| stream.get(usize::try_from(index).ok()?))
            .cloned()
    }

    fn on_fault(&mut self, tid: ThreadId, index: u64, fault: &Fault) {
        self.handled_faults.push((tid, index, *fault));
    }
}
