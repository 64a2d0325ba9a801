//! Mock collaborators.

use firestorm_core::common::{Addr, Fault, ThreadId};
use firestorm_core::isa::{InstSource, StaticInst};
use mockall::mock;

// An instruction source whose calls can be scripted and verified.
mock! {
    pub Source {}
    impl InstSource for Source {
        fn num_threads(&self) -> usize;
        fn inst_at(&self, tid: ThreadId, index: u64) -> Option<StaticInst>;
        fn wrong_path(&self, tid: ThreadId, pc: Addr) -> StaticInst;
        fn on_fault(&mut self, tid: ThreadId, index: u64, fault: &Fault);
    }
}
