//! Scalar types used for timing, addressing, and program order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulated clock cycle (core clock domain).
pub type Cycle = u64;

/// A byte address in the simulated physical address space.
pub type Addr = u64;

/// Hardware thread (SMT context) index.
pub type ThreadId = usize;

/// Global program-order sequence number assigned to each micro-op at fetch.
///
/// Sequence numbers are unique across all hardware threads and strictly increase
/// in fetch order, so within one thread a smaller number is always older.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SeqNum(pub u64);

impl SeqNum {
    /// The sequence number immediately after this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sn:{}", self.0)
    }
}
