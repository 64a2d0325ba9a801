//! Return Address Stack (RAS).
//!
//! The RAS is a specialized predictor for function return addresses. It operates
//! as a hardware stack that pushes addresses on function calls and pops them
//! on returns. Each hardware thread owns one; fetch updates it speculatively and
//! restores a saved copy when a squash discards the calls and returns it saw.

use crate::common::Addr;

/// Return Address Stack structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ras {
    stack: Vec<Addr>,
    ptr: usize,
    capacity: usize,
}

impl Ras {
    /// Creates a new Return Address Stack with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: vec![0; capacity],
            ptr: 0,
            capacity,
        }
    }

    /// Pushes a return address onto the stack.
    ///
    /// If the stack is full, the oldest entry is dropped to keep the most recent
    /// call history.
    pub fn push(&mut self, addr: Addr) {
        if self.capacity == 0 {
            return;
        }
        if self.ptr == self.capacity {
            self.stack.rotate_left(1);
            self.ptr -= 1;
        }
        self.stack[self.ptr] = addr;
        self.ptr += 1;
    }

    /// Pops a return address from the stack.
    pub fn pop(&mut self) -> Option<Addr> {
        if self.ptr == 0 {
            None
        } else {
            self.ptr -= 1;
            Some(self.stack[self.ptr])
        }
    }

    /// Peeks at the top of the stack without removing the entry.
    pub fn top(&self) -> Option<Addr> {
        self.ptr.checked_sub(1).map(|i| self.stack[i])
    }

    /// Number of valid entries.
    pub const fn depth(&self) -> usize {
        self.ptr
    }
}
