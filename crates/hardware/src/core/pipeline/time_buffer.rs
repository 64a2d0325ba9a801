//! Delayed inter-stage communication.
//!
//! A `TimeBuffer` is a fixed-depth ring of per-cycle slots. A producer writes the slot for
//! the current cycle (`wire(0)`); a consumer `d` cycles downstream reads `wire(-d)`. Each
//! `advance` ages every slot by one cycle and recycles the oldest as the new current slot.

/// Ring of per-cycle values.
#[derive(Clone, Debug)]
pub struct TimeBuffer<T> {
    slots: Vec<T>,
    /// Slot index of the current cycle.
    base: usize,
}

impl<T: Default> TimeBuffer<T> {
    /// Creates a buffer remembering `depth` past cycles.
    pub fn new(depth: usize) -> Self {
        let mut slots = Vec::with_capacity(depth + 1);
        slots.resize_with(depth + 1, T::default);
        Self { slots, base: 0 }
    }

    /// Number of past cycles retained.
    pub fn depth(&self) -> usize {
        self.slots.len() - 1
    }

    fn slot(&self, age: usize) -> usize {
        debug_assert!(age <= self.depth(), "time buffer read beyond its depth");
        (self.base + self.slots.len() - age % self.slots.len()) % self.slots.len()
    }

    /// The value written `age` cycles ago (0 = this cycle).
    pub fn wire(&self, age: usize) -> &T {
        &self.slots[self.slot(age)]
    }

    /// Mutable access to the value written `age` cycles ago.
    pub fn wire_mut(&mut self, age: usize) -> &mut T {
        let slot = self.slot(age);
        &mut self.slots[slot]
    }

    /// The slot written this cycle.
    pub fn current(&mut self) -> &mut T {
        self.wire_mut(0)
    }

    /// Moves to the next cycle; the oldest slot is cleared and becomes the current one.
    pub fn advance(&mut self) {
        self.base = (self.base + 1) % self.slots.len();
        self.slots[self.base] = T::default();
    }

    /// Visits every slot.
    pub fn for_each_mut(&mut self, f: impl FnMut(&mut T)) {
        self.slots.iter_mut().for_each(f);
    }
}
