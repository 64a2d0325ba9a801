//! Timestamped event queue.
//!
//! A min-heap of events keyed by `(cycle, insertion order)`. Events due in the same cycle
//! come out in the order they were scheduled, which keeps runs deterministic. Squashes
//! cancel in-flight work with `retain`.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::common::Cycle;

#[derive(Debug)]
struct Scheduled<E> {
    when: Cycle,
    order: u64,
    event: E,
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        (self.when, self.order) == (other.when, other.order)
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.when, self.order).cmp(&(other.when, other.order))
    }
}

/// Min-heap of events ordered by due cycle, then by scheduling order.
#[derive(Debug)]
pub struct EventQueue<E> {
    heap: BinaryHeap<Reverse<Scheduled<E>>>,
    next_order: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_order: 0,
        }
    }
}

impl<E> EventQueue<E> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` to fire at cycle `when`.
    pub fn schedule(&mut self, when: Cycle, event: E) {
        let order = self.next_order;
        self.next_order += 1;
        self.heap.push(Reverse(Scheduled { when, order, event }));
    }

    /// Removes and returns the earliest event due at or before `now`.
    pub fn pop_due(&mut self, now: Cycle) -> Option<(Cycle, E)> {
        if self.heap.peek().is_some_and(|Reverse(s)| s.when <= now) {
            self.heap.pop().map(|Reverse(s)| (s.when, s.event))
        } else {
            None
        }
    }

    /// Removes every event due at or before `now`, in firing order.
    pub fn drain_due(&mut self, now: Cycle) -> Vec<E> {
        let mut out = Vec::new();
        while let Some((_, event)) = self.pop_due(now) {
            out.push(event);
        }
        out
    }

    /// Cycle of the earliest pending event.
    pub fn next_time(&self) -> Option<Cycle> {
        self.heap.peek().map(|Reverse(s)| s.when)
    }

    /// Keeps only the events for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        self.heap.retain(|Reverse(s)| keep(&s.event));
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
