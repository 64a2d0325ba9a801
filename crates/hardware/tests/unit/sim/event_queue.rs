//! Event Queue Tests.

use firestorm_core::sim::EventQueue;
use proptest::prelude::*;

#[test]
fn nothing_fires_early() {
    let mut q = EventQueue::new();
    q.schedule(10, 'x');
    assert_eq!(q.next_time(), Some(10));
    assert!(q.drain_due(9).is_empty());
    assert_eq!(q.len(), 1);
    assert_eq!(q.pop_due(10), Some((10, 'x')));
}

proptest! {
    /// Draining yields events by due cycle, and by scheduling order within a cycle.
    #[test]
    fn drains_in_time_then_schedule_order(times in proptest::collection::vec(0u64..20, 0..64)) {
        let mut q = EventQueue::new();
        for (order, &when) in times.iter().enumerate() {
            q.schedule(when, (when, order));
        }
        let drained = q.drain_due(u64::MAX);
        let mut expected: Vec<(u64, usize)> = times.iter().copied().zip(0..).collect();
        expected.sort_unstable();
        prop_assert_eq!(drained, expected);
        prop_assert!(q.is_empty());
    }
}
