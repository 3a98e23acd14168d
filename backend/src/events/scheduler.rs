//! Time-ordered event queue with deterministic tie-breaking
//!
//! Events are kept in a binary min-heap keyed by `(time, sequence)`. The
//! sequence number is a per-scheduler counter stamped at insertion, so two
//! events at the same instant come out in the order they were scheduled.

use crate::core::SimTime;
use crate::models::ArrivalHandle;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// What an event activates when dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    /// Generator (by registry index) creates its next arrival
    Generator(usize),

    /// Arrival executes the activity under its cursor
    ///
    /// The token must match the arrival's current one; older activations
    /// are dropped on dispatch.
    Arrival(ArrivalHandle, u64),
}

/// A pending event
#[derive(Debug, Clone, Copy)]
pub struct ScheduledEvent {
    pub time: SimTime,

    /// Insertion order, breaks ties between equal times
    pub sequence: u64,

    pub target: EventTarget,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

/// Priority queue of pending events
///
/// # Example
///
/// ```rust
/// use queue_simulator_core_rs::events::{EventScheduler, EventTarget};
///
/// let mut scheduler = EventScheduler::new();
/// scheduler.schedule(5.0, EventTarget::Generator(0));
/// scheduler.schedule(1.0, EventTarget::Generator(1));
///
/// assert_eq!(scheduler.peek_time(), Some(1.0));
/// assert_eq!(scheduler.pop().unwrap().target, EventTarget::Generator(1));
/// assert_eq!(scheduler.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct EventScheduler {
    /// Min-heap ordered by (time, sequence)
    queue: BinaryHeap<Reverse<ScheduledEvent>>,

    /// Next sequence number to hand out
    sequence: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `target` at absolute time `time`
    ///
    /// # Panics
    /// Panics on a NaN time; callers validate delays before scheduling.
    pub fn schedule(&mut self, time: SimTime, target: EventTarget) {
        assert!(!time.is_nan(), "cannot schedule an event at NaN");

        let sequence = self.sequence;
        self.sequence += 1;
        self.queue.push(Reverse(ScheduledEvent {
            time,
            sequence,
            target,
        }));
    }

    /// Remove and return the earliest event
    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.queue.pop().map(|Reverse(event)| event)
    }

    /// Earliest event, left in place
    pub fn peek(&self) -> Option<&ScheduledEvent> {
        self.queue.peek().map(|Reverse(event)| event)
    }

    /// Time of the earliest event, if any
    pub fn peek_time(&self) -> Option<SimTime> {
        self.peek().map(|event| event.time)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop all pending events and restart the sequence counter
    pub fn clear(&mut self) {
        self.queue.clear();
        self.sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_ordering() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(3.0, EventTarget::Generator(3));
        scheduler.schedule(1.0, EventTarget::Generator(1));
        scheduler.schedule(2.0, EventTarget::Generator(2));

        let order: Vec<EventTarget> = std::iter::from_fn(|| scheduler.pop())
            .map(|e| e.target)
            .collect();
        assert_eq!(
            order,
            vec![
                EventTarget::Generator(1),
                EventTarget::Generator(2),
                EventTarget::Generator(3),
            ]
        );
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let mut scheduler = EventScheduler::new();
        for index in 0..10 {
            scheduler.schedule(4.0, EventTarget::Generator(index));
        }

        for expected in 0..10 {
            assert_eq!(
                scheduler.pop().unwrap().target,
                EventTarget::Generator(expected)
            );
        }
        assert!(scheduler.pop().is_none());
    }

    #[test]
    fn test_clear_resets_sequence() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(1.0, EventTarget::Generator(0));
        scheduler.clear();
        assert!(scheduler.is_empty());

        scheduler.schedule(1.0, EventTarget::Generator(0));
        assert_eq!(scheduler.peek().unwrap().sequence, 0);
    }

    #[test]
    #[should_panic(expected = "NaN")]
    fn test_nan_time_panics() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(f64::NAN, EventTarget::Generator(0));
    }
}
