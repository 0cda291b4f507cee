use crate::core::types::{EventId, SimTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Secondary sort key of events sharing a timestamp.
///
/// Without loop mode `generation` is always 0 and events sort by creation
/// index. In loop mode `generation` counts how often the component already
/// ran at this timestamp, so a re-entering component sorts after its own
/// earlier occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TieBreak {
    pub generation: u32,
    pub index: usize,
}

/// Obligation to evaluate one component no earlier than `timestamp`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: SimTime,
    pub component: String,
    pub tie_break: TieBreak,
    /// Insertion order, the last resort of the ordering
    pub sequence: u64,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.tie_break == other.tie_break
            && self.sequence == other.sequence
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.tie_break.cmp(&self.tie_break))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Time-ordered queue of events
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Event>,
    sequence_counter: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for `component` at `timestamp`
    pub fn push(&mut self, component: &str, timestamp: SimTime, tie_break: TieBreak) -> EventId {
        let event = Event {
            id: EventId::new(),
            timestamp,
            component: component.to_string(),
            tie_break,
            sequence: self.sequence_counter,
        };
        let id = event.id;
        self.heap.push(event);
        self.sequence_counter += 1;
        id
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop()
    }

    /// Remove the next event if it is due at or before `time`
    pub fn pop_due(&mut self, time: SimTime) -> Option<Event> {
        match self.heap.peek() {
            Some(event) if event.timestamp <= time => self.heap.pop(),
            _ => None,
        }
    }

    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek()
    }

    /// Timestamp of the next event without removing it
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|event| event.timestamp)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pending events in execution order
    pub fn sorted(&self) -> Vec<Event> {
        let mut events = self.heap.clone().into_vec();
        // Reversed Ord, so descending order is execution order
        events.sort_by(|a, b| b.cmp(a));
        events
    }

    pub(crate) fn rename_component(&mut self, old: &str, new: &str) {
        let mut events = std::mem::take(&mut self.heap).into_vec();
        for event in &mut events {
            if event.component == old {
                event.component = new.to_string();
            }
        }
        self.heap = BinaryHeap::from(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(queue: &mut EventQueue) -> Vec<(SimTime, String)> {
        let mut seen = Vec::new();
        while let Some(event) = queue.pop() {
            seen.push((event.timestamp, event.component));
        }
        seen
    }

    #[test]
    fn test_orders_by_time_then_tie_break() {
        let mut queue = EventQueue::new();
        queue.push("C", 5, TieBreak { generation: 0, index: 2 });
        queue.push("B", 3, TieBreak { generation: 0, index: 1 });
        queue.push("A", 5, TieBreak { generation: 0, index: 0 });
        queue.push("A", 5, TieBreak { generation: 1, index: 0 });

        assert_eq!(
            order(&mut queue),
            vec![
                (3, "B".to_string()),
                (5, "A".to_string()),
                (5, "C".to_string()),
                (5, "A".to_string()),
            ]
        );
    }

    #[test]
    fn test_equal_keys_keep_insertion_order() {
        let mut queue = EventQueue::new();
        let tie = TieBreak { generation: 0, index: 0 };
        let first = queue.push("X", 1, tie);
        let second = queue.push("X", 1, tie);
        assert_eq!(queue.pop().map(|event| event.id), Some(first));
        assert_eq!(queue.pop().map(|event| event.id), Some(second));
    }

    #[test]
    fn test_pop_due_and_rename() {
        let mut queue = EventQueue::new();
        queue.push("A", 4, TieBreak { generation: 0, index: 0 });
        assert!(queue.pop_due(3).is_none());
        queue.rename_component("A", "Z");
        assert_eq!(queue.sorted()[0].component, "Z");
        assert_eq!(queue.pop_due(4).map(|event| event.component), Some("Z".to_string()));
        assert!(queue.is_empty());
    }
}
