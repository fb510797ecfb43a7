//! Arrival Queue
//!
//! FIFO of first-sighted records waiting to be promoted into the store.
//! Deduplicated by id: a record whose id is already queued replaces the
//! queued copy in place and keeps its turn.

use htree_model::NodeRecord;
use std::collections::VecDeque;

/// Pending first sightings
#[derive(Debug, Default, Clone)]
pub struct ArrivalQueue {
    pending: VecDeque<NodeRecord>,
}

impl ArrivalQueue {
    /// Create empty queue
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a record, returning `false` when it merged into a queued one
    pub fn push(&mut self, record: NodeRecord) -> bool {
        match self.pending.iter_mut().find(|queued| queued.id == record.id) {
            Some(queued) => {
                *queued = record;
                false
            }
            None => {
                self.pending.push_back(record);
                true
            }
        }
    }

    /// Oldest pending record
    #[inline]
    pub fn pop(&mut self) -> Option<NodeRecord> {
        self.pending.pop_front()
    }

    /// Take everything, oldest first
    pub fn drain_all(&mut self) -> Vec<NodeRecord> {
        self.pending.drain(..).collect()
    }

    /// Whether `id` is waiting
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.pending.iter().any(|r| r.id == id)
    }

    /// Pending ids, oldest first
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|r| r.id.as_str())
    }

    /// Number of pending records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything pending
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut queue = ArrivalQueue::new();
        queue.push(NodeRecord::new("1", "0", "a"));
        queue.push(NodeRecord::new("1.1", "1", "b"));
        queue.push(NodeRecord::new("1.2", "1", "c"));

        let ids: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|r| r.id).collect();
        assert_eq!(ids, ["1", "1.1", "1.2"]);
    }

    #[test]
    fn duplicate_id_merges_and_keeps_turn() {
        let mut queue = ArrivalQueue::new();
        assert!(queue.push(NodeRecord::new("1", "0", "first")));
        assert!(queue.push(NodeRecord::new("2", "0", "other")));
        assert!(!queue.push(NodeRecord::new("1", "0", "second")));

        assert_eq!(queue.len(), 2);
        let head = queue.pop().unwrap();
        assert_eq!(head.id, "1");
        assert_eq!(head.text, "second");
    }

    #[test]
    fn drain_all_empties_queue() {
        let mut queue = ArrivalQueue::new();
        queue.push(NodeRecord::new("1", "0", "a"));
        queue.push(NodeRecord::new("2", "0", "b"));

        assert_eq!(queue.drain_all().len(), 2);
        assert!(queue.is_empty());
        assert!(!queue.contains("1"));
    }
}
