/// Time-ordered event queue.
///
/// A pairing heap keyed by `(time, event_id)`. Insertion melds a single
/// node into the root in O(1); extract-min re-links the root's children
/// with the two-pass pairing strategy in O(log n) amortized time. That
/// profile suits simulations, which schedule far more than they pop at
/// any one moment.
///
/// Heap nodes live in a `SlotMap` arena, so a `QueueHandle` stays valid
/// for as long as its event is queued and is never reused for another
/// node while it is live.

use slotmap::{new_key_type, SlotMap};

use crate::event::Event;

new_key_type! {
    /// Stable handle to a queued event's heap node.
    pub struct QueueHandle;
}

#[derive(Debug, Clone)]
struct Node {
    event: Event,
    /// Leftmost child.
    child: Option<QueueHandle>,
    /// Next sibling to the right.
    sibling: Option<QueueHandle>,
}

/// Min-priority queue of events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    nodes: SlotMap<QueueHandle, Node>,
    root: Option<QueueHandle>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event. O(1).
    pub fn insert(&mut self, event: Event) -> QueueHandle {
        let handle = self.nodes.insert(Node {
            event,
            child: None,
            sibling: None,
        });
        self.root = Some(match self.root {
            Some(root) => self.meld(root, handle),
            None => handle,
        });
        handle
    }

    /// The earliest event, without removing it. O(1).
    pub fn peek_min(&self) -> Option<&Event> {
        self.root.map(|root| &self.nodes[root].event)
    }

    /// Remove and return the earliest event.
    ///
    /// Returns `None` on an empty queue.
    pub fn extract_min(&mut self) -> Option<Event> {
        let root = self.root.take()?;
        let node = self.nodes.remove(root)?;
        self.root = self.merge_pairs(node.child);
        Some(node.event)
    }

    /// Look up a queued event by handle. `None` once it has been extracted.
    pub fn get(&self, handle: QueueHandle) -> Option<&Event> {
        self.nodes.get(handle).map(|node| &node.event)
    }

    /// Number of queued events.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Queued events in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.nodes.values().map(|node| &node.event)
    }

    /// Discard every queued event.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Drain all events in dispatch order into a `Vec`.
    pub fn drain_ordered(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.len());
        while let Some(event) = self.extract_min() {
            events.push(event);
        }
        events
    }

    /// Link two heap roots; the later one becomes the leftmost child of
    /// the earlier one. Both must have no siblings.
    fn meld(&mut self, a: QueueHandle, b: QueueHandle) -> QueueHandle {
        let (parent, child) = if self.nodes[b].event < self.nodes[a].event {
            (b, a)
        } else {
            (a, b)
        };
        self.nodes[child].sibling = self.nodes[parent].child;
        self.nodes[parent].child = Some(child);
        parent
    }

    /// Combine a sibling list into a single heap: meld pairs left to
    /// right, then fold the results right to left.
    fn merge_pairs(&mut self, first: Option<QueueHandle>) -> Option<QueueHandle> {
        let mut pairs = Vec::new();
        let mut cursor = first;
        while let Some(a) = cursor {
            match self.nodes[a].sibling.take() {
                Some(b) => {
                    cursor = self.nodes[b].sibling.take();
                    pairs.push(self.meld(a, b));
                }
                None => {
                    pairs.push(a);
                    cursor = None;
                }
            }
        }

        let mut root = pairs.pop()?;
        while let Some(next) = pairs.pop() {
            root = self.meld(next, root);
        }
        Some(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::event::{EventId, EventIdGen, Operation};
    use crate::time::VirtualTime;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::BinaryHeap;
    use std::cmp::Reverse;

    struct Fixture {
        queue: EventQueue,
        ids: EventIdGen,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                queue: EventQueue::new(),
                ids: EventIdGen::new(),
            }
        }

        fn push(&mut self, time: u64) -> QueueHandle {
            let event = Event::new(
                self.ids.next_id(),
                VirtualTime::new(time),
                Operation::from_static("tick"),
                EntityId::new(0),
            );
            self.queue.insert(event)
        }

        fn times(&mut self) -> Vec<u64> {
            self.queue
                .drain_ordered()
                .iter()
                .map(|e| e.time().ticks())
                .collect()
        }
    }

    #[test]
    fn test_insertion_order_independence() {
        let mut f = Fixture::new();
        f.push(5);
        f.push(3);
        f.push(1);
        assert_eq!(f.times(), vec![1, 3, 5]);
    }

    #[test]
    fn test_fifo_at_same_time() {
        let mut f = Fixture::new();
        for _ in 0..10 {
            f.push(7);
        }
        let ids: Vec<u64> = f.queue.drain_ordered().iter().map(|e| e.id().raw()).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.peek_min().is_none());
        assert!(queue.extract_min().is_none());
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut f = Fixture::new();
        f.push(4);
        f.push(2);
        assert_eq!(f.queue.peek_min().map(|e| e.time().ticks()), Some(2));
        assert_eq!(f.queue.peek_min().map(|e| e.time().ticks()), Some(2));
        assert_eq!(f.queue.len(), 2);
    }

    #[test]
    fn test_handles_stay_valid_until_extracted() {
        let mut f = Fixture::new();
        let late = f.push(50);
        let early = f.push(10);
        f.push(30);

        let extracted = f.queue.extract_min().unwrap();
        assert_eq!(extracted.time(), VirtualTime::new(10));
        assert!(f.queue.get(early).is_none());
        assert_eq!(f.queue.get(late).map(|e| e.time().ticks()), Some(50));
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut f = Fixture::new();
        let h = f.push(1);
        f.push(2);
        f.queue.reset();
        assert!(f.queue.is_empty());
        assert!(f.queue.get(h).is_none());
        assert!(f.queue.extract_min().is_none());

        f.push(9);
        assert_eq!(f.times(), vec![9]);
    }

    #[test]
    fn test_size_tracks_inserts_minus_extractions() {
        let mut f = Fixture::new();
        for t in 0..20 {
            f.push(t * 3 % 11);
        }
        for _ in 0..7 {
            f.queue.extract_min();
        }
        assert_eq!(f.queue.len(), 13);
    }

    #[test]
    fn test_random_inserts_extract_sorted() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut f = Fixture::new();
        let mut expected = Vec::new();
        for _ in 0..2_000 {
            let t = rng.gen_range(0..500u64);
            f.push(t);
            expected.push(t);
        }
        expected.sort_unstable();
        assert_eq!(f.times(), expected);
    }

    #[test]
    fn test_interleaved_matches_reference_heap() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
        let mut f = Fixture::new();
        let mut reference: BinaryHeap<Reverse<(u64, u64)>> = BinaryHeap::new();

        for _ in 0..5_000 {
            if rng.gen_bool(0.6) || reference.is_empty() {
                let t = rng.gen_range(0..1_000u64);
                let id = f.ids.peek().raw();
                f.push(t);
                reference.push(Reverse((t, id)));
            } else {
                let got = f.queue.extract_min().map(|e| (e.time().ticks(), e.id().raw()));
                let want = reference.pop().map(|Reverse(k)| k);
                assert_eq!(got, want);
            }
            assert_eq!(f.queue.len(), reference.len());
        }

        while let Some(Reverse(want)) = reference.pop() {
            let got = f.queue.extract_min().map(|e| (e.time().ticks(), e.id().raw()));
            assert_eq!(got, Some(want));
        }
        assert!(f.queue.is_empty());
    }

    #[test]
    fn test_long_sibling_chain() {
        // Ascending inserts hang every node off the root as a sibling list.
        let mut f = Fixture::new();
        for t in 0..100_000 {
            f.push(t);
        }
        let first = f.queue.extract_min().unwrap();
        assert_eq!(first.id(), EventId::new(0));
        assert_eq!(f.queue.peek_min().map(|e| e.time().ticks()), Some(1));
        assert_eq!(f.queue.len(), 99_999);
    }
}
