//! In-memory priority queue with FIFO tie-breaking.
//!
//! Every wait queue in the scheduler (the CPU ready queue, each condition's
//! sleepers, and through the condition the alarm clock's sleepers) is one of
//! these.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::util::Priority;

/// A queued item tagged with its priority and arrival sequence.
#[derive(Debug)]
struct WaitEntry<T> {
    priority: Priority,
    seq: u64,
    item: T,
}

impl<T> PartialEq for WaitEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for WaitEntry<T> {}

impl<T> PartialOrd for WaitEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for WaitEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: the smallest priority number, then the
        // earliest sequence, must compare greatest.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority queue returning the numerically smallest priority first and,
/// among equal priorities, the item pushed earliest.
///
/// # Capacity
///
/// Arrival order is tracked with a `u64` push counter that is never reset.
/// The queue therefore accepts at most `u64::MAX` pushes over its lifetime;
/// the push after that panics instead of wrapping and reordering.
///
/// # Examples
///
/// ```
/// use prometheus_cpu_sched::infra::PriorityQueue;
/// use prometheus_cpu_sched::util::Priority;
///
/// let mut q = PriorityQueue::new();
/// q.push("b", Priority::new(5));
/// q.push("a", Priority::new(1));
/// q.push("c", Priority::new(5));
///
/// assert_eq!(q.pop(), Some("a"));
/// assert_eq!(q.pop(), Some("b"));
/// assert_eq!(q.pop(), Some("c"));
/// assert!(q.is_empty());
/// ```
#[derive(Debug)]
pub struct PriorityQueue<T> {
    heap: BinaryHeap<WaitEntry<T>>,
    pushes: u64,
}

impl<T> PriorityQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pushes: 0,
        }
    }

    /// Enqueue `item` at `priority`.
    ///
    /// # Panics
    ///
    /// Panics when the lifetime push counter is exhausted.
    pub fn push(&mut self, item: T, priority: Priority) {
        self.pushes = self
            .pushes
            .checked_add(1)
            .unwrap_or_else(|| panic!("priority queue sequence counter exhausted"));
        self.heap.push(WaitEntry {
            priority,
            seq: self.pushes,
            item,
        });
    }

    /// Enqueue `item` at [`Priority::LOWEST`].
    pub fn push_lowest(&mut self, item: T) {
        self.push(item, Priority::LOWEST);
    }

    /// Remove and return the most urgent item.
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|entry| entry.item)
    }

    /// The item [`pop`](Self::pop) would return next.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.heap.peek().map(|entry| &entry.item)
    }

    /// Priority of the front item.
    #[must_use]
    pub fn front_priority(&self) -> Option<Priority> {
        self.heap.peek().map(|entry| entry.priority)
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Iterate over queued items in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|entry| &entry.item)
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
