//! Fixed-capacity heap that keeps the most wanted items seen so far.
//!
//! The internal [`PriorityQueue`] runs in the opposite direction to what the
//! caller wants, so the least wanted retained item always sits at the top and
//! is the first to be evicted.
//!
//! ```text
//! Want::Largest, capacity 3:
//!
//! push 5, 2, 8     internal min-heap: [2, 5, 8]
//! push 10          -> evicts 2        [5, 8, 10]
//! push 1           -> evicts 1        [5, 8, 10]   (new item itself)
//! ```

use std::num::NonZeroUsize;

use strand_log::Logger;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::heap::{HeapItem, HeapOrder, PriorityQueue};

/// Which end of the priority range a bounded heap retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Want {
    /// Keep the largest priorities.
    Largest,
    /// Keep the smallest priorities.
    Smallest,
}

impl Want {
    /// `true` maps to [`Want::Largest`].
    #[inline]
    pub const fn from_largest(want_largest: bool) -> Self {
        if want_largest { Self::Largest } else { Self::Smallest }
    }

    /// Order whose top is the most wanted item.
    #[inline]
    pub const fn best_first(self) -> HeapOrder {
        match self {
            Self::Largest => HeapOrder::Max,
            Self::Smallest => HeapOrder::Min,
        }
    }

    /// Order whose top is the least wanted item.
    #[inline]
    pub const fn worst_first(self) -> HeapOrder {
        self.best_first().reverse()
    }
}

/// A heap holding at most `capacity` items, evicting the least wanted.
///
/// # Example
///
/// ```
/// use strand_collections::{BoundedHeap, Want};
///
/// let mut heap = BoundedHeap::new(2, Want::Largest).unwrap();
/// assert_eq!(heap.push(("a", 5)), None);
/// assert_eq!(heap.push(("b", 9)), None);
///
/// // Over capacity: the smallest retained item is evicted
/// assert_eq!(heap.push(("c", 7)), Some(("a", 5)));
///
/// // Too small to be kept: the new item comes straight back
/// assert_eq!(heap.push(("d", 1)), Some(("d", 1)));
///
/// assert_eq!(heap.pop(), Some(("b", 9)));
/// assert_eq!(heap.pop(), Some(("c", 7)));
/// assert_eq!(heap.pop(), None);
/// ```
#[derive(Debug, Clone)]
pub struct BoundedHeap<T: HeapItem> {
    heap: PriorityQueue<T>,
    capacity: usize,
    want: Want,
    logger: Logger,
}

impl<T: HeapItem> BoundedHeap<T> {
    /// Creates an empty bounded heap.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] if `capacity` is zero.
    pub fn new(capacity: usize, want: Want) -> Result<Self, ConfigError> {
        NonZeroUsize::new(capacity)
            .map(|capacity| Self::with_capacity(capacity, want))
            .ok_or(ConfigError::NotPositive { what: "capacity" })
    }

    /// Creates an empty bounded heap from an already validated capacity.
    pub fn with_capacity(capacity: NonZeroUsize, want: Want) -> Self {
        let capacity = capacity.get();
        Self {
            // One spare slot for the push that overflows
            heap: PriorityQueue::with_capacity(want.worst_first(), capacity + 1),
            capacity,
            want,
            logger: Logger::disabled(),
        }
    }

    /// Attaches a logger for diagnostic events.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        logger.emit(|| debug!(capacity = self.capacity, want = ?self.want, "bounded heap created"));
        self.logger = logger;
        self
    }

    /// Returns the number of retained items.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the maximum number of retained items.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns which end of the priority range is retained.
    #[inline]
    pub fn want(&self) -> Want {
        self.want
    }

    /// Returns the item that the next overflow would evict.
    #[inline]
    pub fn peek_least_wanted(&self) -> Option<&T> {
        self.heap.peek()
    }

    /// Inserts `item`, returning the evicted item if capacity was exceeded.
    ///
    /// The evicted item is the least wanted of the retained items plus
    /// `item`, so it may be `item` itself.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.heap.push(item);
        if self.heap.len() <= self.capacity {
            return None;
        }

        let evicted = self.heap.pop();
        self.logger
            .emit(|| trace!(capacity = self.capacity, "bounded heap evicted an item"));
        evicted
    }

    /// Removes and returns the most wanted item.
    ///
    /// Returns `None` if the heap is empty. O(k) because the most wanted
    /// item sits at the bottom of the internal heap; use
    /// [`into_sorted_vec`](Self::into_sorted_vec) to drain everything.
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop_bottom()
    }

    /// Consumes the heap and returns the retained items, most wanted first.
    pub fn into_sorted_vec(self) -> Vec<T> {
        let mut sorted = self.heap.into_sorted_vec();
        sorted.reverse();
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn zero_capacity_fails() {
        let err = BoundedHeap::<(u32, u32)>::new(0, Want::Largest).unwrap_err();
        assert_eq!(err, ConfigError::NotPositive { what: "capacity" });
        assert_eq!(err.to_string(), "capacity must be greater than zero");
    }

    #[test]
    fn under_capacity_evicts_nothing() {
        let mut heap = BoundedHeap::new(3, Want::Largest).unwrap();
        assert_eq!(heap.push((1, 5)), None);
        assert_eq!(heap.push((2, 2)), None);
        assert_eq!(heap.push((3, 8)), None);
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek_least_wanted(), Some(&(2, 2)));
    }

    #[test]
    fn evicts_smallest_when_wanting_largest() {
        let mut heap = BoundedHeap::new(3, Want::Largest).unwrap();
        heap.push((1, 5));
        heap.push((2, 2));
        heap.push((3, 8));

        assert_eq!(heap.push((4, 10)), Some((2, 2)));
        assert_eq!(heap.push((5, 1)), Some((5, 1)));
        assert_eq!(heap.len(), 3);

        let priorities: Vec<u32> = heap.into_sorted_vec().into_iter().map(|(_, p)| p).collect();
        assert_eq!(priorities, vec![10, 8, 5]);
    }

    #[test]
    fn evicts_largest_when_wanting_smallest() {
        let mut heap = BoundedHeap::new(2, Want::Smallest).unwrap();
        heap.push((1, 5));
        heap.push((2, 2));

        assert_eq!(heap.push((3, 8)), Some((3, 8)));
        assert_eq!(heap.push((4, 1)), Some((1, 5)));
        assert_eq!(heap.pop(), Some((4, 1)));
        assert_eq!(heap.pop(), Some((2, 2)));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn pop_drains_in_wanted_order() {
        for want in [Want::Largest, Want::Smallest] {
            let mut rng = SmallRng::seed_from_u64(7);
            let mut heap = BoundedHeap::new(5, want).unwrap();

            for i in 0..100u32 {
                let n = rng.random_range(0..1000u32);
                heap.push((i, n));
            }

            let mut last: Option<u32> = None;
            while let Some((_, p)) = heap.pop() {
                if let Some(prev) = last {
                    assert!(
                        !want.best_first().ranks_above(&p, &prev),
                        "{want:?}: {p} popped after {prev}"
                    );
                }
                last = Some(p);
            }
        }
    }

    #[test]
    fn retains_exactly_the_largest() {
        let mut rng = SmallRng::seed_from_u64(2024);
        let capacity = 16;
        let mut heap = BoundedHeap::new(capacity, Want::Largest).unwrap();
        let mut all = Vec::new();

        for i in 0..1000u32 {
            let n = rng.random_range(0..10_000u32);
            all.push(n);
            heap.push((i, n));
        }

        assert_eq!(heap.len(), capacity);

        all.sort_unstable_by(|a, b| b.cmp(a));
        all.truncate(capacity);

        let kept: Vec<u32> = heap.into_sorted_vec().into_iter().map(|(_, p)| p).collect();
        assert_eq!(kept, all);
    }

    #[test]
    fn want_orders() {
        assert_eq!(Want::from_largest(true), Want::Largest);
        assert_eq!(Want::Largest.worst_first(), HeapOrder::Min);
        assert_eq!(Want::Smallest.best_first(), HeapOrder::Min);
    }
}
