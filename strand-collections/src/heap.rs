//! Binary heap over [`HeapItem`]s with configurable direction and removal by key.
//!
//! Items are kept in a dense `Vec` in heap order. Removing an arbitrary item
//! swaps it with the last slot, truncates, and repairs order from the vacated
//! position in both directions.

use std::sync::Arc;

use strand_log::Logger;
use tracing::debug;

/// Trait for types that can participate in a [`PriorityQueue`].
///
/// `key` identifies an item for [`PriorityQueue::remove`]; `priority`
/// orders it.
///
/// # Example
///
/// ```
/// use strand_collections::HeapItem;
///
/// struct Job {
///     id: u64,
///     weight: i32,
/// }
///
/// impl HeapItem for Job {
///     type Key = u64;
///     type Priority = i32;
///
///     fn key(&self) -> &u64 { &self.id }
///     fn priority(&self) -> &i32 { &self.weight }
/// }
/// ```
///
/// Priorities must be totally ordered. Floats get there through a newtype
/// whose `Ord` uses [`f64::total_cmp`]:
///
/// ```
/// use std::cmp::Ordering;
/// use strand_collections::{HeapOrder, PriorityQueue};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// struct Score(f64);
///
/// impl Eq for Score {}
///
/// impl PartialOrd for Score {
///     fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
///         Some(self.cmp(other))
///     }
/// }
///
/// impl Ord for Score {
///     fn cmp(&self, other: &Self) -> Ordering {
///         self.0.total_cmp(&other.0)
///     }
/// }
///
/// let mut heap = PriorityQueue::new(HeapOrder::Max);
/// heap.push(("a", Score(0.25)));
/// heap.push(("b", Score(2.5)));
/// heap.push(("c", Score(-1.0)));
///
/// assert_eq!(heap.pop(), Some(("b", Score(2.5))));
/// assert_eq!(heap.pop(), Some(("a", Score(0.25))));
/// ```
pub trait HeapItem {
    /// Identity used to match items on removal.
    type Key: PartialEq;
    /// Ordering value.
    type Priority: Ord;

    /// Returns this item's key.
    fn key(&self) -> &Self::Key;

    /// Returns this item's priority.
    fn priority(&self) -> &Self::Priority;
}

/// `(key, priority)` pairs.
impl<K: PartialEq, P: Ord> HeapItem for (K, P) {
    type Key = K;
    type Priority = P;

    #[inline]
    fn key(&self) -> &K {
        &self.0
    }

    #[inline]
    fn priority(&self) -> &P {
        &self.1
    }
}

impl<T: HeapItem + ?Sized> HeapItem for &T {
    type Key = T::Key;
    type Priority = T::Priority;

    #[inline]
    fn key(&self) -> &Self::Key {
        (**self).key()
    }

    #[inline]
    fn priority(&self) -> &Self::Priority {
        (**self).priority()
    }
}

impl<T: HeapItem + ?Sized> HeapItem for Box<T> {
    type Key = T::Key;
    type Priority = T::Priority;

    #[inline]
    fn key(&self) -> &Self::Key {
        (**self).key()
    }

    #[inline]
    fn priority(&self) -> &Self::Priority {
        (**self).priority()
    }
}

impl<T: HeapItem + ?Sized> HeapItem for Arc<T> {
    type Key = T::Key;
    type Priority = T::Priority;

    #[inline]
    fn key(&self) -> &Self::Key {
        (**self).key()
    }

    #[inline]
    fn priority(&self) -> &Self::Priority {
        (**self).priority()
    }
}

/// Which end of the priority range sits at the top of the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapOrder {
    /// Pop returns the maximum priority first.
    Max,
    /// Pop returns the minimum priority first.
    Min,
}

impl HeapOrder {
    /// `true` maps to [`HeapOrder::Max`], `false` to [`HeapOrder::Min`].
    #[inline]
    pub const fn from_max_top(is_max_top: bool) -> Self {
        if is_max_top { Self::Max } else { Self::Min }
    }

    /// Returns `true` for [`HeapOrder::Max`].
    #[inline]
    pub const fn is_max_top(self) -> bool {
        matches!(self, Self::Max)
    }

    /// Returns the opposite order.
    #[inline]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Max => Self::Min,
            Self::Min => Self::Max,
        }
    }

    /// Returns `true` if `a` belongs strictly closer to the top than `b`.
    #[inline]
    pub fn ranks_above<P: Ord + ?Sized>(self, a: &P, b: &P) -> bool {
        match self {
            Self::Max => a > b,
            Self::Min => a < b,
        }
    }
}

/// An array-backed binary heap.
///
/// # Example
///
/// ```
/// use strand_collections::{HeapOrder, PriorityQueue};
///
/// let mut queue = PriorityQueue::new(HeapOrder::Max);
/// queue.push(("low", 1));
/// queue.push(("high", 10));
/// queue.push(("mid", 5));
///
/// // Remove by key, wherever it sits
/// assert_eq!(queue.remove(&"mid"), Some(("mid", 5)));
///
/// assert_eq!(queue.pop(), Some(("high", 10)));
/// assert_eq!(queue.pop(), Some(("low", 1)));
/// assert_eq!(queue.pop(), None);
/// ```
#[derive(Debug, Clone)]
pub struct PriorityQueue<T: HeapItem> {
    /// Items in heap order.
    items: Vec<T>,
    order: HeapOrder,
    logger: Logger,
}

impl<T: HeapItem> PriorityQueue<T> {
    /// Creates an empty heap.
    #[inline]
    pub fn new(order: HeapOrder) -> Self {
        Self::with_capacity(order, 0)
    }

    /// Creates a heap with pre-allocated capacity.
    #[inline]
    pub fn with_capacity(order: HeapOrder, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            order,
            logger: Logger::disabled(),
        }
    }

    /// Attaches a logger for diagnostic events.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        logger.emit(|| debug!(order = ?self.order, "priority queue created"));
        self.logger = logger;
        self
    }

    /// Returns the number of elements in the heap.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the heap is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the configured direction.
    #[inline]
    pub fn order(&self) -> HeapOrder {
        self.order
    }

    /// Returns the top element without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Returns `true` if an element with `key` is in the heap. O(n).
    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.position(key).is_some()
    }

    /// Iterates over the elements in internal (heap) order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Pushes an element onto the heap.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        let last = self.items.len() - 1;
        self.sift_up(last);
    }

    /// Removes and returns the top element.
    ///
    /// Returns `None` if the heap is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    /// Removes the first element whose key equals `key`.
    ///
    /// Locating the element is O(n); restoring order is O(log n). Returns
    /// `None` (and leaves the heap untouched) if nothing matches.
    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        match self.position(key) {
            Some(pos) => Some(self.remove_at(pos)),
            None => {
                self.logger
                    .emit(|| debug!(len = self.items.len(), "remove found no matching key"));
                None
            }
        }
    }

    /// Removes and returns the element that would be popped last.
    ///
    /// Scans the leaf half of the heap, O(n).
    pub fn pop_bottom(&mut self) -> Option<T> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }

        // The bottom-ranked element is always a leaf.
        let mut bottom = len / 2;
        for i in bottom + 1..len {
            if self
                .order
                .ranks_above(self.items[bottom].priority(), self.items[i].priority())
            {
                bottom = i;
            }
        }

        Some(self.remove_at(bottom))
    }

    /// Removes all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Consumes the heap and returns its elements in pop order.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.items.len());
        while let Some(item) = self.pop() {
            sorted.push(item);
        }
        sorted
    }

    #[inline]
    fn position(&self, key: &T::Key) -> Option<usize> {
        self.items.iter().position(|item| item.key() == key)
    }

    /// Returns `true` if the element at `a` belongs strictly above the one at `b`.
    #[inline]
    fn outranks(&self, a: usize, b: usize) -> bool {
        self.order
            .ranks_above(self.items[a].priority(), self.items[b].priority())
    }

    fn remove_at(&mut self, pos: usize) -> T {
        let item = self.items.swap_remove(pos);

        if pos < self.items.len() {
            // The moved element may belong above or below its new slot
            self.sift_down(pos);
            self.sift_up(pos);
        }

        item
    }

    #[inline]
    fn sift_up(&mut self, pos: usize) {
        self.sift_up_to(pos, 0);
    }

    /// Moves the element at `hole` up while it outranks its parent, stopping at `floor`.
    #[inline]
    fn sift_up_to(&mut self, mut hole: usize, floor: usize) {
        while hole > floor {
            let parent = (hole - 1) / 2;
            if !self.outranks(hole, parent) {
                break;
            }
            self.items.swap(hole, parent);
            hole = parent;
        }
    }

    #[inline]
    fn sift_down(&mut self, pos: usize) {
        let len = self.items.len();
        if len <= 1 {
            return;
        }

        let mut hole = pos;

        // Phase 1: Descend to leaf, always following the higher-ranked child
        loop {
            let left = 2 * hole + 1;
            if left >= len {
                break;
            }

            let right = left + 1;
            let child = if right < len && self.outranks(right, left) {
                right
            } else {
                left
            };

            self.items.swap(hole, child);
            hole = child;
        }

        // Phase 2: Sift up from leaf position
        self.sift_up_to(hole, pos);
    }
}

impl<T: HeapItem> Extend<T> for PriorityQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}
