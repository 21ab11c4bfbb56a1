//! Growable ring-buffer deque with a capacity floor.
//!
//! Storage is a power-of-two ring, so the slot for logical index `i` is
//! `(head + i) & (capacity - 1)`.
//!
//! ```text
//! capacity 8, head = 6, len = 4
//!
//!   slot:  0   1   2   3   4   5   6   7
//!        [ c | d | - | - | - | - | a | b ]
//!                                  ^ head
//! logical order: a b c d
//! ```
//!
//! The buffer doubles when full and halves when occupancy falls to a quarter,
//! but never below the configured minimal capacity. Constructing with a
//! current capacity of zero defers the first allocation to the first push.
//!
//! # Example
//!
//! ```
//! use strand_collections::Deque;
//!
//! let mut deque = Deque::builder().minimal_capacity(4).build().unwrap();
//! deque.push_back(2);
//! deque.push_front(1);
//! deque.push_back(3);
//!
//! assert_eq!(deque.front(), Some(&1));
//! assert_eq!(deque.pop_back(), Some(3));
//! assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
//! ```

use core::fmt;
use core::marker::PhantomData;

use strand_log::Logger;
use tracing::debug;

use crate::error::ConfigError;

const DEFAULT_MINIMAL_CAPACITY: usize = 16;

/// Builder for [`Deque`].
///
/// Capacities accept any integer type. Values that are negative or do not
/// fit in `usize` are reported by [`build`](Self::build).
pub struct DequeBuilder<T> {
    current_capacity: Result<usize, ConfigError>,
    minimal_capacity: Result<usize, ConfigError>,
    logger: Logger,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for DequeBuilder<T> {
    fn default() -> Self {
        Self {
            current_capacity: Ok(0),
            minimal_capacity: Ok(DEFAULT_MINIMAL_CAPACITY),
            logger: Logger::disabled(),
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for DequeBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            current_capacity: self.current_capacity,
            minimal_capacity: self.minimal_capacity,
            logger: self.logger.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for DequeBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DequeBuilder")
            .field("current_capacity", &self.current_capacity)
            .field("minimal_capacity", &self.minimal_capacity)
            .field("logger", &self.logger)
            .finish()
    }
}

impl<T> DequeBuilder<T> {
    /// Creates a builder with current capacity 0 and minimal capacity 16.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity to allocate up front. Zero defers allocation.
    #[must_use]
    pub fn current_capacity<N: TryInto<usize>>(mut self, capacity: N) -> Self {
        self.current_capacity = capacity.try_into().map_err(|_| ConfigError::InvalidCapacity {
            what: "current capacity",
        });
        self
    }

    /// Capacity the buffer never shrinks below.
    #[must_use]
    pub fn minimal_capacity<N: TryInto<usize>>(mut self, capacity: N) -> Self {
        self.minimal_capacity = capacity.try_into().map_err(|_| ConfigError::InvalidCapacity {
            what: "minimal capacity",
        });
        self
    }

    /// Attaches a logger for construction and resize events.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Builds the deque.
    ///
    /// Both capacities are rounded up to a power of two. A non-zero current
    /// capacity smaller than the minimal capacity is raised to it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if either capacity was
    /// negative or does not fit in `usize`.
    pub fn build(self) -> Result<Deque<T>, ConfigError> {
        let min_capacity = round_capacity(self.minimal_capacity?.max(1), "minimal capacity")?;
        let current = self.current_capacity?;
        let capacity = if current == 0 {
            0
        } else {
            round_capacity(current.max(min_capacity), "current capacity")?
        };

        self.logger
            .emit(|| debug!(capacity, min_capacity, "deque created"));

        Ok(Deque {
            buf: empty_slots(capacity),
            head: 0,
            len: 0,
            min_capacity,
            logger: self.logger,
        })
    }
}

fn round_capacity(capacity: usize, what: &'static str) -> Result<usize, ConfigError> {
    capacity
        .checked_next_power_of_two()
        .ok_or(ConfigError::InvalidCapacity { what })
}

fn empty_slots<T>(capacity: usize) -> Box<[Option<T>]> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}

/// A double-ended queue on a growable ring buffer.
///
/// Push and pop at either end are amortized O(1). Indexing is O(1).
pub struct Deque<T> {
    buf: Box<[Option<T>]>,
    head: usize,
    len: usize,
    min_capacity: usize,
    logger: Logger,
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deque<T> {
    /// Creates an empty deque with default capacities. Does not allocate.
    pub fn new() -> Self {
        Self {
            buf: Box::new([]),
            head: 0,
            len: 0,
            min_capacity: DEFAULT_MINIMAL_CAPACITY,
            logger: Logger::disabled(),
        }
    }

    /// Returns a builder for configuring capacities.
    pub fn builder() -> DequeBuilder<T> {
        DequeBuilder::new()
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the deque is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the capacity the ring never shrinks below.
    #[inline]
    pub fn minimal_capacity(&self) -> usize {
        self.min_capacity
    }

    #[inline]
    fn mask(&self) -> usize {
        self.buf.len() - 1
    }

    #[inline]
    fn slot(&self, index: usize) -> usize {
        (self.head + index) & self.mask()
    }

    /// Appends an element to the back.
    pub fn push_back(&mut self, value: T) {
        self.grow_if_full();
        let slot = self.slot(self.len);
        self.buf[slot] = Some(value);
        self.len += 1;
    }

    /// Prepends an element to the front.
    pub fn push_front(&mut self, value: T) {
        self.grow_if_full();
        self.head = (self.head + self.mask()) & self.mask();
        self.buf[self.head] = Some(value);
        self.len += 1;
    }

    /// Removes and returns the front element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.buf[self.head].take();
        self.head = (self.head + 1) & self.mask();
        self.len -= 1;
        self.shrink_if_sparse();
        value
    }

    /// Removes and returns the back element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let slot = self.slot(self.len);
        let value = self.buf[slot].take();
        self.shrink_if_sparse();
        value
    }

    /// Returns the front element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the back element.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Returns the element at logical `index`, counting from the front.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.buf[self.slot(index)].as_ref()
    }

    /// Returns a mutable reference to the element at logical `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let slot = self.slot(index);
        self.buf[slot].as_mut()
    }

    /// Removes every element. Capacity shrinks back to the minimal capacity
    /// if it had grown past it.
    pub fn clear(&mut self) {
        for slot in self.buf.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
        if self.buf.len() > self.min_capacity {
            self.resize(self.min_capacity);
        }
    }

    /// Returns a front-to-back iterator.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            deque: self,
            front: 0,
            back: self.len,
        }
    }

    fn grow_if_full(&mut self) {
        if self.len < self.buf.len() {
            return;
        }
        let new_capacity = if self.buf.is_empty() {
            self.min_capacity
        } else {
            self.buf.len() * 2
        };
        self.resize(new_capacity);
    }

    fn shrink_if_sparse(&mut self) {
        let capacity = self.buf.len();
        if capacity / 2 < self.min_capacity || self.len > capacity / 4 {
            return;
        }
        self.resize(capacity / 2);
    }

    /// Moves the live elements to a fresh ring starting at slot 0.
    fn resize(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity.is_power_of_two());
        debug_assert!(new_capacity >= self.len);

        let old_capacity = self.buf.len();
        let mut buf = empty_slots(new_capacity);
        for (i, slot) in buf.iter_mut().enumerate().take(self.len) {
            let old = (self.head + i) & (old_capacity - 1);
            *slot = self.buf[old].take();
        }

        self.buf = buf;
        self.head = 0;
        self.logger.emit(|| {
            debug!(
                from = old_capacity,
                to = new_capacity,
                len = self.len,
                "deque resized"
            )
        });
    }
}

impl<T: fmt::Debug> fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Extend<T> for Deque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

/// Front-to-back iterator over a [`Deque`].
pub struct Iter<'a, T> {
    deque: &'a Deque<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.deque.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.deque.get(self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a Deque<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
