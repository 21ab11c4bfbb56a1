//! Single-pass top-K selection over a stream of items.
//!
//! Items are pulled one at a time from any [`IntoIterator`] (a `Vec`, an
//! iterator adapter, or the receiving end of a channel) and offered to a
//! [`BoundedHeap`] of capacity k. The stream is consumed exactly once and
//! dropped before the result is returned.
//!
//! O(n log k) time and O(k) extra space, regardless of stream length.
//!
//! # Example
//!
//! ```
//! use strand_collections::{largest_n, smallest_n};
//!
//! let items = [(0, 1), (1, 3), (2, 55), (3, 2), (4, 4441), (5, 15555), (6, 122)];
//!
//! let top: Vec<u32> = largest_n(items, 3).unwrap().into_iter().map(|(_, p)| p).collect();
//! assert_eq!(top, vec![15555, 4441, 122]);
//!
//! let bottom: Vec<u32> = smallest_n(items, 3).unwrap().into_iter().map(|(_, p)| p).collect();
//! assert_eq!(bottom, vec![1, 2, 3]);
//! ```

use std::num::NonZeroUsize;

use strand_log::Logger;
use tracing::debug;

use crate::bounded::{BoundedHeap, Want};
use crate::error::ConfigError;
use crate::heap::HeapItem;

/// A configured top-K selection.
///
/// Holds k, the wanted direction and a logger so the same selection can be
/// run over several streams.
#[derive(Debug, Clone)]
pub struct TopK {
    k: NonZeroUsize,
    want: Want,
    logger: Logger,
}

impl TopK {
    /// Creates a selector returning at most `k` items.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] if `k` is zero.
    pub fn new(k: usize, want: Want) -> Result<Self, ConfigError> {
        let k = NonZeroUsize::new(k).ok_or(ConfigError::NotPositive { what: "k" })?;
        Ok(Self {
            k,
            want,
            logger: Logger::disabled(),
        })
    }

    /// Attaches a logger for diagnostic events.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        logger.emit(|| debug!(k = self.k.get(), want = ?self.want, "top-k selector created"));
        self.logger = logger;
        self
    }

    /// Returns k.
    #[inline]
    pub fn k(&self) -> usize {
        self.k.get()
    }

    /// Returns the wanted direction.
    #[inline]
    pub fn want(&self) -> Want {
        self.want
    }

    /// Consumes `items` and returns the k most wanted, best first.
    ///
    /// A stream shorter than k yields all of its items, sorted.
    pub fn select<I, T>(&self, items: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
        T: HeapItem,
    {
        let mut heap = BoundedHeap::with_capacity(self.k, self.want);

        let mut consumed = 0usize;
        for item in items {
            consumed += 1;
            heap.push(item);
        }

        self.logger.emit(|| {
            debug!(
                k = self.k.get(),
                want = ?self.want,
                consumed,
                retained = heap.len(),
                "top-k selection finished"
            )
        });

        heap.into_sorted_vec()
    }
}

/// Returns the `k` most wanted items of `items`, best first.
///
/// # Errors
///
/// Returns [`ConfigError::NotPositive`] if `k` is zero.
pub fn top_k<I, T>(items: I, k: usize, want: Want) -> Result<Vec<T>, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: HeapItem,
{
    Ok(TopK::new(k, want)?.select(items))
}

/// Returns the `n` items with the largest priorities, largest first.
///
/// # Errors
///
/// Returns [`ConfigError::NotPositive`] if `n` is zero.
pub fn largest_n<I, T>(items: I, n: usize) -> Result<Vec<T>, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: HeapItem,
{
    top_k(items, n, Want::Largest)
}

/// Returns the `n` items with the smallest priorities, smallest first.
///
/// # Errors
///
/// Returns [`ConfigError::NotPositive`] if `n` is zero.
pub fn smallest_n<I, T>(items: I, n: usize) -> Result<Vec<T>, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: HeapItem,
{
    top_k(items, n, Want::Smallest)
}
