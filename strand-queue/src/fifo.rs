//! Unbounded multi-producer multi-consumer FIFO queue.
//!
//! Michael–Scott linked queue: a singly linked list with a sentinel node at
//! the head. Producers CAS a new node onto the tail's `next` link; consumers
//! CAS `head` forward, and the node they step onto becomes the new sentinel.
//!
//! ```text
//!   head                               tail
//!    │                                  │
//!    ▼                                  ▼
//! [sentinel] ──► [ a ] ──► [ b ] ──► [ c ] ──► null
//! ```
//!
//! Retired sentinels are freed through `crossbeam-epoch`, so a consumer that
//! is still reading a node it loaded before losing a race never touches
//! freed memory.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use strand_queue::Fifo;
//!
//! let queue = Arc::new(Fifo::new());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|producer| {
//!         let queue = Arc::clone(&queue);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 queue.put(producer * 1000 + i);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! let mut received = 0;
//! while queue.get().is_some() {
//!     received += 1;
//! }
//! assert_eq!(received, 400);
//! ```

use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};
use crossbeam_utils::{Backoff, CachePadded};
use strand_log::Logger;
use tracing::debug;

struct Node<T> {
    /// Initialized for every node except the current sentinel, whose value
    /// was moved out by the consumer that made it the sentinel (or never set).
    value: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            value: MaybeUninit::uninit(),
            next: Atomic::null(),
        }
    }

    fn with_value(value: T) -> Self {
        Self {
            value: MaybeUninit::new(value),
            next: Atomic::null(),
        }
    }
}

/// A lock-free unbounded FIFO queue.
///
/// `put` never blocks and never fails. `get` returns `None` when the queue
/// is empty at the moment of the call.
pub struct Fifo<T> {
    /// Consumer side. Always points at the sentinel.
    head: CachePadded<Atomic<Node<T>>>,
    /// Producer side. Points at the last node or, briefly, its predecessor.
    tail: CachePadded<Atomic<Node<T>>>,
    /// Raised before a node is linked and lowered after it is unlinked.
    len: CachePadded<AtomicUsize>,
    logger: Logger,
}

// Safety: values move between threads through the queue, and every shared
// access to the links goes through atomics under an epoch guard.
unsafe impl<T: Send> Send for Fifo<T> {}
unsafe impl<T: Send> Sync for Fifo<T> {}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Fifo<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        let queue = Self {
            head: CachePadded::new(Atomic::null()),
            tail: CachePadded::new(Atomic::null()),
            len: CachePadded::new(AtomicUsize::new(0)),
            logger: Logger::disabled(),
        };

        // Safety: the queue is not shared yet.
        let guard = unsafe { epoch::unprotected() };
        let sentinel = Owned::new(Node::sentinel()).into_shared(guard);
        queue.head.store(sentinel, Ordering::Relaxed);
        queue.tail.store(sentinel, Ordering::Relaxed);
        queue
    }

    /// Attaches a logger for diagnostic events.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        logger.emit(|| debug!("fifo created"));
        self.logger = logger;
        self
    }

    /// Appends `value` to the back of the queue.
    pub fn put(&self, value: T) {
        let guard = &epoch::pin();
        let new = Owned::new(Node::with_value(value)).into_shared(guard);
        let backoff = Backoff::new();

        self.len.fetch_add(1, Ordering::Relaxed);

        loop {
            let tail = self.tail.load(Ordering::Acquire, guard);
            // Safety: tail is never null and the guard keeps it alive.
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, guard);

            if !next.is_null() {
                // Tail is lagging; help it forward and retry
                let _ = self
                    .tail
                    .compare_exchange(tail, next, Ordering::Release, Ordering::Relaxed, guard);
                continue;
            }

            if tail_ref
                .next
                .compare_exchange(Shared::null(), new, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                let _ = self
                    .tail
                    .compare_exchange(tail, new, Ordering::Release, Ordering::Relaxed, guard);
                return;
            }

            backoff.spin();
        }
    }

    /// Removes and returns the value at the front of the queue.
    ///
    /// Returns `None` if the queue is empty.
    pub fn get(&self) -> Option<T> {
        let guard = &epoch::pin();
        let backoff = Backoff::new();

        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            // Safety: head is never null and the guard keeps it alive.
            let next = unsafe { head.deref() }.next.load(Ordering::Acquire, guard);

            // Safety: a non-null next is protected by the same guard.
            let next_ref = unsafe { next.as_ref() }?;

            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                // Tail must not be left pointing at a retired node
                let tail = self.tail.load(Ordering::Relaxed, guard);
                if head == tail {
                    let _ = self
                        .tail
                        .compare_exchange(tail, next, Ordering::Release, Ordering::Relaxed, guard);
                }

                // Safety: winning the CAS makes this thread the only reader
                // of next's value, and next is the new sentinel so nobody
                // reads it again. The old sentinel is unreachable from head.
                let value = unsafe {
                    guard.defer_destroy(head);
                    next_ref.value.assume_init_read()
                };

                self.len.fetch_sub(1, Ordering::Relaxed);
                return Some(value);
            }

            backoff.spin();
        }
    }

    /// Returns the number of queued values.
    ///
    /// Concurrent operations can make this stale by the time it returns. A
    /// value counts from the start of its `put` until the end of the `get`
    /// that takes it.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns `true` if no value is linked after the sentinel.
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let head = self.head.load(Ordering::Acquire, guard);
        // Safety: head is never null and the guard keeps it alive.
        unsafe { head.deref() }.next.load(Ordering::Acquire, guard).is_null()
    }
}

impl<T> Drop for Fifo<T> {
    fn drop(&mut self) {
        let remaining = *self.len.get_mut();
        if remaining > 0 {
            self.logger
                .emit(|| debug!(remaining, "fifo dropped with queued values"));
        }

        // Safety: `&mut self` means no other thread can reach the queue.
        unsafe {
            let guard = epoch::unprotected();
            let mut node = self.head.load(Ordering::Relaxed, guard);
            let mut is_sentinel = true;

            while !node.is_null() {
                let next = node.deref().next.load(Ordering::Relaxed, guard);
                let mut owned = node.into_owned();
                if !is_sentinel {
                    owned.value.assume_init_drop();
                }
                drop(owned);
                is_sentinel = false;
                node = next;
            }
        }
    }
}

impl<T> fmt::Debug for Fifo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fifo")
            .field("len", &self.len())
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::collections::{HashSet, VecDeque};
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Barrier};
    use std::thread;

    // ========================================================================
    // Basic operations
    // ========================================================================

    #[test]
    fn basic_put_get() {
        let queue = Fifo::new();
        queue.put(1);
        queue.put(2);
        queue.put(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.get(), Some(1));
        assert_eq!(queue.get(), Some(2));
        assert_eq!(queue.get(), Some(3));
        assert_eq!(queue.get(), None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn empty_get_returns_none() {
        let queue: Fifo<String> = Fifo::default();
        assert!(queue.is_empty());
        assert_eq!(queue.get(), None);
        assert_eq!(queue.get(), None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn is_empty_tracks_contents() {
        let queue = Fifo::new();
        queue.put("a");
        assert!(!queue.is_empty());
        queue.get();
        assert!(queue.is_empty());
    }

    #[test]
    fn interleaved_matches_vecdeque() {
        let queue = Fifo::new();
        let mut reference = VecDeque::new();
        let mut rng = SmallRng::seed_from_u64(42);

        for i in 0..10_000u32 {
            if rng.random_bool(0.6) {
                queue.put(i);
                reference.push_back(i);
            } else {
                assert_eq!(queue.get(), reference.pop_front());
            }
            assert_eq!(queue.len(), reference.len());
        }

        while let Some(expected) = reference.pop_front() {
            assert_eq!(queue.get(), Some(expected));
        }
        assert_eq!(queue.get(), None);
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fifo<u64>>();
        assert_send_sync::<Fifo<Box<String>>>();
    }

    // ========================================================================
    // Drop behavior
    // ========================================================================

    #[test]
    fn with_drop_type() {
        let drop_count = Arc::new(AtomicUsize::new(0));

        #[derive(Debug)]
        struct DropCounter(Arc<AtomicUsize>);
        impl Drop for DropCounter {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let queue = Fifo::new();
        for _ in 0..3 {
            queue.put(DropCounter(Arc::clone(&drop_count)));
        }
        assert_eq!(drop_count.load(Ordering::SeqCst), 0);

        drop(queue.get().unwrap());
        assert_eq!(drop_count.load(Ordering::SeqCst), 1);

        drop(queue);
        assert_eq!(drop_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn drain_then_drop_does_not_double_free() {
        let queue = Fifo::new();
        for i in 0..100 {
            queue.put(format!("v{i}"));
        }
        for i in 0..100 {
            assert_eq!(queue.get(), Some(format!("v{i}")));
        }
        drop(queue);
    }

    // ========================================================================
    // Concurrency
    // ========================================================================

    #[test]
    fn concurrent_producers_and_consumers() {
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 4;
        const PER_PRODUCER: usize = 10_000;

        let queue = Arc::new(Fifo::new());
        let barrier = Arc::new(Barrier::new(PRODUCERS + CONSUMERS));
        let producers_done = Arc::new(AtomicBool::new(false));

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|producer| {
                let queue = Arc::clone(&queue);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..PER_PRODUCER {
                        queue.put(producer * PER_PRODUCER + i);
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let barrier = Arc::clone(&barrier);
                let producers_done = Arc::clone(&producers_done);
                thread::spawn(move || {
                    barrier.wait();
                    let mut taken = Vec::new();
                    // Stop early so some values are left for the main thread
                    while taken.len() < PER_PRODUCER / 2 {
                        match queue.get() {
                            Some(v) => taken.push(v),
                            None if producers_done.load(Ordering::Acquire) => break,
                            None => std::hint::spin_loop(),
                        }
                    }
                    taken
                })
            })
            .collect();

        for handle in producers {
            handle.join().unwrap();
        }
        producers_done.store(true, Ordering::Release);

        let mut seen = HashSet::new();
        let mut dequeued = 0;
        for handle in consumers {
            for v in handle.join().unwrap() {
                assert!(seen.insert(v), "duplicate value {v}");
                dequeued += 1;
            }
        }

        let remaining = queue.len();
        let mut drained = 0;
        while let Some(v) = queue.get() {
            assert!(seen.insert(v), "duplicate value {v}");
            drained += 1;
        }

        assert_eq!(drained, remaining);
        assert_eq!(dequeued + remaining, PRODUCERS * PER_PRODUCER);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn per_producer_order_is_preserved() {
        const PRODUCERS: usize = 3;
        const PER_PRODUCER: u64 = 5_000;

        let queue = Arc::new(Fifo::new());
        let barrier = Arc::new(Barrier::new(PRODUCERS + 1));

        let handles: Vec<_> = (0..PRODUCERS)
            .map(|producer| {
                let queue = Arc::clone(&queue);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for seq in 0..PER_PRODUCER {
                        queue.put((producer, seq));
                    }
                })
            })
            .collect();

        barrier.wait();
        let mut next_seq = [0u64; PRODUCERS];
        let mut received = 0;
        while received < PRODUCERS as u64 * PER_PRODUCER {
            if let Some((producer, seq)) = queue.get() {
                assert_eq!(seq, next_seq[producer], "producer {producer} out of order");
                next_seq[producer] += 1;
                received += 1;
            } else {
                std::hint::spin_loop();
            }
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(queue.get().is_none());
    }

    #[test]
    fn random_mixed_operations_across_threads() {
        const THREADS: u64 = 8;
        const OPS: usize = 5_000;

        let queue = Arc::new(Fifo::new());
        let barrier = Arc::new(Barrier::new(THREADS as usize));

        let handles: Vec<_> = (0..THREADS)
            .map(|seed| {
                let queue = Arc::clone(&queue);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut rng = SmallRng::seed_from_u64(seed);
                    let (mut put, mut got) = (0usize, 0usize);
                    barrier.wait();
                    for i in 0..OPS {
                        if rng.random_bool(0.5) {
                            queue.put(seed as usize * OPS + i);
                            put += 1;
                        } else if queue.get().is_some() {
                            got += 1;
                        }
                    }
                    (put, got)
                })
            })
            .collect();

        let (mut put, mut got) = (0, 0);
        for handle in handles {
            let (p, g) = handle.join().unwrap();
            put += p;
            got += g;
        }

        assert_eq!(queue.len(), put - got);
        let mut drained = 0;
        while queue.get().is_some() {
            drained += 1;
        }
        assert_eq!(got + drained, put);
    }
}
