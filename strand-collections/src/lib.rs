//! Ordered single-threaded containers.
//!
//! # Data Structures
//!
//! | Structure | Use Case | Key Operations |
//! |-----------|----------|----------------|
//! | [`SkipList`] | Ordered map with float keys | O(log n) set/get/remove |
//! | [`PriorityQueue`] | Max- or min-top heap | O(log n) push/pop, O(n) remove by key |
//! | [`BoundedHeap`] | Keep the best k of a stream | O(log k) push with eviction |
//! | [`TopK`] | One-pass selection over any producer | O(n log k) |
//! | [`Deque`] | Ring buffer with a capacity floor | amortized O(1) at both ends |
//!
//! Plus stable sort helpers ([`sort_biggest`], [`sort_smallest`]) for items
//! carrying an `i64` value.
//!
//! None of these types synchronize internally. Mutation takes `&mut self`,
//! so sharing across threads needs an outer lock. The lock-free queue lives
//! in the `strand-queue` crate.
//!
//! # Heap Items
//!
//! Heaps are generic over [`HeapItem`]: anything with a key used for
//! removal and a priority used for ordering. `(key, priority)` tuples work
//! out of the box.
//!
//! ```
//! use strand_collections::{HeapOrder, PriorityQueue};
//!
//! let mut heap = PriorityQueue::new(HeapOrder::Max);
//! heap.push(("low", 1));
//! heap.push(("high", 9));
//! heap.push(("mid", 5));
//!
//! assert_eq!(heap.remove(&"mid"), Some(("mid", 5)));
//! assert_eq!(heap.pop(), Some(("high", 9)));
//! ```
//!
//! # Logging
//!
//! Every structure accepts a [`strand_log::Logger`] through `with_logger`.
//! The default logger is disabled and costs nothing.
//!
//! # Errors
//!
//! Invalid construction arguments return [`ConfigError`]. Skip list keys
//! that cannot be ordered are handed back in [`UnorderedKey`].

#![warn(missing_docs)]

pub mod bounded;
pub mod deque;
pub mod error;
pub mod heap;
pub mod skiplist;
pub mod sort;
pub mod topk;

pub use bounded::{BoundedHeap, Want};
pub use deque::{Deque, DequeBuilder};
pub use error::{ConfigError, UnorderedKey};
pub use heap::{HeapItem, HeapOrder, PriorityQueue};
pub use skiplist::{SkipList, SkipNode};
pub use sort::{SortItem, sort_biggest, sort_smallest};
pub use topk::{TopK, largest_n, smallest_n, top_k};
