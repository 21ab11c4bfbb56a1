//! # strand-queue
//!
//! A lock-free unbounded FIFO queue for any number of producers and
//! consumers.
//!
//! ## Design Goals
//!
//! - `put` never blocks and never fails
//! - Memory reclamation without use-after-free, via epoch-based deferral
//! - Cache-line isolation of the head, tail and length counters
//!
//! ## Example
//!
//! ```
//! use strand_queue::Fifo;
//!
//! let queue = Fifo::new();
//! queue.put(42);
//! queue.put(43);
//!
//! assert_eq!(queue.len(), 2);
//! assert_eq!(queue.get(), Some(42));
//! assert_eq!(queue.get(), Some(43));
//! assert_eq!(queue.get(), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod fifo;

pub use fifo::Fifo;
