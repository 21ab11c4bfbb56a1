//! Error types for collection construction and insertion.

use core::fmt;

use thiserror::Error;

/// Invalid construction arguments.
///
/// Returned synchronously by constructors and builders. Values are never
/// silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A bound that must be at least one was zero.
    #[error("{what} must be greater than zero")]
    NotPositive {
        /// Name of the offending argument.
        what: &'static str,
    },
    /// A capacity was negative or does not fit in `usize`.
    #[error("{what} must be a non-negative value that fits in usize")]
    InvalidCapacity {
        /// Name of the offending argument.
        what: &'static str,
    },
}

/// A skip list key that does not compare equal to itself (e.g. `f64::NAN`).
///
/// Holds the rejected key-value pair so the caller gets ownership back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnorderedKey<T>(pub T);

impl<T> UnorderedKey<T> {
    /// Returns the rejected entry.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for UnorderedKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key has no ordering relative to itself")
    }
}

impl<T: fmt::Debug> std::error::Error for UnorderedKey<T> {}
