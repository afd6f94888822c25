//! Buffer configuration and circular index arithmetic.
//!
//! This module provides the foundational primitives for the latest-value ring:
//! - Configuration with capacity validation
//! - Wrap-around index stepping for an arbitrary (non power-of-two) capacity

use crate::error::IccError;

/// Configuration for a latest-value buffer.
///
/// Any non-zero capacity works; slots are addressed by a wrapping index, not
/// by sequence number. Capacities are expected to be small.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Number of physical slots in the ring. Always greater than zero.
    capacity: usize,
}

impl BufferConfig {
    /// Creates a new buffer configuration with the specified capacity.
    ///
    /// # Errors
    /// Returns [`IccError::InvalidConfiguration`] if `capacity` is zero.
    ///
    /// # Example
    /// ```
    /// use tandem_icc::BufferConfig;
    /// let cfg = BufferConfig::new(3).unwrap();
    /// assert_eq!(cfg.capacity(), 3);
    /// assert!(BufferConfig::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, IccError> {
        if capacity == 0 {
            return Err(IccError::InvalidConfiguration {
                reason: "buffer capacity must be greater than zero",
            });
        }
        Ok(Self { capacity })
    }

    /// Returns the configured number of slots.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Advances a slot index by one, wrapping at `capacity`.
///
/// # Examples
///
/// With `capacity = 3`:
/// ```text
/// 0 → 1
/// 1 → 2
/// 2 → 0  (wraps around)
/// ```
#[inline(always)]
pub(crate) fn next_index(index: usize, capacity: usize) -> usize {
    let next = index + 1;
    if next == capacity { 0 } else { next }
}
