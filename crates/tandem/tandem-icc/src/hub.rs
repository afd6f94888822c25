//! Publish/subscribe hub over a single latest-value buffer.
//!
//! The hub exclusively owns one [`LatestValueBuffer`] and hands out lightweight
//! handles onto it:
//! - **Publisher**: may only publish.
//! - **Receiver**: may only read the latest value.
//!
//! Handles carry nothing but a borrow of the hub's buffer, so they are `Copy`
//! and can be handed to as many threads as needed (e.g. with
//! `std::thread::scope`). The borrow makes the ownership contract explicit:
//! the compiler rejects any handle that would outlive its hub.
//!
//! # Thread Safety
//! - `Publisher<T>` and `Receiver<T>` are `Send + Sync` whenever `T: Send`.
//! - Any number of publishers and receivers may operate concurrently; all
//!   synchronization happens inside the buffer.

use crate::buffer::{DebugSnapshot, LatestValueBuffer};
use crate::error::IccError;
use std::fmt;

/// Owner of the shared buffer and factory for publisher/receiver handles.
#[derive(Debug)]
pub struct PubSubHub<T> {
    buffer: LatestValueBuffer<T>,
}

/// Publish-only view onto a hub's buffer.
pub struct Publisher<'hub, T> {
    buffer: &'hub LatestValueBuffer<T>,
}

/// Read-only view onto a hub's buffer.
pub struct Receiver<'hub, T> {
    buffer: &'hub LatestValueBuffer<T>,
}

impl<T> PubSubHub<T> {
    /// Creates a hub backed by a buffer with `capacity` slots.
    ///
    /// # Errors
    /// Returns [`IccError::InvalidConfiguration`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, IccError> {
        Ok(Self {
            buffer: LatestValueBuffer::new(capacity)?,
        })
    }

    /// Returns a new publisher bound to this hub's buffer.
    pub fn make_publisher(&self) -> Publisher<'_, T> {
        Publisher {
            buffer: &self.buffer,
        }
    }

    /// Returns a new receiver bound to this hub's buffer.
    pub fn make_receiver(&self) -> Receiver<'_, T> {
        Receiver {
            buffer: &self.buffer,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

impl<T: Clone> PubSubHub<T> {
    /// Diagnostic view of the underlying buffer. See [`LatestValueBuffer::debug_snapshot`].
    pub fn debug_snapshot(&self) -> DebugSnapshot<T> {
        self.buffer.debug_snapshot()
    }
}

impl<T> Publisher<'_, T> {
    /// Publishes `value` as the hub's new latest element. Never blocks.
    #[inline]
    pub fn publish(&self, value: T) {
        self.buffer.publish(value);
    }
}

impl<T: Clone> Receiver<'_, T> {
    /// Returns the most recently published value, or `None` if nothing has
    /// been published yet. Never blocks.
    #[inline]
    pub fn try_get_latest(&self) -> Option<T> {
        self.buffer.try_get_latest()
    }
}

// Handles are plain borrows; derive would wrongly demand `T: Clone` / `T: Debug`.

impl<T> Clone for Publisher<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Publisher<'_, T> {}

impl<T> Clone for Receiver<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Receiver<'_, T> {}

impl<T> fmt::Debug for Publisher<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("capacity", &self.buffer.capacity())
            .finish()
    }
}

impl<T> fmt::Debug for Receiver<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("capacity", &self.buffer.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_hub_is_invalid() {
        assert!(matches!(
            PubSubHub::<u8>::new(0),
            Err(IccError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn handles_share_one_buffer() {
        let hub = PubSubHub::new(3).unwrap();
        let pub_a = hub.make_publisher();
        let pub_b = hub.make_publisher();
        let rx_a = hub.make_receiver();
        let rx_b = rx_a;

        assert_eq!(rx_a.try_get_latest(), None);

        pub_a.publish(1u32);
        assert_eq!(rx_b.try_get_latest(), Some(1));

        pub_b.publish(2);
        assert_eq!(rx_a.try_get_latest(), Some(2));
        assert_eq!(hub.make_receiver().try_get_latest(), Some(2));

        let snap = hub.debug_snapshot();
        assert_eq!(snap.slots, vec![Some(1), Some(2), None]);
        assert_eq!(hub.capacity(), 3);
    }

    #[test]
    fn handles_debug_without_payload_bound() {
        struct Opaque;
        let hub = PubSubHub::<Opaque>::new(2).unwrap();
        assert_eq!(
            format!("{:?}", hub.make_publisher()),
            "Publisher { capacity: 2 }"
        );
        assert_eq!(
            format!("{:?}", hub.make_receiver()),
            "Receiver { capacity: 2 }"
        );
    }
}
