//! Latest-value overwriting ring buffer.
//!
//! Producers publish without blocking and consumers read the freshest value
//! without blocking. Up to `capacity` values are retained physically, but only
//! the most recently published one is ever retrievable; older values are
//! silently discarded as their slots are reused.
//!
//! # Design
//! - **Publish**: overwrites the slot at `write_index`, marks it latest, steps
//!   `write_index` forward.
//! - **Read**: clones the handle in the latest slot. Readers never remove or
//!   mutate anything, so any number of them observe the same value.
//!
//! This is NOT a FIFO queue: a reader polling slower than the publisher simply
//! misses intermediate values.
//!
//! # Thread Safety
//! All state lives behind one `Mutex`. Every operation is a single O(1)
//! critical section, so `publish`, `try_get_latest` and `debug_snapshot` are
//! atomic with respect to one another and no reader can observe a
//! `latest_index`/slot pair that does not belong to a completed publish.

use crate::error::IccError;
use crate::ring::{BufferConfig, next_index};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutable ring state, only ever touched while holding the buffer lock.
#[derive(Debug)]
struct RingState<T> {
    /// Physical storage, reused in circular order. `None` until first written.
    slots: Vec<Option<T>>,
    /// Next slot to overwrite.
    write_index: usize,
    /// Slot holding the most recently published value.
    latest_index: usize,
    /// Whether anything has ever been published.
    has_value: bool,
}

/// A fixed-capacity circular store exposing only its most recent element.
///
/// # Type Parameter
/// - `T`: The transported value. It should be cheap to clone, typically a
///   reference-counted handle such as `Arc<Message>`, because every read hands
///   out a new clone while the buffer keeps its own.
#[derive(Debug)]
pub struct LatestValueBuffer<T> {
    /// Immutable after construction; kept outside the lock.
    capacity: usize,
    state: Mutex<RingState<T>>,
}

/// Consistent copy of a buffer's internal state, for diagnostics and tests.
///
/// Must not drive production control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSnapshot<T> {
    pub capacity: usize,
    /// Next slot to be overwritten.
    pub write_index: usize,
    /// Where the newest item lives.
    pub latest_index: usize,
    pub has_value: bool,
    /// Slots in physical order `[0..capacity)`.
    pub slots: Vec<Option<T>>,
}

impl<T> LatestValueBuffer<T> {
    /// Creates an empty buffer with `capacity` slots.
    ///
    /// # Errors
    /// Returns [`IccError::InvalidConfiguration`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, IccError> {
        BufferConfig::new(capacity).map(Self::from_config)
    }

    /// Creates an empty buffer from an already validated configuration.
    pub fn from_config(cfg: BufferConfig) -> Self {
        let capacity = cfg.capacity();
        Self {
            capacity,
            state: Mutex::new(RingState {
                slots: (0..capacity).map(|_| None).collect(),
                write_index: 0,
                latest_index: 0,
                has_value: false,
            }),
        }
    }

    /// Returns the number of physical slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Acquires the ring lock.
    ///
    /// No critical section can panic between two field updates, so a poisoned
    /// lock still guards a consistent ring and is recovered.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, RingState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes `value` as the new latest element.
    ///
    /// Overwrites whatever occupied the slot at `write_index`. Never blocks
    /// beyond the bounded critical section and never fails.
    pub fn publish(&self, value: T) {
        let displaced = {
            let mut state = self.lock();
            let idx = state.write_index;
            let displaced = state.slots[idx].replace(value);
            state.latest_index = idx;
            state.write_index = next_index(idx, self.capacity);
            state.has_value = true;
            displaced
        };
        // Released outside the critical section.
        drop(displaced);
    }
}

impl<T: Clone> LatestValueBuffer<T> {
    /// Returns a new reference to the most recently published value.
    ///
    /// - `Some(T)` if anything has been published
    /// - `None` before the first publish
    ///
    /// Does not remove the value: repeated calls with no intervening publish
    /// return equivalent values.
    pub fn try_get_latest(&self) -> Option<T> {
        let state = self.lock();
        if !state.has_value {
            return None;
        }
        state.slots[state.latest_index].clone()
    }

    /// Takes an atomically consistent copy of indices, flag and every slot.
    pub fn debug_snapshot(&self) -> DebugSnapshot<T> {
        let state = self.lock();
        DebugSnapshot {
            capacity: self.capacity,
            write_index: state.write_index,
            latest_index: state.latest_index,
            has_value: state.has_value,
            slots: state.slots.clone(),
        }
    }
}

impl<T> DebugSnapshot<T> {
    /// The value in the latest slot, if anything has been published.
    pub fn latest(&self) -> Option<&T> {
        if !self.has_value {
            return None;
        }
        self.slots.get(self.latest_index).and_then(Option::as_ref)
    }
}

/// Renders the ring on one line, e.g. `cap=3 write=1 latest=0 has=true slots=[7*, _W, _]`.
///
/// `_` is an empty slot, `*` marks the latest slot and `W` the next slot to be
/// overwritten.
impl<T: fmt::Display> fmt::Display for DebugSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cap={} write={} latest={} has={} slots=[",
            self.capacity, self.write_index, self.latest_index, self.has_value
        )?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match slot {
                Some(v) => write!(f, "{v}")?,
                None => f.write_str("_")?,
            }
            if self.has_value && i == self.latest_index {
                f.write_str("*")?;
            }
            if i == self.write_index {
                f.write_str("W")?;
            }
        }
        f.write_str("]")
    }
}
