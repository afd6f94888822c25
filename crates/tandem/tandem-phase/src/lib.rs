//! Turn-taking synchronizer over a fixed, cyclic sequence of phases.
//!
//! Each phase names the participants allowed to act. A participant blocks in
//! [`PhaseBarrier::wait_turn`] until its identity is active, does its work,
//! then reports [`PhaseBarrier::done`]. Once every participant of the current
//! phase has reported, the barrier advances to the next phase (wrapping to the
//! first) and wakes all waiters.
//!
//! Participants within one phase are unordered relative to each other; the
//! only ordering guarantee is across phases.

mod barrier;
mod error;

pub use barrier::{PhaseBarrier, PhaseState};
pub use error::PhaseError;
