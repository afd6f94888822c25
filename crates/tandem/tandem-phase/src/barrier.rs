//! Phase barrier implementation.
//!
//! # Protocol
//!
//! **Participant loop:**
//! 1. `wait_turn(id)`: block until `id` is expected in the current phase and
//!    has not completed it yet (or the timeout elapses)
//! 2. Do the work for this turn
//! 3. `done(id)`: record completion; the last participant of the phase
//!    advances the barrier and wakes everyone
//!
//! # State
//!
//! ```text
//!   phases:  [ {A, B} , {C} ]          fixed at construction
//!                ^
//!   phase:       0                     cyclic index into `phases`
//!   done:    { A }                     always a subset of phases[phase]
//! ```
//!
//! When `done == phases[phase]` the index moves to `(phase + 1) % len` and
//! `done` is cleared in the same critical section, so no participant can ever
//! observe a half-advanced barrier.

use crate::error::PhaseError;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace};

/// Mutable barrier state, guarded by `PhaseBarrier::state`.
#[derive(Debug)]
struct Turn<I> {
    /// Index of the current phase.
    phase: usize,
    /// Participants that reported completion in the current phase occurrence.
    done: HashSet<I>,
    /// Number of times the barrier wrapped from the last phase back to phase 0.
    cycles: u64,
}

/// Consistent copy of a barrier's externally visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseState<I: Eq + Hash> {
    pub phase: usize,
    pub expected: HashSet<I>,
    pub done: HashSet<I>,
    /// Completed full cycles since construction.
    pub cycles: u64,
}

/// Gates a fixed set of participants through repeating, ordered phases.
///
/// # Type Parameter
/// - `I`: Participant identity. A small `Copy` token, typically a fieldless
///   enum naming the roles being coordinated.
///
/// An identity may appear in several phases of the cycle, or in none. One that
/// appears in none can never be given a turn: its `wait_turn` always times out.
#[derive(Debug)]
pub struct PhaseBarrier<I> {
    /// Expected participants per phase, deduplicated.
    phases: Vec<HashSet<I>>,
    /// Upper bound for each `wait_turn` call.
    timeout: Duration,
    state: Mutex<Turn<I>>,
    /// Signalled whenever the barrier advances to a new phase.
    advanced: Condvar,
}

impl<I> PhaseBarrier<I>
where
    I: Copy + Eq + Hash + Debug,
{
    /// Creates a barrier starting at phase 0 with nobody done.
    ///
    /// # Arguments
    /// - `phases`: the cycle, in order. Each inner list is one phase; an identity
    ///   listed twice in the same phase counts once.
    /// - `timeout`: how long a single `wait_turn` may block.
    ///
    /// # Errors
    /// [`PhaseError::InvalidConfiguration`] if `phases` is empty or any phase
    /// lists no participant.
    pub fn new(phases: Vec<Vec<I>>, timeout: Duration) -> Result<Self, PhaseError<I>> {
        if phases.is_empty() {
            return Err(PhaseError::InvalidConfiguration {
                reason: "phase list must not be empty",
            });
        }
        if phases.iter().any(Vec::is_empty) {
            return Err(PhaseError::InvalidConfiguration {
                reason: "every phase must name at least one participant",
            });
        }

        let phases: Vec<HashSet<I>> = phases
            .into_iter()
            .map(|phase| phase.into_iter().collect())
            .collect();

        debug!(phases = phases.len(), ?timeout, "phase barrier created");

        Ok(Self {
            phases,
            timeout,
            state: Mutex::new(Turn {
                phase: 0,
                done: HashSet::new(),
                cycles: 0,
            }),
            advanced: Condvar::new(),
        })
    }

    /// Number of phases in one cycle.
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether `id` is expected in at least one phase of the cycle.
    pub fn participates(&self, id: I) -> bool {
        self.phases.iter().any(|phase| phase.contains(&id))
    }

    /// How many phases of one cycle include `id`.
    pub fn turns_per_cycle(&self, id: I) -> usize {
        self.phases.iter().filter(|phase| phase.contains(&id)).count()
    }

    /// Takes a consistent copy of `(phase, expected, done, cycles)`.
    pub fn state(&self) -> PhaseState<I> {
        let turn = self.lock();
        PhaseState {
            phase: turn.phase,
            expected: self.phases[turn.phase].clone(),
            done: turn.done.clone(),
            cycles: turn.cycles,
        }
    }

    /// Critical sections only mutate `Turn` after the last hashing of `I`, so a
    /// lock poisoned by a panicking `Hash` impl still guards a consistent turn.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, Turn<I>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn is_turn_of(&self, turn: &Turn<I>, id: &I) -> bool {
        self.phases[turn.phase].contains(id) && !turn.done.contains(id)
    }

    /// Blocks until `id` may act in the current phase.
    ///
    /// Returns once `id` is expected in the current phase and has not reported
    /// completion yet. Does not mark `id` as active; the caller must follow up
    /// with [`done`](Self::done).
    ///
    /// # Errors
    /// [`PhaseError::Timeout`] if the turn does not come within the configured
    /// timeout. The error carries the phase index at the moment of failure.
    pub fn wait_turn(&self, id: I) -> Result<(), PhaseError<I>> {
        let started = Instant::now();
        let mut turn = self.lock();

        // The turn predicate is re-checked after every wake-up, including one
        // reported through a poisoned lock.
        while !self.is_turn_of(&turn, &id) {
            let left = self.timeout.saturating_sub(started.elapsed());
            if left.is_zero() {
                let phase = turn.phase;
                drop(turn);
                let waited = started.elapsed();
                error!(participant = ?id, phase, ?waited, "timeout waiting for turn");
                return Err(PhaseError::Timeout { id, phase, waited });
            }
            turn = self
                .advanced
                .wait_timeout(turn, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        trace!(participant = ?id, phase = turn.phase, "turn granted");
        Ok(())
    }

    /// Records that `id` finished its turn in the current phase occurrence.
    ///
    /// The participant completing the phase advances the barrier and wakes
    /// every thread blocked in [`wait_turn`](Self::wait_turn).
    ///
    /// # Errors
    /// - [`PhaseError::OutOfPhase`] if `id` is not part of the current phase
    /// - [`PhaseError::DuplicateCompletion`] if `id` already reported in this
    ///   phase occurrence
    ///
    /// State is left untouched on error.
    pub fn done(&self, id: I) -> Result<(), PhaseError<I>> {
        {
            let mut turn = self.lock();
            let phase = turn.phase;
            let expected = &self.phases[phase];

            if !expected.contains(&id) {
                error!(participant = ?id, phase, "done() called out of phase");
                return Err(PhaseError::OutOfPhase { id, phase });
            }
            if !turn.done.insert(id) {
                error!(participant = ?id, phase, "done() called twice in same phase");
                return Err(PhaseError::DuplicateCompletion { id, phase });
            }
            if turn.done.len() < expected.len() {
                return Ok(());
            }

            turn.phase = (phase + 1) % self.phases.len();
            turn.done.clear();
            if turn.phase == 0 {
                turn.cycles += 1;
            }
            debug!(from = phase, to = turn.phase, cycles = turn.cycles, "phase advanced");
        }

        self.advanced.notify_all();
        Ok(())
    }
}
