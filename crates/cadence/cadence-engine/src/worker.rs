//! Worker loops run on the engine's threads.
//!
//! Every worker repeats `begin turn -> buffer operation -> end turn -> pace`.
//! How a turn begins and ends depends on the worker's [`Gate`]:
//! - **Phased**: the role appears in the barrier's cycle, so each turn is
//!   bracketed by `wait_turn` / `done`.
//! - **Free**: the role is not in any phase (only allowed for the publisher);
//!   it runs at its own pace until the engine raises the stop flag.

use cadence_config::Role;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tandem_events::{Message, MessagePtr};
use tandem_icc::{PubSubHub, Receiver};
use tandem_phase::{PhaseBarrier, PhaseError};
use tracing::{debug, error, info, trace};

/// What a worker did before it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub role: Role,
    /// Turns completed (phased) or loop iterations (free-running).
    pub turns: u64,
    /// Messages published. Always 0 for subscribers.
    pub published: u64,
    /// Reads that returned a message. Always 0 for the publisher.
    pub received: u64,
    /// Cycle counter seen on each read (`None` when the hub was still empty).
    /// Only recorded for bounded runs.
    pub history: Vec<Option<u16>>,
}

impl WorkerReport {
    fn new(role: Role) -> Self {
        Self {
            role,
            turns: 0,
            published: 0,
            received: 0,
            history: Vec::new(),
        }
    }
}

pub(crate) enum Gate<'a> {
    Phased {
        barrier: &'a PhaseBarrier<Role>,
        /// Turns left for a bounded run.
        remaining: Option<u64>,
    },
    Free {
        stop: &'a AtomicBool,
    },
}

impl Gate<'_> {
    /// Blocks until the next turn. `Ok(false)` once the worker should stop.
    fn begin(&mut self, role: Role) -> Result<bool, PhaseError<Role>> {
        match self {
            Gate::Phased { barrier, remaining } => {
                if *remaining == Some(0) {
                    return Ok(false);
                }
                barrier.wait_turn(role)?;
                if let Some(n) = remaining {
                    *n -= 1;
                }
                Ok(true)
            }
            Gate::Free { stop } => Ok(!stop.load(Ordering::Acquire)),
        }
    }

    fn end(&self, role: Role) -> Result<(), PhaseError<Role>> {
        match self {
            Gate::Phased { barrier, .. } => barrier.done(role),
            Gate::Free { .. } => Ok(()),
        }
    }

    fn is_bounded(&self) -> bool {
        matches!(self, Gate::Phased { remaining: Some(_), .. })
    }
}

#[inline]
fn pace(interval: Duration) {
    if !interval.is_zero() {
        thread::sleep(interval);
    }
}

/// Stops the worker and reports the violation with its role and phase.
fn stop_on_violation(role: Role, err: PhaseError<Role>) -> PhaseError<Role> {
    error!(
        worker = %role,
        phase = ?err.phase(),
        error = %err,
        "worker stopped on contract violation"
    );
    err
}

/// Publishes a fresh message with an incrementing cycle counter every turn.
pub(crate) fn run_publisher(
    hub: &PubSubHub<MessagePtr>,
    mut gate: Gate<'_>,
    interval: Duration,
) -> Result<WorkerReport, PhaseError<Role>> {
    let role = Role::Publisher;
    let tx = hub.make_publisher();
    let mut report = WorkerReport::new(role);
    let mut cycle_counter: u16 = 0;

    while gate.begin(role).map_err(|e| stop_on_violation(role, e))? {
        tx.publish(Message::with_cycle(cycle_counter).into_ptr());
        info!(worker = %role, cycle_counter, "published");
        trace!(worker = %role, ring = %hub.debug_snapshot(), "ring state");

        cycle_counter = cycle_counter.wrapping_add(1);
        report.published += 1;
        report.turns += 1;

        gate.end(role).map_err(|e| stop_on_violation(role, e))?;
        pace(interval);
    }

    debug!(worker = %role, published = report.published, "publisher finished");
    Ok(report)
}

/// Reads the latest message once per turn.
pub(crate) fn run_subscriber(
    role: Role,
    rx: Receiver<'_, MessagePtr>,
    mut gate: Gate<'_>,
    interval: Duration,
) -> Result<WorkerReport, PhaseError<Role>> {
    let mut report = WorkerReport::new(role);
    let record = gate.is_bounded();

    while gate.begin(role).map_err(|e| stop_on_violation(role, e))? {
        let latest = rx.try_get_latest();
        match &latest {
            Some(msg) => {
                info!(
                    worker = %role,
                    cycle_counter = msg.cycle_counter(),
                    status = ?msg.header.status(),
                    "received"
                );
                report.received += 1;
            }
            None => debug!(worker = %role, "nothing published yet"),
        }
        let seen = latest.map(|msg| msg.cycle_counter());
        if record {
            report.history.push(seen);
        }
        report.turns += 1;

        gate.end(role).map_err(|e| stop_on_violation(role, e))?;
        pace(interval);
    }

    debug!(worker = %role, turns = report.turns, "subscriber finished");
    Ok(report)
}
