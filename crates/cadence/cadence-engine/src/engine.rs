use crate::error::EngineError;
use crate::worker::{Gate, WorkerReport, run_publisher, run_subscriber};
use cadence_config::{CadenceConfig, Role};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ScopedJoinHandle};
use tandem_events::MessagePtr;
use tandem_icc::PubSubHub;
use tandem_phase::{PhaseBarrier, PhaseError, PhaseState};
use tracing::{debug, info, warn};

/// One publisher and up to three subscribers sharing a hub, ordered by a
/// phase barrier.
///
/// The hub and barrier live inside the engine and every worker thread is
/// scoped to [`run`](Self::run), so no handle can outlive the hub.
pub struct CadenceEngine {
    pub config: CadenceConfig,
    pub hub: PubSubHub<MessagePtr>,
    pub barrier: PhaseBarrier<Role>,
}

/// Outcome of a bounded run.
#[derive(Debug)]
pub struct EngineReport {
    /// One entry per spawned worker, publisher first.
    pub workers: Vec<WorkerReport>,
    /// Barrier state once every worker stopped.
    pub phase: PhaseState<Role>,
}

impl EngineReport {
    pub fn worker(&self, role: Role) -> Option<&WorkerReport> {
        self.workers.iter().find(|w| w.role == role)
    }
}

type WorkerHandle<'scope> = ScopedJoinHandle<'scope, Result<WorkerReport, PhaseError<Role>>>;

impl CadenceEngine {
    pub fn new(config: CadenceConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let hub = PubSubHub::new(config.capacity)?;
        let barrier = PhaseBarrier::new(config.phases.clone(), config.timeout())?;
        Ok(CadenceEngine {
            config,
            hub,
            barrier,
        })
    }

    /// Gate for a role that appears in the phase cycle.
    ///
    /// `validate` already rejected a `rounds` whose turn count overflows.
    fn phased_gate(&self, role: Role) -> Gate<'_> {
        let per_cycle = self.barrier.turns_per_cycle(role) as u64;
        Gate::Phased {
            barrier: &self.barrier,
            remaining: self.config.rounds.map(|rounds| rounds.saturating_mul(per_cycle)),
        }
    }

    /// Runs every worker until the configured number of rounds completes.
    ///
    /// With `rounds = None` this only returns on a contract violation.
    /// The first violation (in publisher, A, B, C order) is returned after
    /// all threads have stopped.
    pub fn run(&self) -> Result<EngineReport, EngineError> {
        let stop = AtomicBool::new(false);
        let publisher_gated = self.barrier.participates(Role::Publisher);

        info!(
            capacity = self.hub.capacity(),
            phases = self.barrier.phase_count(),
            rounds = ?self.config.rounds,
            publisher_gated,
            "starting workers"
        );

        let results = thread::scope(|s| {
            let publisher_interval = self.config.publish_interval();
            let subscriber_interval = self.config.subscriber_interval();

            let publisher_gate = if publisher_gated {
                self.phased_gate(Role::Publisher)
            } else {
                Gate::Free { stop: &stop }
            };
            let publisher =
                s.spawn(move || run_publisher(&self.hub, publisher_gate, publisher_interval));

            let mut gated: Vec<(Role, WorkerHandle<'_>)> = Vec::new();
            for role in Role::SUBSCRIBERS {
                if !self.barrier.participates(role) {
                    warn!(worker = %role, "not part of any phase, never gets a turn; not started");
                    continue;
                }
                let gate = self.phased_gate(role);
                let rx = self.hub.make_receiver();
                let handle = s.spawn(move || run_subscriber(role, rx, gate, subscriber_interval));
                gated.push((role, handle));
            }

            let mut results: Vec<(Role, thread::Result<_>)> = Vec::new();
            if publisher_gated {
                results.push((Role::Publisher, publisher.join()));
                results.extend(gated.into_iter().map(|(role, h)| (role, h.join())));
            } else {
                // The free-running publisher stops once the phased workers are done.
                let subscribers: Vec<_> =
                    gated.into_iter().map(|(role, h)| (role, h.join())).collect();
                stop.store(true, Ordering::Release);
                results.push((Role::Publisher, publisher.join()));
                results.extend(subscribers);
            }
            results
        });

        let mut workers = Vec::with_capacity(results.len());
        let mut first_error: Option<EngineError> = None;
        for (role, joined) in results {
            let err = match joined {
                Ok(Ok(report)) => {
                    workers.push(report);
                    continue;
                }
                Ok(Err(violation)) => EngineError::Phase(violation),
                Err(_) => EngineError::WorkerPanicked { role },
            };
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let phase = self.barrier.state();
        let ring = self.hub.debug_snapshot();
        debug!(
            %ring,
            latest = ?ring.latest().map(|msg| msg.cycle_counter()),
            cycles = phase.cycles,
            "all workers stopped"
        );
        Ok(EngineReport { workers, phase })
    }
}
