//! Simulation Scheduler - fixed-cadence actor owning the simulation context
//!
//! One task owns `Simulation` outright. Ticks fire from a `tokio::time`
//! interval and operator commands arrive on a bounded mpsc channel; both are
//! applied by the same `select!` loop, so a command never interleaves with a
//! half-finished tick. After every committed mutation the actor swaps a fresh
//! `Arc<SimulationSnapshot>` into an `ArcSwap` and bumps a watch channel with
//! the published tick number.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::simulation::{Simulation, SimulationError, TickOutcome};
use crate::types::{AnomalyKind, SimulationSnapshot, ZoneId};

// ============================================================================
// Commands
// ============================================================================

type Reply<T> = oneshot::Sender<T>;

/// Commands for SimulationScheduler
#[derive(Debug)]
pub enum SimulationCommand {
    /// Run one tick immediately, outside the cadence
    Step { reply: Reply<TickOutcome> },
    ResolveAnomaly {
        zone: ZoneId,
        reply: Reply<Result<Option<AnomalyKind>, SimulationError>>,
    },
    ToggleValve {
        index: usize,
        reply: Reply<Result<bool, SimulationError>>,
    },
    InjectAnomaly {
        zone: ZoneId,
        kind: AnomalyKind,
        reply: Reply<Result<u64, SimulationError>>,
    },
    Pause { reply: Reply<bool> },
    Resume { reply: Reply<bool> },
    ClearAlerts { reply: Reply<usize> },
}

// ============================================================================
// Handle
// ============================================================================

/// Handle to interact with SimulationScheduler
///
/// Cloneable. Snapshot reads never touch the actor; commands round-trip
/// through it and fail with `SchedulerStopped` once it has exited.
#[derive(Clone)]
pub struct SimulationHandle {
    tx: mpsc::Sender<SimulationCommand>,
    snapshot: Arc<ArcSwap<SimulationSnapshot>>,
    published: watch::Receiver<u64>,
}

impl SimulationHandle {
    /// Latest committed snapshot.
    pub fn snapshot(&self) -> Arc<SimulationSnapshot> {
        self.snapshot.load_full()
    }

    /// Watch receiver carrying the tick number of each publication.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.published.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn step(&self) -> Result<TickOutcome, SimulationError> {
        self.request(|reply| SimulationCommand::Step { reply }).await
    }

    pub async fn resolve_anomaly(&self, zone: ZoneId) -> Result<Option<AnomalyKind>, SimulationError> {
        self.request(|reply| SimulationCommand::ResolveAnomaly { zone, reply })
            .await?
    }

    pub async fn toggle_valve(&self, index: usize) -> Result<bool, SimulationError> {
        self.request(|reply| SimulationCommand::ToggleValve { index, reply })
            .await?
    }

    pub async fn inject_anomaly(&self, zone: ZoneId, kind: AnomalyKind) -> Result<u64, SimulationError> {
        self.request(|reply| SimulationCommand::InjectAnomaly { zone, kind, reply })
            .await?
    }

    pub async fn pause(&self) -> Result<bool, SimulationError> {
        self.request(|reply| SimulationCommand::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<bool, SimulationError> {
        self.request(|reply| SimulationCommand::Resume { reply }).await
    }

    pub async fn clear_alerts(&self) -> Result<usize, SimulationError> {
        self.request(|reply| SimulationCommand::ClearAlerts { reply })
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SimulationCommand,
    ) -> Result<T, SimulationError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| SimulationError::SchedulerStopped)?;
        response.await.map_err(|_| SimulationError::SchedulerStopped)
    }
}

// ============================================================================
// Scheduler Actor
// ============================================================================

enum SchedulerEvent {
    Command(SimulationCommand),
    Tick,
}

pub struct SimulationScheduler<R = StdRng> {
    simulation: Simulation<R>,
    rx: mpsc::Receiver<SimulationCommand>,
    snapshot: Arc<ArcSwap<SimulationSnapshot>>,
    published: watch::Sender<u64>,
    interval: Duration,
    tick_limit: Option<u64>,
    cancel_token: CancellationToken,
}

impl<R: Rng> SimulationScheduler<R> {
    /// Create the actor and its handle. The initial snapshot is published
    /// before this returns.
    pub fn new(
        simulation: Simulation<R>,
        interval: Duration,
        command_buffer: usize,
        cancel_token: CancellationToken,
    ) -> (Self, SimulationHandle) {
        let (tx, rx) = mpsc::channel(command_buffer.max(1));
        let initial = simulation.snapshot();
        let (published, published_rx) = watch::channel(initial.tick);
        let snapshot = Arc::new(ArcSwap::from_pointee(initial));

        let scheduler = Self {
            simulation,
            rx,
            snapshot: Arc::clone(&snapshot),
            published,
            interval: interval.max(Duration::from_millis(1)),
            tick_limit: None,
            cancel_token,
        };
        let handle = SimulationHandle {
            tx,
            snapshot,
            published: published_rx,
        };

        (scheduler, handle)
    }

    /// Stop once the simulation tick reaches `limit`. The tick that reaches
    /// it is the last one committed and published.
    pub fn with_tick_limit(mut self, limit: Option<u64>) -> Self {
        self.tick_limit = limit;
        self
    }

    fn limit_reached(&self) -> bool {
        self.tick_limit
            .is_some_and(|limit| self.simulation.tick() >= limit)
    }

    /// Run until cancelled, every handle is dropped or the tick limit is
    /// reached, then hand the simulation back.
    pub async fn run(mut self) -> Simulation<R> {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            tick = self.simulation.tick(),
            tick_limit = ?self.tick_limit,
            "Simulation scheduler starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.limit_reached() {
                info!(tick = self.simulation.tick(), "Tick limit reached");
                break;
            }

            let event = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    info!("Simulation scheduler shutdown signal received");
                    break;
                }
                command = self.rx.recv() => match command {
                    Some(command) => SchedulerEvent::Command(command),
                    None => {
                        info!("All simulation handles dropped");
                        break;
                    }
                },
                _ = ticker.tick() => SchedulerEvent::Tick,
            };

            match event {
                SchedulerEvent::Command(command) => self.apply(command),
                SchedulerEvent::Tick => {
                    self.tick();
                }
            }
        }

        info!(
            tick = self.simulation.tick(),
            skipped_ticks = self.simulation.skipped_ticks(),
            total_alerts = self.simulation.alerts().total_alerts(),
            "Simulation scheduler stopped"
        );
        self.simulation
    }

    fn tick(&mut self) -> TickOutcome {
        let outcome = self.simulation.step();
        if let Some(report) = outcome.report() {
            debug!(
                tick = report.tick,
                onsets = report.onsets.len(),
                auto_resolved = report.auto_resolved.len(),
                metrics_updated = report.metrics_updated,
                "Tick committed"
            );
            self.publish();
        }
        outcome
    }

    fn apply(&mut self, command: SimulationCommand) {
        // Receivers that gave up waiting are not an error for the actor.
        match command {
            SimulationCommand::Step { reply } => {
                let outcome = self.tick();
                let _ = reply.send(outcome);
                return;
            }
            SimulationCommand::ResolveAnomaly { zone, reply } => {
                let _ = reply.send(self.simulation.resolve_anomaly(zone));
            }
            SimulationCommand::ToggleValve { index, reply } => {
                let _ = reply.send(self.simulation.toggle_valve(index));
            }
            SimulationCommand::InjectAnomaly { zone, kind, reply } => {
                let _ = reply.send(self.simulation.inject_anomaly(zone, kind));
            }
            SimulationCommand::Pause { reply } => {
                let _ = reply.send(self.simulation.pause());
            }
            SimulationCommand::Resume { reply } => {
                let _ = reply.send(self.simulation.resume());
            }
            SimulationCommand::ClearAlerts { reply } => {
                let _ = reply.send(self.simulation.clear_alerts());
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.simulation.snapshot();
        let tick = snapshot.tick;
        self.snapshot.store(Arc::new(snapshot));
        self.published.send_replace(tick);
    }
}

impl<R: Rng + Send + 'static> SimulationScheduler<R> {
    /// Spawn the actor on the current runtime.
    pub fn spawn(self) -> JoinHandle<Simulation<R>> {
        tokio::spawn(self.run())
    }
}
