//! Simulation Context - water network telemetry core
//!
//! `Simulation` owns every piece of mutable core state: the anomaly state
//! machine, the rolling history, the alert log, the fleet metrics, the
//! operator controls and the random source. It is constructed once from a
//! `NetworkConfig` and driven through `&mut self`, so a single owner (the
//! scheduler actor, or a test) serializes ticks and commands.
//!
//! ## Tick Order
//!
//! For each zone, in zone order:
//! 1. draw pressure noise
//! 2. anomaly roll (injection from `None`, then auto-resolution)
//! 3. alert on onset
//! 4. build the sample with the tick's offset, push pressure and flow
//!
//! Then, on every `metrics.update_every_ticks`-th tick, the fleet KPIs are
//! recomputed from the post-tick anomaly count.
//!
//! ## Random Source
//!
//! `Simulation<R>` is generic over `rand::Rng`. Production uses `StdRng`
//! seeded from `scheduler.seed` (or OS entropy); tests pass any seeded RNG
//! and get byte-identical runs.

mod alerts;
mod anomaly;
mod controls;
mod error;
mod history;
mod metrics;
mod signal;

pub use alerts::AlertLog;
pub use anomaly::{AnomalyRoll, AnomalyStateMachine};
pub use controls::ControlSurface;
pub use error::SimulationError;
pub use history::{HistoryBuffer, RollingHistoryStore};
pub use metrics::{uptime_for, MetricsAggregator};
pub use signal::{
    anomaly_score, demand_wave, detection_level, round_to, zone_status, SignalSample,
    ZoneSignalGenerator,
};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use tracing::{debug, info, warn};

use crate::config::{defaults, ConfigError, NetworkConfig, ZoneConfig};
use crate::types::{
    AnomalyKind, FleetMetrics, RunState, Signal, SimulationSnapshot, ZoneHistory, ZoneId,
    ZoneReading, ZoneStatus,
};

// ============================================================================
// Tick Outcome
// ============================================================================

/// What one committed tick changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub onsets: Vec<(ZoneId, AnomalyKind)>,
    pub auto_resolved: Vec<(ZoneId, AnomalyKind)>,
    pub metrics_updated: bool,
}

/// Result of one cadence tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The simulation advanced to a new tick
    Advanced(TickReport),
    /// Paused: nothing mutated, the simulation tick did not move
    Paused { tick: u64, skipped_ticks: u64 },
}

impl TickOutcome {
    pub const fn tick(&self) -> u64 {
        match self {
            Self::Advanced(report) => report.tick,
            Self::Paused { tick, .. } => *tick,
        }
    }

    pub const fn report(&self) -> Option<&TickReport> {
        match self {
            Self::Advanced(report) => Some(report),
            Self::Paused { .. } => None,
        }
    }

    pub const fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }
}

// ============================================================================
// Simulation Context
// ============================================================================

pub struct Simulation<R = StdRng> {
    zones: Vec<ZoneConfig>,
    rng: R,
    tick: u64,
    skipped_ticks: u64,
    generator: ZoneSignalGenerator,
    anomalies: AnomalyStateMachine,
    history: RollingHistoryStore,
    alerts: AlertLog,
    metrics: MetricsAggregator,
    controls: ControlSurface,
}

impl Simulation<StdRng> {
    /// Build from config, seeding from `scheduler.seed` or OS entropy.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, ConfigError> {
        let rng = match config.scheduler.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Build from config with an explicit seed (overrides `scheduler.seed`).
    pub fn seeded(config: &NetworkConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Build from config with an injected random source.
    ///
    /// Pressure history is seeded with each zone's base pressure, flow history
    /// with one `U(8, 14)` draw per zone.
    pub fn with_rng(config: &NetworkConfig, mut rng: R) -> Result<Self, ConfigError> {
        config.validate()?;

        let generator = ZoneSignalGenerator::new(&config.signal)?;
        let metrics = MetricsAggregator::new(&config.metrics)?;

        let flow_seed = Uniform::new(defaults::FLOW_SEED_MIN_LPS, defaults::FLOW_SEED_MAX_LPS);
        let seeds: Vec<(f64, f64)> = config
            .zones
            .iter()
            .map(|z| {
                let flow = round_to(flow_seed.sample(&mut rng), defaults::FLOW_DECIMALS);
                (z.base_pressure_bar, flow)
            })
            .collect();

        info!(
            zones = config.zones.len(),
            history_capacity = defaults::HISTORY_CAPACITY,
            alert_capacity = defaults::ALERT_LOG_CAPACITY,
            inject_probability = config.anomaly.inject_probability,
            resolve_probability = config.anomaly.resolve_probability,
            "Simulation context initialised"
        );

        Ok(Self {
            zones: config.zones.clone(),
            rng,
            tick: 0,
            skipped_ticks: 0,
            generator,
            anomalies: AnomalyStateMachine::new(config.zones.len(), config.anomaly.clone()),
            history: RollingHistoryStore::new(defaults::HISTORY_CAPACITY, seeds),
            alerts: AlertLog::new(defaults::ALERT_LOG_CAPACITY),
            metrics,
            controls: ControlSurface::from_zones(&config.zones),
        })
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance exactly one tick, or count a skipped tick while paused.
    pub fn step(&mut self) -> TickOutcome {
        if self.controls.is_paused() {
            self.skipped_ticks += 1;
            debug!(
                tick = self.tick,
                skipped_ticks = self.skipped_ticks,
                "Simulation paused, tick skipped"
            );
            return TickOutcome::Paused {
                tick: self.tick,
                skipped_ticks: self.skipped_ticks,
            };
        }

        self.tick += 1;
        let tick = self.tick;
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        for (index, zone) in self.zones.iter().enumerate() {
            let id = ZoneId::new(index);
            let noise = self.generator.draw_noise(&mut self.rng);
            let roll = self.anomalies.roll(id, &mut self.rng);

            if let Some(kind) = roll.onset {
                let seq = self.alerts.on_anomaly_onset(id, &zone.name, kind, Utc::now());
                warn!(
                    tick,
                    seq,
                    zone = %zone.code,
                    anomaly = %kind,
                    "Anomaly onset in {}",
                    zone.name
                );
                report.onsets.push((id, kind));
            }

            let sample = self
                .generator
                .sample(zone.base_pressure_bar, tick, noise, roll.offset, &mut self.rng);
            self.history.push(id, Signal::Pressure, sample.pressure_bar);
            self.history.push(id, Signal::Flow, sample.flow_lps);

            if let Some(kind) = roll.auto_resolved {
                info!(tick, zone = %zone.code, anomaly = %kind, "Anomaly auto-resolved");
                report.auto_resolved.push((id, kind));
            }
        }

        if self.metrics.is_due(tick) {
            self.metrics
                .update(tick, self.anomalies.active_count(), &mut self.rng);
            report.metrics_updated = true;
        }

        TickOutcome::Advanced(report)
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Clear a zone's anomaly immediately. Idempotent; the alert log is untouched.
    pub fn resolve_anomaly(&mut self, zone: ZoneId) -> Result<Option<AnomalyKind>, SimulationError> {
        let resolved = self.anomalies.resolve(zone)?;
        match resolved {
            Some(kind) => info!(tick = self.tick, zone = %zone, anomaly = %kind, "Anomaly resolved by operator"),
            None => debug!(zone = %zone, "Resolve requested for zone without anomaly"),
        }
        Ok(resolved)
    }

    /// Flip a zone's valve flag by index. Returns the new position.
    pub fn toggle_valve(&mut self, index: usize) -> Result<bool, SimulationError> {
        self.controls.toggle_valve(index)
    }

    /// Force an anomaly onset (operator drill). Raises an alert like a random
    /// onset and returns its sequence number.
    pub fn inject_anomaly(&mut self, zone: ZoneId, kind: AnomalyKind) -> Result<u64, SimulationError> {
        let name = self.zone_config(zone)?.name.clone();
        self.anomalies.force(zone, kind)?;
        let seq = self.alerts.on_anomaly_onset(zone, &name, kind, Utc::now());
        warn!(tick = self.tick, seq, zone = %zone, anomaly = %kind, "Anomaly injected in {}", name);
        Ok(seq)
    }

    pub fn pause(&mut self) -> bool {
        self.controls.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.controls.resume()
    }

    /// Empty the alert log and zero `total_alerts`. Anomalies stay active.
    pub fn clear_alerts(&mut self) -> usize {
        let cleared = self.alerts.clear();
        info!(cleared, active_anomalies = self.anomalies.active_count(), "Alert log cleared");
        cleared
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Resolve an operator zone code ("A", "b", ...) to its id.
    pub fn zone_by_code(&self, code: &str) -> Result<ZoneId, SimulationError> {
        self.zones
            .iter()
            .position(|z| z.code.eq_ignore_ascii_case(code.trim()))
            .map(ZoneId::new)
            .ok_or_else(|| SimulationError::UnknownZoneCode(code.to_string()))
    }

    pub fn zone_config(&self, zone: ZoneId) -> Result<&ZoneConfig, SimulationError> {
        self.zones.get(zone.index()).ok_or(SimulationError::UnknownZone {
            index: zone.index(),
            count: self.zones.len(),
        })
    }

    pub fn zone_status(&self, zone: ZoneId) -> Result<ZoneStatus, SimulationError> {
        let config = self.zone_config(zone)?;
        let pressure = self
            .history
            .latest(zone, Signal::Pressure)
            .unwrap_or(config.base_pressure_bar);
        Ok(self.generator.status(config, pressure, self.anomalies.state(zone)))
    }

    pub fn zones(&self) -> &[ZoneConfig] {
        &self.zones
    }

    pub const fn tick(&self) -> u64 {
        self.tick
    }

    pub const fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    pub const fn run_state(&self) -> RunState {
        self.controls.run_state()
    }

    pub fn anomaly(&self, zone: ZoneId) -> Option<AnomalyKind> {
        self.anomalies.state(zone)
    }

    pub const fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub const fn history(&self) -> &RollingHistoryStore {
        &self.history
    }

    pub const fn metrics(&self) -> &MetricsAggregator {
        &self.metrics
    }

    pub const fn controls(&self) -> &ControlSurface {
        &self.controls
    }

    /// Copy all committed state into an immutable snapshot.
    pub fn snapshot(&self) -> SimulationSnapshot {
        let zones = self
            .zones
            .iter()
            .enumerate()
            .map(|(index, config)| {
                let id = ZoneId::new(index);
                let pressure = self
                    .history
                    .latest(id, Signal::Pressure)
                    .unwrap_or(config.base_pressure_bar);
                let anomaly = self.anomalies.state(id);
                let score = anomaly_score(config, pressure);
                ZoneReading {
                    id,
                    code: config.code.clone(),
                    name: config.name.clone(),
                    pressure_bar: pressure,
                    flow_lps: self.history.latest(id, Signal::Flow).unwrap_or_default(),
                    status: self.generator.status(config, pressure, anomaly),
                    anomaly,
                    anomaly_score: score,
                    detection: detection_level(score, anomaly),
                    valve_open: self.controls.valve_open(id).unwrap_or(config.valve_open),
                    pump: self.controls.pump(id).unwrap_or(config.pump),
                }
            })
            .collect();

        let history = (0..self.zones.len())
            .map(ZoneId::new)
            .map(|id| ZoneHistory {
                zone: id,
                pressure: self.history.snapshot(id, Signal::Pressure).unwrap_or_default(),
                flow: self.history.snapshot(id, Signal::Flow).unwrap_or_default(),
            })
            .collect();

        SimulationSnapshot {
            tick: self.tick,
            run_state: self.controls.run_state(),
            zones,
            history,
            alerts: self.alerts.to_vec(),
            metrics: FleetMetrics {
                nrw_percent: self.metrics.nrw_percent(),
                energy_kwh: self.metrics.energy_kwh(),
                uptime_percent: self.metrics.uptime_percent(),
                total_alerts: self.alerts.total_alerts(),
                active_anomalies: self.anomalies.active_count(),
                last_update_tick: self.metrics.last_update_tick(),
                tick: self.tick,
            },
        }
    }
}

impl<R> std::fmt::Debug for Simulation<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("run_state", &self.controls.run_state())
            .field("zones", &self.zones.len())
            .field("active_anomalies", &self.anomalies.active_count())
            .field("total_alerts", &self.alerts.total_alerts())
            .finish_non_exhaustive()
    }
}
