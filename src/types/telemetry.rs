//! Published telemetry types: alerts, fleet metrics and the consistent snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AnomalyKind, ZoneId, ZoneReading};

/// Sampled signal of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Pressure,
    Flow,
}

/// Scheduler run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => write!(f, "RUNNING"),
            RunState::Paused => write!(f, "PAUSED"),
        }
    }
}

// ============================================================================
// Alerts
// ============================================================================

/// One anomaly onset, recorded on the None → active transition only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Monotonic sequence number, never reused (survives log clears)
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub zone: ZoneId,
    pub kind: AnomalyKind,
    pub message: String,
}

impl AlertEvent {
    /// Wall-clock time as shown in the alert feed (`HH:MM:SS`).
    pub fn clock_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

// ============================================================================
// Fleet Metrics
// ============================================================================

/// Fleet-wide KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetMetrics {
    /// Non-revenue water (percent, clamped to [10, 35])
    pub nrw_percent: f64,
    /// Cumulative pumping energy (kWh, never decreases)
    pub energy_kwh: f64,
    /// Network uptime (percent, [90, 100])
    pub uptime_percent: f64,
    /// Alerts raised since start or since the last clear
    pub total_alerts: u64,
    /// Zones with an active anomaly at snapshot time
    pub active_anomalies: usize,
    /// Tick at which the KPIs were last recomputed
    pub last_update_tick: u64,
    /// Current simulation tick
    pub tick: u64,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Rolling history of one zone, oldest sample first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneHistory {
    pub zone: ZoneId,
    pub pressure: Vec<f64>,
    pub flow: Vec<f64>,
}

/// Immutable, fully consistent copy of the core after a committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub tick: u64,
    pub run_state: RunState,
    pub zones: Vec<ZoneReading>,
    pub history: Vec<ZoneHistory>,
    /// Newest first
    pub alerts: Vec<AlertEvent>,
    pub metrics: FleetMetrics,
}

impl SimulationSnapshot {
    pub fn zone(&self, id: ZoneId) -> Option<&ZoneReading> {
        self.zones.get(id.index())
    }

    pub fn history_of(&self, id: ZoneId, signal: Signal) -> Option<&[f64]> {
        self.history.get(id.index()).map(|h| match signal {
            Signal::Pressure => h.pressure.as_slice(),
            Signal::Flow => h.flow.as_slice(),
        })
    }

    /// Status bar text, e.g. `RUNNING · Alerts 3`.
    pub fn status_line(&self) -> String {
        format!("{} · Alerts {}", self.run_state, self.metrics.total_alerts)
    }
}
