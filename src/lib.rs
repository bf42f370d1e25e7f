//! Hydronauts: Water Distribution Telemetry Core
//!
//! Simulation engine behind the Smart Water Grid dashboard for a four-zone
//! municipal distribution network.
//!
//! ## Architecture
//!
//! - **Simulation**: synthetic pressure/flow signals, anomaly state machine,
//!   rolling history, alert log and fleet KPIs behind one owned context
//! - **Pipeline**: fixed-cadence scheduler actor that serializes ticks and
//!   operator commands and publishes immutable snapshots
//! - **Config**: TOML zone table and tunables with typo-tolerant validation

pub mod config;
pub mod pipeline;
pub mod simulation;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, NetworkConfig, ZoneConfig};

// Re-export commonly used types
pub use types::{
    AlertEvent, AnomalyKind, DetectionLevel, FleetMetrics, PumpStatus, RunState, Signal,
    SimulationSnapshot, ZoneHistory, ZoneId, ZoneReading, ZoneStatus,
};

// Re-export simulation core
pub use simulation::{Simulation, SimulationError, TickOutcome, TickReport};

// Re-export scheduler
pub use pipeline::{SimulationHandle, SimulationScheduler};
