//! Errors raised by simulation commands.
//!
//! Numeric clamps (pressure/flow floors, NRW and uptime ranges) are fail-soft
//! and never surface here.

use thiserror::Error;

use crate::types::{AnomalyKind, ZoneId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("Unknown zone index {index} (network has {count} zones)")]
    UnknownZone { index: usize, count: usize },

    #[error("Unknown zone code '{0}'")]
    UnknownZoneCode(String),

    #[error("{zone} already has an active {kind} anomaly")]
    AnomalyAlreadyActive { zone: ZoneId, kind: AnomalyKind },

    #[error("Simulation scheduler has stopped")]
    SchedulerStopped,
}
