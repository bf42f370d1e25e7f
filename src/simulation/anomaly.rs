//! Per-zone anomaly lifecycle.
//!
//! ```text
//!            p_inject (uniform kind)
//!   None  ───────────────────────────▶  Leak | Burst | LowPressure
//!    ▲                                          │
//!    └──────── p_resolve  or  manual resolve ───┘
//! ```
//!
//! Within one tick the injection roll runs first and only from `None`, then
//! the active offset is read, then the resolution roll runs. A zone active at
//! the start of a tick therefore can never be re-injected in that tick, and
//! there is no direct transition between two active kinds.

use rand::Rng;

use super::SimulationError;
use crate::config::AnomalyConfig;
use crate::types::{AnomalyKind, ZoneId};

/// Outcome of one zone's anomaly roll for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnomalyRoll {
    /// Set when the zone went None → active this tick
    pub onset: Option<AnomalyKind>,
    /// Pressure penalty to apply to this tick's sample
    pub offset: f64,
    /// Set when the active anomaly cleared on its own this tick
    pub auto_resolved: Option<AnomalyKind>,
}

#[derive(Debug, Clone)]
pub struct AnomalyStateMachine {
    states: Vec<Option<AnomalyKind>>,
    config: AnomalyConfig,
}

impl AnomalyStateMachine {
    pub fn new(zone_count: usize, config: AnomalyConfig) -> Self {
        Self {
            states: vec![None; zone_count],
            config,
        }
    }

    pub fn state(&self, zone: ZoneId) -> Option<AnomalyKind> {
        self.states.get(zone.index()).copied().flatten()
    }

    pub fn active_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_some()).count()
    }

    /// Additive pressure penalty of an anomaly kind (bar).
    pub const fn offset(&self, kind: AnomalyKind) -> f64 {
        match kind {
            AnomalyKind::Leak => self.config.leak_offset,
            AnomalyKind::Burst => self.config.burst_offset,
            AnomalyKind::LowPressure => self.config.low_pressure_offset,
        }
    }

    /// Run the per-tick injection and auto-resolution checks for one zone.
    ///
    /// Consumes one uniform draw for injection, one more for the kind on
    /// success, and one for resolution while active.
    pub fn roll<R: Rng + ?Sized>(&mut self, zone: ZoneId, rng: &mut R) -> AnomalyRoll {
        let Some(mut current) = self.states.get(zone.index()).copied() else {
            return AnomalyRoll::default();
        };

        let mut roll = AnomalyRoll::default();

        if current.is_none() && rng.gen::<f64>() < self.config.inject_probability {
            let kind = AnomalyKind::ALL[rng.gen_range(0..AnomalyKind::ALL.len())];
            current = Some(kind);
            roll.onset = Some(kind);
        }

        if let Some(kind) = current {
            roll.offset = self.offset(kind);
            if rng.gen::<f64>() < self.config.resolve_probability {
                roll.auto_resolved = Some(kind);
                current = None;
            }
        }

        self.states[zone.index()] = current;
        roll
    }

    /// Force `None → kind`. Rejected if the zone is already active.
    pub fn force(&mut self, zone: ZoneId, kind: AnomalyKind) -> Result<(), SimulationError> {
        let count = self.states.len();
        let slot = self
            .states
            .get_mut(zone.index())
            .ok_or(SimulationError::UnknownZone { index: zone.index(), count })?;
        if let Some(active) = *slot {
            return Err(SimulationError::AnomalyAlreadyActive { zone, kind: active });
        }
        *slot = Some(kind);
        Ok(())
    }

    /// Force `active → None`. Idempotent; returns what was cleared.
    pub fn resolve(&mut self, zone: ZoneId) -> Result<Option<AnomalyKind>, SimulationError> {
        let count = self.states.len();
        self.states
            .get_mut(zone.index())
            .map(Option::take)
            .ok_or(SimulationError::UnknownZone { index: zone.index(), count })
    }
}
