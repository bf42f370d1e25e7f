//! Operator controls: valve flags, pump labels and the run/pause switch.
//!
//! Valve and pump state are reported only. Neither feeds back into the
//! pressure/flow model.

use tracing::info;

use super::SimulationError;
use crate::config::ZoneConfig;
use crate::types::{PumpStatus, RunState, ZoneId};

#[derive(Debug, Clone)]
pub struct ControlSurface {
    valves: Vec<bool>,
    pumps: Vec<PumpStatus>,
    run_state: RunState,
}

impl ControlSurface {
    pub fn from_zones(zones: &[ZoneConfig]) -> Self {
        Self {
            valves: zones.iter().map(|z| z.valve_open).collect(),
            pumps: zones.iter().map(|z| z.pump).collect(),
            run_state: RunState::Running,
        }
    }

    /// Flip a valve and return its new position (`true` = open).
    pub fn toggle_valve(&mut self, index: usize) -> Result<bool, SimulationError> {
        let count = self.valves.len();
        let valve = self
            .valves
            .get_mut(index)
            .ok_or(SimulationError::UnknownZone { index, count })?;
        *valve = !*valve;
        info!(zone = index, open = *valve, "Valve toggled");
        Ok(*valve)
    }

    pub fn valve_open(&self, zone: ZoneId) -> Option<bool> {
        self.valves.get(zone.index()).copied()
    }

    pub fn pump(&self, zone: ZoneId) -> Option<PumpStatus> {
        self.pumps.get(zone.index()).copied()
    }

    /// Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        self.transition(RunState::Paused)
    }

    /// Returns `true` if the state changed.
    pub fn resume(&mut self) -> bool {
        self.transition(RunState::Running)
    }

    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    fn transition(&mut self, to: RunState) -> bool {
        if self.run_state == to {
            return false;
        }
        info!(from = %self.run_state, to = %to, "Simulation run state changed");
        self.run_state = to;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    fn surface() -> ControlSurface {
        ControlSurface::from_zones(&NetworkConfig::default().zones)
    }

    #[test]
    fn test_initial_flags_follow_config() {
        let c = surface();
        assert_eq!(c.valve_open(ZoneId::new(0)), Some(true));
        assert_eq!(c.valve_open(ZoneId::new(2)), Some(false));
        assert_eq!(c.pump(ZoneId::new(2)), Some(PumpStatus::Standby));
        assert_eq!(c.run_state(), RunState::Running);
    }

    #[test]
    fn test_toggle_is_involutive() {
        let mut c = surface();
        for i in 0..4 {
            let before = c.valve_open(ZoneId::new(i)).expect("known zone");
            assert_eq!(c.toggle_valve(i), Ok(!before));
            assert_eq!(c.toggle_valve(i), Ok(before));
            assert_eq!(c.valve_open(ZoneId::new(i)), Some(before));
        }
    }

    #[test]
    fn test_toggle_unknown_index() {
        let mut c = surface();
        assert_eq!(
            c.toggle_valve(4),
            Err(SimulationError::UnknownZone { index: 4, count: 4 })
        );
    }

    #[test]
    fn test_pause_resume_report_changes() {
        let mut c = surface();
        assert!(c.pause());
        assert!(!c.pause());
        assert!(c.is_paused());
        assert!(c.resume());
        assert!(!c.resume());
        assert_eq!(c.run_state(), RunState::Running);
    }
}
