//! Fleet KPI aggregation (NRW, energy, uptime), recomputed every N ticks.

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use tracing::debug;

use crate::config::{defaults, ConfigError, MetricsConfig};

/// Uptime for a given number of concurrently active anomalies.
pub fn uptime_for(active_anomalies: usize, penalty_per_anomaly: f64) -> f64 {
    if active_anomalies == 0 {
        defaults::UPTIME_MAX_PERCENT
    } else {
        (defaults::UPTIME_MAX_PERCENT - penalty_per_anomaly * active_anomalies as f64)
            .clamp(defaults::UPTIME_MIN_PERCENT, defaults::UPTIME_MAX_PERCENT)
    }
}

#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    nrw_percent: f64,
    energy_kwh: f64,
    uptime_percent: f64,
    last_update_tick: u64,
    every_ticks: u64,
    uptime_penalty: f64,
    nrw_drift: Normal<f64>,
    energy_step: Uniform<f64>,
}

impl MetricsAggregator {
    pub fn new(config: &MetricsConfig) -> Result<Self, ConfigError> {
        let nrw_drift = Normal::new(0.0, config.nrw_std_dev)
            .map_err(|e| ConfigError::Validation(vec![format!("metrics.nrw_std_dev: {e}")]))?;
        if !(config.energy_step_min < config.energy_step_max) || config.update_every_ticks == 0 {
            return Err(ConfigError::Validation(vec![
                "metrics: energy_step_min < energy_step_max and update_every_ticks > 0 required"
                    .to_string(),
            ]));
        }
        Ok(Self {
            nrw_percent: config
                .initial_nrw_percent
                .clamp(defaults::NRW_MIN_PERCENT, defaults::NRW_MAX_PERCENT),
            energy_kwh: 0.0,
            uptime_percent: config
                .initial_uptime_percent
                .clamp(defaults::UPTIME_MIN_PERCENT, defaults::UPTIME_MAX_PERCENT),
            last_update_tick: 0,
            every_ticks: config.update_every_ticks,
            uptime_penalty: config.uptime_penalty_per_anomaly,
            nrw_drift,
            energy_step: Uniform::new(config.energy_step_min, config.energy_step_max),
        })
    }

    pub const fn is_due(&self, tick: u64) -> bool {
        tick % self.every_ticks == 0
    }

    /// Drift NRW, accumulate energy and recompute uptime.
    pub fn update<R: Rng + ?Sized>(&mut self, tick: u64, active_anomalies: usize, rng: &mut R) {
        self.nrw_percent = (self.nrw_percent + self.nrw_drift.sample(rng))
            .clamp(defaults::NRW_MIN_PERCENT, defaults::NRW_MAX_PERCENT);
        self.energy_kwh += self.energy_step.sample(rng);
        self.uptime_percent = uptime_for(active_anomalies, self.uptime_penalty);
        self.last_update_tick = tick;

        debug!(
            tick,
            nrw_percent = self.nrw_percent,
            energy_kwh = self.energy_kwh,
            uptime_percent = self.uptime_percent,
            active_anomalies,
            "Fleet metrics updated"
        );
    }

    pub const fn nrw_percent(&self) -> f64 {
        self.nrw_percent
    }

    pub const fn energy_kwh(&self) -> f64 {
        self.energy_kwh
    }

    pub const fn uptime_percent(&self) -> f64 {
        self.uptime_percent
    }

    pub const fn last_update_tick(&self) -> u64 {
        self.last_update_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_uptime_formula() {
        assert_eq!(uptime_for(0, 2.5), 100.0);
        assert_eq!(uptime_for(1, 2.5), 97.5);
        assert_eq!(uptime_for(2, 2.5), 95.0);
        assert_eq!(uptime_for(4, 2.5), 90.0);
        assert_eq!(uptime_for(10, 2.5), 90.0);
    }

    #[test]
    fn test_initial_values() {
        let m = MetricsAggregator::new(&MetricsConfig::default()).expect("metrics");
        assert_eq!(m.nrw_percent(), 18.4);
        assert_eq!(m.energy_kwh(), 0.0);
        assert_eq!(m.uptime_percent(), 99.2);
        assert_eq!(m.last_update_tick(), 0);
    }

    #[test]
    fn test_due_every_tenth_tick() {
        let m = MetricsAggregator::new(&MetricsConfig::default()).expect("metrics");
        assert!(!m.is_due(1));
        assert!(!m.is_due(9));
        assert!(m.is_due(10));
        assert!(m.is_due(20));
    }

    #[test]
    fn test_bounds_hold_under_heavy_drift() {
        let mut m = MetricsAggregator::new(&MetricsConfig {
            nrw_std_dev: 25.0,
            ..MetricsConfig::default()
        })
        .expect("metrics");
        let mut rng = StdRng::seed_from_u64(17);
        let mut last_energy = m.energy_kwh();
        for i in 1..=500u64 {
            m.update(i * 10, (i % 6) as usize, &mut rng);
            assert!((10.0..=35.0).contains(&m.nrw_percent()));
            assert!((90.0..=100.0).contains(&m.uptime_percent()));
            let step = m.energy_kwh() - last_energy;
            assert!((0.05 - 1e-9..0.12 + 1e-9).contains(&step));
            last_energy = m.energy_kwh();
        }
        assert_eq!(m.last_update_tick(), 5000);
    }
}
