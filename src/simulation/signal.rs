//! Synthetic pressure/flow generator and zone status derivation.
//!
//! ```text
//! demand(t) = 0.3·sin(t/20) + 0.1·sin(t/7)
//! pressure  = max(0.3, base + demand(t) + noise + anomaly_offset)
//! flow      = max(0.5, pressure / base · U(10, 15))
//! ```
//!
//! Samples are rounded (pressure 3 dp, flow 2 dp) before they reach the
//! history store.

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::config::{defaults, ConfigError, SignalConfig, ZoneConfig};
use crate::types::{AnomalyKind, DetectionLevel, ZoneStatus};

/// Daily-demand style oscillation at tick `t`.
pub fn demand_wave(tick: u64) -> f64 {
    let t = tick as f64;
    0.3 * (t / 20.0).sin() + 0.1 * (t / 7.0).sin()
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// One committed pressure/flow pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSample {
    pub pressure_bar: f64,
    pub flow_lps: f64,
}

#[derive(Debug, Clone)]
pub struct ZoneSignalGenerator {
    noise: Normal<f64>,
    flow_gain: Uniform<f64>,
    high_margin: f64,
}

impl ZoneSignalGenerator {
    pub fn new(config: &SignalConfig) -> Result<Self, ConfigError> {
        let noise = Normal::new(0.0, config.noise_std_dev).map_err(|e| {
            ConfigError::Validation(vec![format!("signal.noise_std_dev: {e}")])
        })?;
        if !(config.flow_gain_min < config.flow_gain_max) {
            return Err(ConfigError::Validation(vec![format!(
                "signal.flow_gain: min ({}) must be < max ({})",
                config.flow_gain_min, config.flow_gain_max
            )]));
        }
        Ok(Self {
            noise,
            flow_gain: Uniform::new(config.flow_gain_min, config.flow_gain_max),
            high_margin: config.high_pressure_margin,
        })
    }

    /// Gaussian pressure noise for one zone sample.
    pub fn draw_noise<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.noise.sample(rng)
    }

    /// Build the sample for a zone, drawing the flow gain from `rng`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        base_pressure: f64,
        tick: u64,
        noise: f64,
        anomaly_offset: f64,
        rng: &mut R,
    ) -> SignalSample {
        let pressure = (base_pressure + demand_wave(tick) + noise + anomaly_offset)
            .max(defaults::PRESSURE_FLOOR_BAR);
        let flow = (pressure / base_pressure * self.flow_gain.sample(rng)).max(defaults::FLOW_FLOOR_LPS);

        SignalSample {
            pressure_bar: round_to(pressure, defaults::PRESSURE_DECIMALS),
            flow_lps: round_to(flow, defaults::FLOW_DECIMALS),
        }
    }

    /// Pure status derivation. An active anomaly always wins over thresholds.
    pub fn status(&self, zone: &ZoneConfig, pressure: f64, anomaly: Option<AnomalyKind>) -> ZoneStatus {
        zone_status(zone, pressure, anomaly, self.high_margin)
    }
}

/// Status of a zone from its current pressure and anomaly.
pub fn zone_status(
    zone: &ZoneConfig,
    pressure: f64,
    anomaly: Option<AnomalyKind>,
    high_margin: f64,
) -> ZoneStatus {
    if let Some(kind) = anomaly {
        return kind.status();
    }
    if pressure < zone.min_ok_pressure_bar {
        ZoneStatus::Low
    } else if pressure > zone.base_pressure_bar + high_margin {
        ZoneStatus::High
    } else {
        ZoneStatus::Ok
    }
}

/// Pressure deviation score: `min(1, 3·|p - base| / base)`.
pub fn anomaly_score(zone: &ZoneConfig, pressure: f64) -> f64 {
    let deviation = (pressure - zone.base_pressure_bar).abs() / zone.base_pressure_bar;
    (deviation * defaults::ANOMALY_SCORE_GAIN).min(1.0)
}

/// Detector verdict for a score. An active anomaly takes precedence.
pub fn detection_level(score: f64, anomaly: Option<AnomalyKind>) -> DetectionLevel {
    match anomaly {
        Some(kind) => DetectionLevel::Anomaly(kind),
        None if score > defaults::ELEVATED_SCORE_THRESHOLD => DetectionLevel::Elevated,
        None => DetectionLevel::Normal,
    }
}
