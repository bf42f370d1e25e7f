//! Network Configuration - zone table and simulation tunables as TOML values
//!
//! Each struct implements `Default` with the values of the reference
//! deployment, so running without a config file reproduces it exactly.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use super::validation::ValidationWarning;
use crate::types::PumpStatus;

/// Environment variable holding an explicit config path.
pub const CONFIG_ENV_VAR: &str = "HYDRONAUTS_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "hydronauts.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a distribution network deployment.
///
/// Load with `NetworkConfig::load()` which searches:
/// 1. `$HYDRONAUTS_CONFIG` env var
/// 2. `./hydronauts.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Tick cadence and random source
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Synthetic signal shaping
    #[serde(default)]
    pub signal: SignalConfig,

    /// Anomaly injection and resolution
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Fleet KPI drift
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Exactly four zones
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            signal: SignalConfig::default(),
            anomaly: AnomalyConfig::default(),
            metrics: MetricsConfig::default(),
            zones: default_zones(),
        }
    }
}

impl NetworkConfig {
    /// Load configuration using the standard search order:
    /// 1. `$HYDRONAUTS_CONFIG` environment variable
    /// 2. `./hydronauts.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded network config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded network config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!(path = %path.display(), "{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML string (no file involved).
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the config to disk, e.g. to bootstrap an editable file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Network config saved");
        Ok(())
    }

    /// Validate every section and collect all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.scheduler.tick_interval_ms == 0 {
            errors.push("scheduler.tick_interval_ms must be > 0".to_string());
        }
        if self.scheduler.command_buffer == 0 {
            errors.push("scheduler.command_buffer must be > 0".to_string());
        }

        let s = &self.signal;
        if !s.noise_std_dev.is_finite() || s.noise_std_dev < 0.0 {
            errors.push(format!(
                "signal.noise_std_dev must be finite and >= 0 (got {})",
                s.noise_std_dev
            ));
        }
        Self::check_range(s.flow_gain_min, s.flow_gain_max, "signal.flow_gain", &mut errors);
        if s.flow_gain_min <= 0.0 {
            errors.push("signal.flow_gain_min must be > 0".to_string());
        }
        if !s.high_pressure_margin.is_finite() || s.high_pressure_margin < 0.0 {
            errors.push(format!(
                "signal.high_pressure_margin must be finite and >= 0 (got {})",
                s.high_pressure_margin
            ));
        }

        let a = &self.anomaly;
        Self::check_probability(a.inject_probability, "anomaly.inject_probability", &mut errors);
        Self::check_probability(a.resolve_probability, "anomaly.resolve_probability", &mut errors);
        for (name, offset) in [
            ("anomaly.leak_offset", a.leak_offset),
            ("anomaly.burst_offset", a.burst_offset),
            ("anomaly.low_pressure_offset", a.low_pressure_offset),
        ] {
            if !offset.is_finite() || offset > 0.0 {
                errors.push(format!("{name} must be a finite penalty <= 0 (got {offset})"));
            }
        }

        let m = &self.metrics;
        if m.update_every_ticks == 0 {
            errors.push("metrics.update_every_ticks must be > 0".to_string());
        }
        if !(defaults::NRW_MIN_PERCENT..=defaults::NRW_MAX_PERCENT).contains(&m.initial_nrw_percent) {
            errors.push(format!(
                "metrics.initial_nrw_percent ({:.1}) must lie in [{}, {}]",
                m.initial_nrw_percent,
                defaults::NRW_MIN_PERCENT,
                defaults::NRW_MAX_PERCENT
            ));
        }
        if !(defaults::UPTIME_MIN_PERCENT..=defaults::UPTIME_MAX_PERCENT)
            .contains(&m.initial_uptime_percent)
        {
            errors.push(format!(
                "metrics.initial_uptime_percent ({:.1}) must lie in [{}, {}]",
                m.initial_uptime_percent,
                defaults::UPTIME_MIN_PERCENT,
                defaults::UPTIME_MAX_PERCENT
            ));
        }
        if !m.nrw_std_dev.is_finite() || m.nrw_std_dev < 0.0 {
            errors.push("metrics.nrw_std_dev must be finite and >= 0".to_string());
        }
        Self::check_range(m.energy_step_min, m.energy_step_max, "metrics.energy_step", &mut errors);
        if m.energy_step_min < 0.0 {
            errors.push("metrics.energy_step_min must be >= 0".to_string());
        }
        if !m.uptime_penalty_per_anomaly.is_finite() || m.uptime_penalty_per_anomaly < 0.0 {
            errors.push("metrics.uptime_penalty_per_anomaly must be finite and >= 0".to_string());
        }

        if self.zones.len() != defaults::ZONE_COUNT {
            errors.push(format!(
                "exactly {} [[zones]] entries required, got {}",
                defaults::ZONE_COUNT,
                self.zones.len()
            ));
        }
        let mut codes = HashSet::new();
        for (i, z) in self.zones.iter().enumerate() {
            if z.code.trim().is_empty() {
                errors.push(format!("zones[{i}].code must not be empty"));
            } else if !codes.insert(z.code.to_ascii_uppercase()) {
                errors.push(format!("zones[{i}].code '{}' is duplicated", z.code));
            }
            if !z.base_pressure_bar.is_finite() || z.base_pressure_bar <= 0.0 {
                errors.push(format!(
                    "zones[{i}].base_pressure_bar must be > 0 (got {})",
                    z.base_pressure_bar
                ));
            }
            if !z.min_ok_pressure_bar.is_finite() || z.min_ok_pressure_bar >= z.base_pressure_bar {
                errors.push(format!(
                    "zones[{i}].min_ok_pressure_bar ({}) must be below base_pressure_bar ({})",
                    z.min_ok_pressure_bar, z.base_pressure_bar
                ));
            }
        }

        let (range_errors, _) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Legal but physically suspicious values. Not reported by `validate()`.
    pub fn range_warnings(&self) -> Vec<ValidationWarning> {
        super::validation::validate_physical_ranges(self).1
    }

    /// Tick cadence as a `Duration`.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.scheduler.tick_interval_ms)
    }

    fn check_probability(p: f64, name: &str, errors: &mut Vec<String>) {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            errors.push(format!("{name} must lie in [0, 1] (got {p})"));
        }
    }

    fn check_range(min: f64, max: f64, name: &str, errors: &mut Vec<String>) {
        if !min.is_finite() || !max.is_finite() {
            errors.push(format!("{name}: values must be finite (got min={min}, max={max})"));
            return;
        }
        if min >= max {
            errors.push(format!("{name}: min ({min:.3}) must be < max ({max:.3})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// Scheduler cadence and random source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fixed tick cadence in milliseconds
    pub tick_interval_ms: u64,
    /// RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Depth of the command queue
    pub command_buffer: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: defaults::TICK_INTERVAL_MS,
            seed: None,
            command_buffer: defaults::COMMAND_BUFFER,
        }
    }
}

/// Synthetic pressure/flow shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Gaussian pressure noise (bar)
    pub noise_std_dev: f64,
    /// Lower bound of the uniform flow gain
    pub flow_gain_min: f64,
    /// Upper bound of the uniform flow gain
    pub flow_gain_max: f64,
    /// Margin above base pressure that reports HIGH
    pub high_pressure_margin: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            noise_std_dev: defaults::NOISE_STD_DEV,
            flow_gain_min: defaults::FLOW_GAIN_MIN,
            flow_gain_max: defaults::FLOW_GAIN_MAX,
            high_pressure_margin: defaults::HIGH_PRESSURE_MARGIN,
        }
    }
}

/// Anomaly lifecycle probabilities and pressure penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Per-tick chance that an idle zone develops an anomaly
    pub inject_probability: f64,
    /// Per-tick chance that an active anomaly clears on its own
    pub resolve_probability: f64,
    pub leak_offset: f64,
    pub burst_offset: f64,
    pub low_pressure_offset: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            inject_probability: defaults::INJECT_PROBABILITY,
            resolve_probability: defaults::RESOLVE_PROBABILITY,
            leak_offset: defaults::LEAK_OFFSET_BAR,
            burst_offset: defaults::BURST_OFFSET_BAR,
            low_pressure_offset: defaults::LOW_PRESSURE_OFFSET_BAR,
        }
    }
}

impl AnomalyConfig {
    /// Disable random injection and auto-resolution (scripted scenarios).
    pub fn frozen() -> Self {
        Self {
            inject_probability: 0.0,
            resolve_probability: 0.0,
            ..Self::default()
        }
    }
}

/// Fleet KPI drift parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Recompute KPIs on ticks divisible by this value
    pub update_every_ticks: u64,
    pub initial_nrw_percent: f64,
    pub nrw_std_dev: f64,
    pub energy_step_min: f64,
    pub energy_step_max: f64,
    pub initial_uptime_percent: f64,
    pub uptime_penalty_per_anomaly: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            update_every_ticks: defaults::METRICS_EVERY_TICKS,
            initial_nrw_percent: defaults::INITIAL_NRW_PERCENT,
            nrw_std_dev: defaults::NRW_STD_DEV,
            energy_step_min: defaults::ENERGY_STEP_MIN_KWH,
            energy_step_max: defaults::ENERGY_STEP_MAX_KWH,
            initial_uptime_percent: defaults::INITIAL_UPTIME_PERCENT,
            uptime_penalty_per_anomaly: defaults::UPTIME_PENALTY_PER_ANOMALY,
        }
    }
}

/// Static description of one distribution zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Short code used by operators ("A".."D")
    pub code: String,
    /// Display name
    pub name: String,
    /// Nominal supply pressure (bar)
    pub base_pressure_bar: f64,
    /// Below this the zone reports LOW
    pub min_ok_pressure_bar: f64,
    /// Valve position at startup
    #[serde(default = "default_valve_open")]
    pub valve_open: bool,
    /// Booster pump state (reported only)
    #[serde(default)]
    pub pump: PumpStatus,
}

impl ZoneConfig {
    pub fn new(code: &str, name: &str, base_pressure_bar: f64, min_ok_pressure_bar: f64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            base_pressure_bar,
            min_ok_pressure_bar,
            valve_open: true,
            pump: PumpStatus::Running,
        }
    }
}

const fn default_valve_open() -> bool {
    true
}

fn default_zones() -> Vec<ZoneConfig> {
    let mut elevated = ZoneConfig::new("C", "Zone C (Elevated)", 2.4, 2.0);
    elevated.valve_open = false;
    elevated.pump = PumpStatus::Standby;

    vec![
        ZoneConfig::new("A", "Zone A (Central)", 3.8, 2.5),
        ZoneConfig::new("B", "Zone B (North)", 3.2, 2.5),
        elevated,
        ZoneConfig::new("D", "Zone D (Tail-End)", 1.8, 1.5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NetworkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.zones.len(), 4);
        assert_eq!(config.zones[0].base_pressure_bar, 3.8);
        assert_eq!(config.zones[3].min_ok_pressure_bar, 1.5);
        assert!(!config.zones[2].valve_open);
        assert_eq!(config.zones[2].pump, PumpStatus::Standby);
    }

    #[test]
    fn test_toml_round_trip_keeps_zones() {
        let config = NetworkConfig::default();
        let text = config.to_toml().expect("serialize");
        let parsed = NetworkConfig::from_toml_str(&text).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed = NetworkConfig::from_toml_str(
            r#"
[scheduler]
seed = 42

[anomaly]
inject_probability = 0.01
"#,
        )
        .expect("parse");
        assert_eq!(parsed.scheduler.seed, Some(42));
        assert_eq!(parsed.scheduler.tick_interval_ms, 500);
        assert_eq!(parsed.anomaly.inject_probability, 0.01);
        assert_eq!(parsed.anomaly.resolve_probability, 0.035);
        assert_eq!(parsed.zones.len(), 4);
    }

    #[test]
    fn test_validation_collects_every_error() {
        let mut config = NetworkConfig::default();
        config.anomaly.inject_probability = 1.5;
        config.signal.flow_gain_min = 20.0;
        config.zones[1].min_ok_pressure_bar = 4.0;
        config.zones.pop();

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("inject_probability")));
                assert!(errors.iter().any(|e| e.contains("flow_gain")));
                assert!(errors.iter().any(|e| e.contains("zones[1].min_ok_pressure_bar")));
                assert!(errors.iter().any(|e| e.contains("[[zones]]")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_zone_codes_rejected() {
        let mut config = NetworkConfig::default();
        config.zones[3].code = "a".to_string();
        let err = config.validate().expect_err("duplicate code");
        assert!(err.to_string().contains("duplicated"));
    }

    #[test]
    fn test_frozen_anomaly_config() {
        let frozen = AnomalyConfig::frozen();
        assert_eq!(frozen.inject_probability, 0.0);
        assert_eq!(frozen.resolve_probability, 0.0);
        assert_eq!(frozen.burst_offset, -0.9);
    }
}
