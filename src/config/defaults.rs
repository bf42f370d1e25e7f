//! System-wide default constants.
//!
//! Centralises the fixed numbers of the telemetry core. Values in the
//! "Invariants" group are observable clamp bounds and capacities; they are
//! deliberately not exposed through `hydronauts.toml`.

// ============================================================================
// Invariants (not configurable)
// ============================================================================

/// Number of distribution zones monitored by the core.
pub const ZONE_COUNT: usize = 4;

/// Samples retained per zone per signal.
///
/// 120 ticks at 500 ms = 1 minute of chart history.
pub const HISTORY_CAPACITY: usize = 120;

/// Maximum alert events retained in the log (newest first).
pub const ALERT_LOG_CAPACITY: usize = 50;

/// Hard pressure floor in bar.
pub const PRESSURE_FLOOR_BAR: f64 = 0.3;

/// Hard flow floor in L/s.
pub const FLOW_FLOOR_LPS: f64 = 0.5;

/// Non-revenue water clamp range (percent).
pub const NRW_MIN_PERCENT: f64 = 10.0;
pub const NRW_MAX_PERCENT: f64 = 35.0;

/// Uptime clamp range (percent).
pub const UPTIME_MIN_PERCENT: f64 = 90.0;
pub const UPTIME_MAX_PERCENT: f64 = 100.0;

/// Decimal places kept for stored pressure samples.
pub const PRESSURE_DECIMALS: i32 = 3;

/// Decimal places kept for stored flow samples.
pub const FLOW_DECIMALS: i32 = 2;

/// Range of the one-off flow value used to pre-seed each zone's flow history.
pub const FLOW_SEED_MIN_LPS: f64 = 8.0;
pub const FLOW_SEED_MAX_LPS: f64 = 14.0;

/// Deviation score gain: `score = min(1, gain * |p - base| / base)`.
pub const ANOMALY_SCORE_GAIN: f64 = 3.0;

/// Scores strictly above this read as `Elevated` when no anomaly is active.
pub const ELEVATED_SCORE_THRESHOLD: f64 = 0.5;

// ============================================================================
// Scheduler
// ============================================================================

/// Target tick cadence (ms).
pub const TICK_INTERVAL_MS: u64 = 500;

/// Bounded command queue depth for the scheduler actor.
pub const COMMAND_BUFFER: usize = 64;

/// Status line cadence of the headless runner (ticks).
pub const STATUS_LOG_EVERY_TICKS: u64 = 10;

// ============================================================================
// Signal Generator
// ============================================================================

pub const NOISE_STD_DEV: f64 = 0.05;
pub const FLOW_GAIN_MIN: f64 = 10.0;
pub const FLOW_GAIN_MAX: f64 = 15.0;

/// Pressure above `base + margin` reports `HIGH`.
pub const HIGH_PRESSURE_MARGIN: f64 = 0.8;

// ============================================================================
// Anomalies
// ============================================================================

pub const INJECT_PROBABILITY: f64 = 0.003;

/// Expected holding time ~ 1 / 0.035 = 28.6 ticks.
pub const RESOLVE_PROBABILITY: f64 = 0.035;

pub const LEAK_OFFSET_BAR: f64 = -0.4;
pub const BURST_OFFSET_BAR: f64 = -0.9;
pub const LOW_PRESSURE_OFFSET_BAR: f64 = -0.6;

// ============================================================================
// Fleet Metrics
// ============================================================================

pub const METRICS_EVERY_TICKS: u64 = 10;
pub const INITIAL_NRW_PERCENT: f64 = 18.4;
pub const NRW_STD_DEV: f64 = 0.3;
pub const ENERGY_STEP_MIN_KWH: f64 = 0.05;
pub const ENERGY_STEP_MAX_KWH: f64 = 0.12;
pub const INITIAL_UPTIME_PERCENT: f64 = 99.2;
pub const UPTIME_PENALTY_PER_ANOMALY: f64 = 2.5;
