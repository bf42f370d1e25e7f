//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree (including each `[[zones]]` table), compare against
//! known field names and emit warnings with "did you mean?" suggestions.
//! Then proceed with normal serde deserialization. Warnings never break
//! existing configs.

use std::collections::HashSet;

use super::defaults;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for NetworkConfig.
///
/// Maintained by hand to match the struct hierarchy in network_config.rs.
/// Entries of the `[[zones]]` array share the `zones.` prefix.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [scheduler]
        "scheduler",
        "scheduler.tick_interval_ms",
        "scheduler.seed",
        "scheduler.command_buffer",
        // [signal]
        "signal",
        "signal.noise_std_dev",
        "signal.flow_gain_min",
        "signal.flow_gain_max",
        "signal.high_pressure_margin",
        // [anomaly]
        "anomaly",
        "anomaly.inject_probability",
        "anomaly.resolve_probability",
        "anomaly.leak_offset",
        "anomaly.burst_offset",
        "anomaly.low_pressure_offset",
        // [metrics]
        "metrics",
        "metrics.update_every_ticks",
        "metrics.initial_nrw_percent",
        "metrics.nrw_std_dev",
        "metrics.energy_step_min",
        "metrics.energy_step_max",
        "metrics.initial_uptime_percent",
        "metrics.uptime_penalty_per_anomaly",
        // [[zones]]
        "zones",
        "zones.code",
        "zones.name",
        "zones.base_pressure_bar",
        "zones.min_ok_pressure_bar",
        "zones.valve_open",
        "zones.pump",
    ];
    keys.iter().copied().collect()
}

/// Walk a TOML value and return every dotted key path it contains.
///
/// Tables inside arrays are walked with the array's own path as prefix, so
/// `[[zones]] code = "A"` yields `zones` and `zones.code`. Duplicates are
/// collapsed.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let toml::Value::Table(table) = value {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        keys.extend(walk_toml_keys(item, &path));
                    }
                }
                _ => {}
            }
        }
    }
    let mut seen = HashSet::new();
    keys.retain(|k| seen.insert(k.clone()));
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Municipal distribution networks rarely exceed this static head.
const MAX_PLAUSIBLE_BASE_PRESSURE_BAR: f64 = 16.0;

/// Validate physical ranges on a parsed NetworkConfig.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::NetworkConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (i, zone) in config.zones.iter().enumerate() {
        if zone.base_pressure_bar > MAX_PLAUSIBLE_BASE_PRESSURE_BAR {
            errors.push(format!(
                "zones[{i}].base_pressure_bar = {:.1} is outside physical range (0-{MAX_PLAUSIBLE_BASE_PRESSURE_BAR} bar)",
                zone.base_pressure_bar
            ));
        }
        if zone.min_ok_pressure_bar < defaults::PRESSURE_FLOOR_BAR {
            warnings.push(ValidationWarning {
                field: format!("zones[{i}].min_ok_pressure_bar"),
                message: format!(
                    "zones[{i}].min_ok_pressure_bar = {:.2} is below the {:.1} bar pressure floor; zone {} can never report LOW by threshold",
                    zone.min_ok_pressure_bar,
                    defaults::PRESSURE_FLOOR_BAR,
                    zone.code
                ),
                suggestion: None,
            });
        }
    }

    if config.anomaly.inject_probability > 0.1 {
        warnings.push(ValidationWarning {
            field: "anomaly.inject_probability".to_string(),
            message: format!(
                "anomaly.inject_probability = {:.3} will flood the alert log (default is {})",
                config.anomaly.inject_probability,
                defaults::INJECT_PROBABILITY
            ),
            suggestion: None,
        });
    }

    if config.signal.noise_std_dev > 0.5 {
        warnings.push(ValidationWarning {
            field: "signal.noise_std_dev".to_string(),
            message: format!(
                "signal.noise_std_dev = {:.2} bar swamps the demand wave amplitude",
                config.signal.noise_std_dev
            ),
            suggestion: None,
        });
    }

    if config.scheduler.tick_interval_ms > 0 && config.scheduler.tick_interval_ms < 50 {
        warnings.push(ValidationWarning {
            field: "scheduler.tick_interval_ms".to_string(),
            message: format!(
                "scheduler.tick_interval_ms = {} is faster than any consumer polls",
                config.scheduler.tick_interval_ms
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}
