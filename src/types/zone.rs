//! Zone identity and per-zone reading types: ZoneId, ZoneStatus, AnomalyKind, PumpStatus

use serde::{Deserialize, Serialize};

// ============================================================================
// Zone Identity
// ============================================================================

/// Stable integer identifier of a distribution zone (position in the zone table).
///
/// Display names are attributes of the zone config, never keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(usize);

impl ZoneId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<ZoneId> for usize {
    fn from(id: ZoneId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

// ============================================================================
// Anomalies
// ============================================================================

/// Zone-level fault condition with an additive pressure penalty.
///
/// Absence of an anomaly is `Option::None` at every use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Leak,
    Burst,
    LowPressure,
}

impl AnomalyKind {
    /// Injection picks uniformly from this list.
    pub const ALL: [Self; 3] = [Self::Leak, Self::Burst, Self::LowPressure];

    /// Get display name for UI
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Leak => "Leak",
            Self::Burst => "Burst",
            Self::LowPressure => "Low Pressure",
        }
    }

    /// Zone status reported while this anomaly is active
    pub const fn status(self) -> ZoneStatus {
        match self {
            Self::Leak => ZoneStatus::Leak,
            Self::Burst => ZoneStatus::Burst,
            Self::LowPressure => ZoneStatus::Low,
        }
    }

    /// Operator-facing alert text for an onset in `zone_name`.
    pub fn alert_message(self, zone_name: &str) -> String {
        match self {
            Self::Leak => format!("Possible leak detected in {zone_name}"),
            Self::Burst => format!("Pipe burst alert in {zone_name}!"),
            Self::LowPressure => format!("Low pressure threshold crossed in {zone_name}"),
        }
    }
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Reported health of a zone, derived from its current reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneStatus {
    Ok,
    Low,
    High,
    Leak,
    Burst,
}

impl std::fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneStatus::Ok => write!(f, "OK"),
            ZoneStatus::Low => write!(f, "LOW"),
            ZoneStatus::High => write!(f, "HIGH"),
            ZoneStatus::Leak => write!(f, "LEAK"),
            ZoneStatus::Burst => write!(f, "BURST"),
        }
    }
}

/// Verdict of the deviation-based detector for one zone.
///
/// An active anomaly always wins; otherwise the pressure deviation score
/// decides between `Normal` and `Elevated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionLevel {
    Normal,
    Elevated,
    Anomaly(AnomalyKind),
}

impl std::fmt::Display for DetectionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionLevel::Normal => write!(f, "Normal"),
            DetectionLevel::Elevated => write!(f, "Elevated"),
            DetectionLevel::Anomaly(kind) => write!(f, "{kind}"),
        }
    }
}

/// Booster pump state. Reported only; it does not feed the signal model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub enum PumpStatus {
    #[default]
    Running,
    Standby,
}

impl std::fmt::Display for PumpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PumpStatus::Running => write!(f, "Running"),
            PumpStatus::Standby => write!(f, "Standby"),
        }
    }
}

// ============================================================================
// Readings
// ============================================================================

/// Copy of one zone's live state as of the last committed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReading {
    pub id: ZoneId,
    pub code: String,
    pub name: String,
    /// Latest pressure sample (bar, 3 decimals)
    pub pressure_bar: f64,
    /// Latest flow sample (L/s, 2 decimals)
    pub flow_lps: f64,
    pub status: ZoneStatus,
    pub anomaly: Option<AnomalyKind>,
    /// Pressure deviation score in [0, 1]
    pub anomaly_score: f64,
    pub detection: DetectionLevel,
    pub valve_open: bool,
    pub pump: PumpStatus,
}
