//! Shared data structures for water distribution telemetry
//!
//! - Zone identity, anomaly kinds, statuses and live readings
//! - Alert events, fleet metrics and the published snapshot

mod zone;
mod telemetry;

pub use zone::*;
pub use telemetry::*;
