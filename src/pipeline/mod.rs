//! Scheduling Pipeline
//!
//! ```text
//! interval tick ─┐
//!                ├─► SimulationScheduler (owns Simulation) ─► ArcSwap<Snapshot>
//! mpsc command ──┘                                         └─► watch<tick>
//! ```
//!
//! Readers only ever see whole snapshots: every publication happens after a
//! tick or command has fully committed.

mod scheduler;

pub use scheduler::{SimulationCommand, SimulationHandle, SimulationScheduler};
