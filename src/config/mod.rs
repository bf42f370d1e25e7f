//! Network Configuration Module
//!
//! Zone table and simulation tunables loaded from TOML, with defaults that
//! reproduce the four-zone reference network.
//!
//! ## Loading Order
//!
//! 1. `HYDRONAUTS_CONFIG` environment variable (path to TOML file)
//! 2. `hydronauts.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is passed explicitly to the simulation context; there is no
//! global instance.
//!
//! ```ignore
//! let config = NetworkConfig::load();
//! let simulation = Simulation::from_config(&config)?;
//! ```

mod network_config;
pub mod defaults;
pub mod validation;

pub use network_config::*;
