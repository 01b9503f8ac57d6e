//! Command-line front end for the marriage penalty calculator
//!
//! Wires the core comparison engine to a subprocess calculation engine, a
//! YAML configuration file and plain-text reports.

pub mod command_engine;
pub mod config;
pub mod logging;
pub mod report;

pub use command_engine::{CommandEngine, CommandSimulation};
pub use config::{AppConfig, ConfigError, EngineConfig, SweepConfig, default_data_dir};
pub use logging::init_logging;
