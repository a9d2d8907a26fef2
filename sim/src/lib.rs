//! Discrete-event market-microstructure simulation
//!
//! Drives a price-time-priority order book with seeded stochastic flow and a
//! quoting market maker, producing per-event state traces and
//! adverse-selection diagnostics. Given `(seed, config)` the full record and
//! trade streams are reproducible bit-for-bit.
//!
//! # Modules
//! - `config` — Simulation configuration and validation
//! - `flow` — Exogenous order-flow generator with an informed cohort
//! - `maker` — Inventory-skewed quoting market maker
//! - `scheduler` — The deterministic event loop
//! - `metrics` — Per-event records, trade log, markouts, summary
//! - `replay` — Event-log round-trip and replay validation
//! - `export` — JSON export of a finished run

pub mod config;
pub mod export;
pub mod flow;
pub mod maker;
pub mod metrics;
pub mod replay;
pub mod scheduler;

pub use config::SimConfig;
pub use scheduler::{SimOutput, Simulator};

/// Crate version constant
pub const VERSION: &str = "1.0.0";
