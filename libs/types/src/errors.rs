//! Error taxonomy
//!
//! Runtime conditions during a simulation (crossed quotes, exhausted books,
//! cancel misses) are recoverable and surface as counters in the diagnostics
//! stream; the typed errors here cover the two places where a caller must
//! branch: raw book inserts and configuration validation. Only configuration
//! errors are fatal, and only before the first event.

use crate::ids::OrderId;
use crate::numeric::Price;
use crate::order::Side;
use thiserror::Error;

/// Order-book errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookError {
    /// A raw passive insert would cross the opposing book. Marketable
    /// orders must be routed through the matching engine instead.
    #[error("resting {side:?} at {price} would cross the opposing book")]
    CrossedRest { side: Side, price: Price },

    /// Cancel of an id that is not resting. Callers treat this as a no-op.
    #[error("order {0} not found")]
    NotFound(OrderId),
}

/// Configuration errors, surfaced before the first event
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("flow probabilities sum to {sum}, expected 1.0")]
    FlowProbs { sum: f64 },

    #[error("{field} must be a probability in [0, 1], got {value}")]
    ProbabilityRange { field: &'static str, value: f64 },

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("{field} range is empty: min {min} > max {max}")]
    EmptyRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("mm_refresh_k must be at least 1")]
    RefreshCadence,
}
