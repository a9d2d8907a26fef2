//! Price-time-priority limit order book and matching engine
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced: best price first, FIFO within a
//!   level with arrival sequence as the sole tiebreaker
//! - The book is never crossed at rest
//! - Empty price levels are removed on the event that empties them
//! - Deterministic matching (same inputs → same outputs)
//! - Trades execute at the resting order's price

pub mod book;
pub mod engine;

pub use book::{OrderBook, TopOfBook};
pub use engine::{ApplyResult, Diagnostics, MatchEngine};
