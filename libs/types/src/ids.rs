//! Identifier types for simulator entities
//!
//! Order ids are allocated from a monotonic counter rather than any
//! wall-clock source, so two runs with the same seed assign identical ids
//! to identical orders. Ids are unique across the whole simulation and
//! shared by every participant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create from a raw counter value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw counter value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORD-{}", self.0)
    }
}

/// Monotonic order-id allocator
///
/// A single allocator is threaded through the simulation so ids stay unique
/// across all participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIdGen {
    next: u64,
}

impl OrderIdGen {
    /// Create a new allocator starting at the given counter value
    pub fn new(start: u64) -> Self {
        Self { next: start }
    }

    /// Allocate the next id (monotonically increasing)
    pub fn next_id(&mut self) -> OrderId {
        let id = OrderId(self.next);
        self.next += 1;
        id
    }
}

impl Default for OrderIdGen {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Who submitted an order
///
/// The owner tag drives fill attribution (maker PnL), cancel targeting
/// (exogenous cancels only remove `Flow` orders), and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Owner {
    /// Quoting market maker
    MarketMaker,
    /// Uninformed exogenous flow
    Flow,
    /// Informed exogenous flow (side tied to the latent signal)
    Informed,
    /// Synthetic aggressor realizing a fundamental move into the mid
    Impact,
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Owner::MarketMaker => "MARKET_MAKER",
            Owner::Flow => "FLOW",
            Owner::Informed => "INFORMED",
            Owner::Impact => "IMPACT",
        };
        write!(f, "{s}")
    }
}
