//! Resting-order types

use crate::ids::{OrderId, Owner};
use crate::numeric::{Price, Qty};
use serde::{Deserialize, Serialize};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy side
    Bid,
    /// Sell side
    Ask,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Sign convention: bids are +1, asks are -1
    pub fn sign(&self) -> i64 {
        match self {
            Side::Bid => 1,
            Side::Ask => -1,
        }
    }
}

/// A limit order resting in the book
///
/// `arrival_seq` is assigned by the book at acceptance and is the sole
/// tiebreaker within a price level: lower sequence fills first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: Owner,
    pub side: Side,
    pub price: Price,
    pub remaining: Qty,
    pub arrival_seq: u64,
}

impl Order {
    /// Whether the order still has resting quantity
    pub fn is_live(&self) -> bool {
        !self.remaining.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Bid.sign(), 1);
        assert_eq!(Side::Ask.sign(), -1);
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Bid).unwrap(), "\"BID\"");
        assert_eq!(serde_json::to_string(&Side::Ask).unwrap(), "\"ASK\"");
    }
}
