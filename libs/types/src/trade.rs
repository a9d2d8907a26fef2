//! Trade records emitted by the matching engine
//!
//! One trade is emitted per maker consumed; a single aggressor walking
//! several levels produces several trades, in the order the makers were
//! consumed.

use crate::ids::{OrderId, Owner};
use crate::numeric::{notional, Price, Qty};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// An executed fill between one maker and one taker
///
/// `price` is always the resting (maker) order's price. `taker_side` is the
/// aggressor's side; the maker sat on the opposite side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Global monotonic trade sequence
    pub sequence: u64,
    pub taker_side: Side,
    pub price: Price,
    pub qty: Qty,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_owner: Owner,
    pub taker_owner: Owner,
    /// Event-time at which the aggressor arrived
    pub timestamp: u64,
}

impl Trade {
    /// The side the maker was resting on
    pub fn maker_side(&self) -> Side {
        self.taker_side.opposite()
    }

    /// Whether the market maker sat on either side of this trade
    pub fn mm_involved(&self) -> bool {
        self.maker_owner == Owner::MarketMaker || self.taker_owner == Owner::MarketMaker
    }

    /// Trade notional in tick·lot units
    pub fn value(&self) -> i64 {
        notional(self.price, self.qty)
    }
}
