//! Ask (sell-side) book
//!
//! Mirror of the bid book with the opposite price ordering: best ask is the
//! lowest price, which is the first key of the map.

use std::collections::BTreeMap;
use types::numeric::{Price, Qty};
use types::order::Order;

use super::price_level::PriceLevel;

/// Sell side of the book, best ask = lowest price
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    /// Create a new empty ask book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert a resting order at the tail of its level
    pub fn insert(&mut self, order: Order) {
        self.levels.entry(order.price).or_default().push(order);
    }

    /// Best ask price and aggregate depth at that level
    pub fn best(&self) -> Option<(Price, Qty)> {
        self.levels
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_qty()))
    }

    /// Best ask price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Access to one level
    pub(crate) fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Mutable access to one level
    pub(crate) fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Drop a level that the current event emptied
    pub(crate) fn remove_level(&mut self, price: Price) {
        debug_assert!(
            self.levels.get(&price).map(|l| l.is_empty()).unwrap_or(true),
            "removing a non-empty level"
        );
        self.levels.remove(&price);
    }

    /// Aggregate resting quantity at one price
    pub fn depth(&self, price: Price) -> Qty {
        self.levels
            .get(&price)
            .map(|l| l.total_qty())
            .unwrap_or_else(Qty::zero)
    }

    /// Depth resting strictly below `limit` (the quantity an aggressor must
    /// sweep before the best ask rises to `limit` or above)
    pub fn depth_within(&self, limit: Price) -> Qty {
        self.levels
            .range(..limit)
            .fold(Qty::zero(), |acc, (_, level)| acc + level.total_qty())
    }

    /// Check if the ask book is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Total resting quantity across all levels
    pub fn total_depth(&self) -> Qty {
        self.levels
            .values()
            .fold(Qty::zero(), |acc, l| acc + l.total_qty())
    }

    /// Iterate levels best-first (lowest price first)
    pub fn iter(&self) -> impl Iterator<Item = (Price, &PriceLevel)> {
        self.levels.iter().map(|(p, l)| (*p, l))
    }
}
