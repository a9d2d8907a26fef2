//! Bid (buy-side) book
//!
//! Price levels sorted so the highest bid is best. `BTreeMap` keeps
//! iteration deterministic; empty levels are removed by the caller on the
//! same event that empties them.

use std::collections::BTreeMap;
use types::numeric::{Price, Qty};
use types::order::Order;

use super::price_level::PriceLevel;

/// Buy side of the book, best bid = highest price
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    /// Create a new empty bid book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert a resting order at the tail of its level
    pub fn insert(&mut self, order: Order) {
        self.levels.entry(order.price).or_default().push(order);
    }

    /// Best bid price and aggregate depth at that level
    pub fn best(&self) -> Option<(Price, Qty)> {
        // BTreeMap iterates ascending; the best bid is the last key
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_qty()))
    }

    /// Best bid price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
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

    /// Depth resting strictly above `limit` (the quantity an aggressor must
    /// sweep before the best bid falls to `limit` or below)
    pub fn depth_within(&self, limit: Price) -> Qty {
        self.levels
            .range(limit..)
            .filter(|(price, _)| **price > limit)
            .fold(Qty::zero(), |acc, (_, level)| acc + level.total_qty())
    }

    /// Check if the bid book is empty
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

    /// Iterate levels best-first (highest price first)
    pub fn iter(&self) -> impl Iterator<Item = (Price, &PriceLevel)> {
        self.levels.iter().rev().map(|(p, l)| (*p, l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{OrderId, Owner};
    use types::order::Side;

    fn order(id: u64, price: i64, qty: u64, seq: u64) -> Order {
        Order {
            id: OrderId::from_raw(id),
            owner: Owner::Flow,
            side: Side::Bid,
            price: Price::from_ticks(price),
            remaining: Qty::from_lots(qty),
            arrival_seq: seq,
        }
    }

    #[test]
    fn test_best_is_highest_price() {
        let mut book = BidBook::new();
        book.insert(order(1, 100, 1, 1));
        book.insert(order(2, 102, 2, 2));
        book.insert(order(3, 99, 3, 3));

        let (price, qty) = book.best().unwrap();
        assert_eq!(price, Price::from_ticks(102));
        assert_eq!(qty, Qty::from_lots(2));
    }

    #[test]
    fn test_same_price_aggregates() {
        let mut book = BidBook::new();
        book.insert(order(1, 100, 1, 1));
        book.insert(order(2, 100, 2, 2));

        assert_eq!(book.level_count(), 1);
        assert_eq!(book.depth(Price::from_ticks(100)), Qty::from_lots(3));
    }

    #[test]
    fn test_depth_within() {
        let mut book = BidBook::new();
        book.insert(order(1, 100, 5, 1));
        book.insert(order(2, 99, 7, 2));
        book.insert(order(3, 98, 9, 3));

        // Sweeping to a best bid of 99 consumes only the 100 level
        assert_eq!(book.depth_within(Price::from_ticks(99)), Qty::from_lots(5));
        assert_eq!(book.depth_within(Price::from_ticks(97)), Qty::from_lots(21));
    }

    #[test]
    fn test_iter_best_first() {
        let mut book = BidBook::new();
        book.insert(order(1, 100, 1, 1));
        book.insert(order(2, 102, 1, 2));

        let prices: Vec<i64> = book.iter().map(|(p, _)| p.ticks()).collect();
        assert_eq!(prices, vec![102, 100]);
    }
}
