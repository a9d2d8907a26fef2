//! Order book infrastructure
//!
//! `OrderBook` owns both sides plus an id index so cancels never scan the
//! book. All mutation goes through `insert`, `cancel`, and `consume`; each
//! keeps the id index, the cached level depths, and the sticky mid
//! consistent before returning.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::{LevelFill, PriceLevel};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::errors::BookError;
use types::ids::{OrderId, Owner};
use types::numeric::{Price, Qty};
use types::order::{Order, Side};

/// Where a resting order lives
#[derive(Debug, Clone, Copy)]
struct Locator {
    side: Side,
    price: Price,
    owner: Owner,
}

/// One fill produced by a walk, with the level price it executed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookFill {
    pub maker_id: OrderId,
    pub maker_owner: Owner,
    pub price: Price,
    pub qty: Qty,
}

/// Top-of-book snapshot
///
/// `mid_x2` is twice the mid in ticks, so a half-tick mid stays exact. When
/// one side is empty the mid is sticky: the last mid observed with both
/// sides present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid: Option<(Price, Qty)>,
    pub ask: Option<(Price, Qty)>,
    pub mid_x2: i64,
    pub spread: Option<i64>,
}

impl TopOfBook {
    /// Mid price in ticks (may be half-tick)
    pub fn mid(&self) -> f64 {
        self.mid_x2 as f64 / 2.0
    }

    /// Mid rounded to the nearest tick, used as the quoting reference
    pub fn mid_ticks(&self) -> i64 {
        // round-half-up on the doubled representation
        (self.mid_x2 + 1).div_euclid(2)
    }
}

/// FIFO limit order book with price-time priority
#[derive(Debug, Clone)]
pub struct OrderBook {
    bids: BidBook,
    asks: AskBook,
    index: BTreeMap<OrderId, Locator>,
    next_arrival: u64,
    last_mid_x2: i64,
}

impl OrderBook {
    /// Create an empty book with the given initial sticky mid
    pub fn new(initial_mid: Price) -> Self {
        Self {
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: BTreeMap::new(),
            next_arrival: 1,
            last_mid_x2: initial_mid.ticks() * 2,
        }
    }

    /// Rest a passive order at the tail of its (side, price) level
    ///
    /// Assigns the next arrival sequence and returns it. Fails with
    /// `CrossedRest` when the order would cross the opposing book; such
    /// orders must be routed through the matching engine.
    pub fn insert(
        &mut self,
        id: OrderId,
        owner: Owner,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> Result<u64, BookError> {
        let crosses = match side {
            Side::Bid => self.asks.best_price().map(|a| price >= a).unwrap_or(false),
            Side::Ask => self.bids.best_price().map(|b| price <= b).unwrap_or(false),
        };
        if crosses {
            return Err(BookError::CrossedRest { side, price });
        }

        let arrival_seq = self.next_arrival;
        self.next_arrival += 1;

        let order = Order {
            id,
            owner,
            side,
            price,
            remaining: qty,
            arrival_seq,
        };
        match side {
            Side::Bid => self.bids.insert(order),
            Side::Ask => self.asks.insert(order),
        }
        self.index.insert(id, Locator { side, price, owner });
        self.touch_mid();
        Ok(arrival_seq)
    }

    /// Cancel a resting order, returning its remaining quantity
    ///
    /// Cancelling an unknown id returns `NotFound` without side effect.
    /// Removing the last order at a level deletes the level.
    pub fn cancel(&mut self, id: OrderId) -> Result<Qty, BookError> {
        let locator = self.index.remove(&id).ok_or(BookError::NotFound(id))?;
        let removed = match locator.side {
            Side::Bid => self.bids.level_mut(locator.price).and_then(|l| l.remove(id)),
            Side::Ask => self.asks.level_mut(locator.price).and_then(|l| l.remove(id)),
        };
        // The index and the level queues move together; a dangling index
        // entry would be a bug, not a recoverable state.
        let order = removed.expect("id index pointed at a missing order");
        match locator.side {
            Side::Bid => {
                if self.bids.depth(locator.price).is_zero() {
                    self.bids.remove_level(locator.price);
                }
            }
            Side::Ask => {
                if self.asks.depth(locator.price).is_zero() {
                    self.asks.remove_level(locator.price);
                }
            }
        }
        self.touch_mid();
        Ok(order.remaining)
    }

    /// Walk the side opposing `taker_side`, consuming heads in price-time
    /// order until `qty` is exhausted, the price cap stops qualifying
    /// levels, or the book runs out
    ///
    /// Returns the fills in consumption order and the unfilled remainder.
    pub fn consume(
        &mut self,
        taker_side: Side,
        taker_id: OrderId,
        qty: Qty,
        price_cap: Option<Price>,
    ) -> (Vec<BookFill>, Qty) {
        let mut fills = Vec::new();
        let mut want = qty;

        while !want.is_zero() {
            let best = match taker_side {
                Side::Bid => self.asks.best_price(),
                Side::Ask => self.bids.best_price(),
            };
            let Some(level_price) = best else { break };
            if let Some(cap) = price_cap {
                let qualifies = match taker_side {
                    Side::Bid => level_price <= cap,
                    Side::Ask => level_price >= cap,
                };
                if !qualifies {
                    break;
                }
            }

            let level = match taker_side {
                Side::Bid => self.asks.level_mut(level_price),
                Side::Ask => self.bids.level_mut(level_price),
            };
            let Some(level) = level else { break };
            let (level_fills, rem) = level.fill_from_front(taker_id, want);
            let emptied = level.is_empty();
            want = rem;

            if level_fills.is_empty() {
                // Only the taker's own order rests here; nothing to match.
                break;
            }
            for f in &level_fills {
                if f.done {
                    self.index.remove(&f.maker_id);
                }
                fills.push(BookFill {
                    maker_id: f.maker_id,
                    maker_owner: f.maker_owner,
                    price: level_price,
                    qty: f.qty,
                });
            }
            if emptied {
                match taker_side {
                    Side::Bid => self.asks.remove_level(level_price),
                    Side::Ask => self.bids.remove_level(level_price),
                }
            }
        }

        self.touch_mid();
        (fills, want)
    }

    /// Best bid price and depth at that level
    pub fn best_bid(&self) -> Option<(Price, Qty)> {
        self.bids.best()
    }

    /// Best ask price and depth at that level
    pub fn best_ask(&self) -> Option<(Price, Qty)> {
        self.asks.best()
    }

    /// Aggregate resting quantity at one (side, price)
    pub fn depth(&self, side: Side, price: Price) -> Qty {
        match side {
            Side::Bid => self.bids.depth(price),
            Side::Ask => self.asks.depth(price),
        }
    }

    /// Depth an aggressor on `taker_side` must sweep before the opposing
    /// best moves to `limit` (used to size synthetic impact orders)
    pub fn depth_to_move(&self, taker_side: Side, limit: Price) -> Qty {
        match taker_side {
            Side::Bid => self.asks.depth_within(limit),
            Side::Ask => self.bids.depth_within(limit),
        }
    }

    /// Remaining quantity of a resting order
    pub fn order_qty(&self, id: OrderId) -> Option<Qty> {
        let locator = self.index.get(&id)?;
        match locator.side {
            Side::Bid => self.bids.level(locator.price),
            Side::Ask => self.asks.level(locator.price),
        }
        .and_then(|level| level.qty_of(id))
    }

    /// Whether an order is still resting
    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }

    /// Resting order ids for one owner, ascending (deterministic)
    pub fn open_orders(&self, owner: Owner) -> Vec<OrderId> {
        self.index
            .iter()
            .filter(|(_, loc)| loc.owner == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of resting orders
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Total resting quantity on one side
    pub fn side_depth(&self, side: Side) -> Qty {
        match side {
            Side::Bid => self.bids.total_depth(),
            Side::Ask => self.asks.total_depth(),
        }
    }

    /// Top-of-book snapshot with sticky mid
    pub fn snapshot(&self) -> TopOfBook {
        let bid = self.bids.best();
        let ask = self.asks.best();
        let spread = match (bid, ask) {
            (Some((b, _)), Some((a, _))) => Some(a.ticks() - b.ticks()),
            _ => None,
        };
        TopOfBook {
            bid,
            ask,
            mid_x2: self.last_mid_x2,
            spread,
        }
    }

    fn touch_mid(&mut self) {
        if let (Some(b), Some(a)) = (self.bids.best_price(), self.asks.best_price()) {
            self.last_mid_x2 = b.ticks() + a.ticks();
        }
    }

    /// Verify the structural invariants that must hold after every event
    ///
    /// Intended for tests: checks the book is uncrossed, the id index and
    /// the level queues agree, cached depths match entry sums, and arrival
    /// sequences increase within each level.
    pub fn check_invariants(&self) -> Result<(), String> {
        if let (Some(b), Some(a)) = (self.bids.best_price(), self.asks.best_price()) {
            if b >= a {
                return Err(format!("book crossed at rest: bid {b} >= ask {a}"));
            }
        }

        let mut seen = 0usize;
        for (side_name, entries) in [
            ("bid", self.bids.iter().collect::<Vec<_>>()),
            ("ask", self.asks.iter().collect::<Vec<_>>()),
        ] {
            for (price, level) in entries {
                if level.is_empty() {
                    return Err(format!("empty {side_name} level at {price}"));
                }
                let mut sum = Qty::zero();
                let mut last_seq = 0u64;
                for order in level.iter() {
                    sum += order.remaining;
                    if order.arrival_seq <= last_seq {
                        return Err(format!("arrival order violated at {side_name} {price}"));
                    }
                    last_seq = order.arrival_seq;
                    if !self.index.contains_key(&order.id) {
                        return Err(format!("order {} missing from index", order.id));
                    }
                    seen += 1;
                }
                if sum != level.total_qty() {
                    return Err(format!(
                        "depth cache mismatch at {side_name} {price}: {} != {}",
                        level.total_qty(),
                        sum
                    ));
                }
            }
        }
        if seen != self.index.len() {
            return Err(format!(
                "index size {} != resting orders {seen}",
                self.index.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OrderBook {
        OrderBook::new(Price::from_ticks(100))
    }

    fn id(raw: u64) -> OrderId {
        OrderId::from_raw(raw)
    }

    #[test]
    fn test_insert_and_top_of_book() {
        let mut b = book();
        b.insert(id(1), Owner::Flow, Side::Bid, Price::from_ticks(99), Qty::from_lots(10))
            .unwrap();
        b.insert(id(2), Owner::Flow, Side::Ask, Price::from_ticks(101), Qty::from_lots(4))
            .unwrap();

        let top = b.snapshot();
        assert_eq!(top.bid, Some((Price::from_ticks(99), Qty::from_lots(10))));
        assert_eq!(top.ask, Some((Price::from_ticks(101), Qty::from_lots(4))));
        assert_eq!(top.spread, Some(2));
        assert_eq!(top.mid(), 100.0);
        b.check_invariants().unwrap();
    }

    #[test]
    fn test_crossed_insert_rejected() {
        let mut b = book();
        b.insert(id(1), Owner::Flow, Side::Ask, Price::from_ticks(101), Qty::from_lots(4))
            .unwrap();

        let err = b
            .insert(id(2), Owner::Flow, Side::Bid, Price::from_ticks(101), Qty::from_lots(1))
            .unwrap_err();
        assert!(matches!(err, BookError::CrossedRest { .. }));
        // Book unchanged
        assert_eq!(b.order_count(), 1);
        b.check_invariants().unwrap();
    }

    #[test]
    fn test_cancel_idempotent() {
        let mut b = book();
        b.insert(id(1), Owner::Flow, Side::Bid, Price::from_ticks(99), Qty::from_lots(10))
            .unwrap();

        assert_eq!(b.cancel(id(1)), Ok(Qty::from_lots(10)));
        assert_eq!(b.cancel(id(1)), Err(BookError::NotFound(id(1))));
        assert!(b.best_bid().is_none());
        b.check_invariants().unwrap();
    }

    #[test]
    fn test_cancel_round_trip_restores_depth() {
        let mut b = book();
        b.insert(id(1), Owner::Flow, Side::Bid, Price::from_ticks(99), Qty::from_lots(5))
            .unwrap();
        let before = b.depth(Side::Bid, Price::from_ticks(99));

        b.insert(id(2), Owner::Flow, Side::Bid, Price::from_ticks(99), Qty::from_lots(7))
            .unwrap();
        b.cancel(id(2)).unwrap();

        assert_eq!(b.depth(Side::Bid, Price::from_ticks(99)), before);
        b.check_invariants().unwrap();
    }

    #[test]
    fn test_sticky_mid() {
        let mut b = book();
        assert_eq!(b.snapshot().mid(), 100.0);

        b.insert(id(1), Owner::Flow, Side::Bid, Price::from_ticks(98), Qty::from_lots(1))
            .unwrap();
        b.insert(id(2), Owner::Flow, Side::Ask, Price::from_ticks(104), Qty::from_lots(1))
            .unwrap();
        assert_eq!(b.snapshot().mid(), 101.0);

        // Emptying one side keeps the last known mid
        b.cancel(id(2)).unwrap();
        assert_eq!(b.snapshot().mid(), 101.0);
        assert!(b.snapshot().spread.is_none());
    }

    #[test]
    fn test_consume_walks_levels_in_price_order() {
        let mut b = book();
        b.insert(id(1), Owner::Flow, Side::Ask, Price::from_ticks(101), Qty::from_lots(2))
            .unwrap();
        b.insert(id(2), Owner::Flow, Side::Ask, Price::from_ticks(102), Qty::from_lots(2))
            .unwrap();

        let (fills, rem) = b.consume(Side::Bid, id(99), Qty::from_lots(3), None);
        assert!(rem.is_zero());
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].price, Price::from_ticks(101));
        assert_eq!(fills[0].qty, Qty::from_lots(2));
        assert_eq!(fills[1].price, Price::from_ticks(102));
        assert_eq!(fills[1].qty, Qty::from_lots(1));
        b.check_invariants().unwrap();
    }

    #[test]
    fn test_consume_respects_price_cap() {
        let mut b = book();
        b.insert(id(1), Owner::Flow, Side::Ask, Price::from_ticks(101), Qty::from_lots(2))
            .unwrap();
        b.insert(id(2), Owner::Flow, Side::Ask, Price::from_ticks(103), Qty::from_lots(2))
            .unwrap();

        let (fills, rem) = b.consume(Side::Bid, id(99), Qty::from_lots(5), Some(Price::from_ticks(102)));
        assert_eq!(fills.len(), 1);
        assert_eq!(rem, Qty::from_lots(3));
        assert_eq!(b.best_ask().map(|(p, _)| p), Some(Price::from_ticks(103)));
        b.check_invariants().unwrap();
    }

    #[test]
    fn test_open_orders_by_owner_ascending() {
        let mut b = book();
        b.insert(id(3), Owner::Flow, Side::Bid, Price::from_ticks(99), Qty::from_lots(1))
            .unwrap();
        b.insert(id(1), Owner::MarketMaker, Side::Bid, Price::from_ticks(98), Qty::from_lots(1))
            .unwrap();
        b.insert(id(2), Owner::Flow, Side::Ask, Price::from_ticks(101), Qty::from_lots(1))
            .unwrap();

        assert_eq!(b.open_orders(Owner::Flow), vec![id(2), id(3)]);
        assert_eq!(b.open_orders(Owner::MarketMaker), vec![id(1)]);
    }

    #[test]
    fn test_depth_to_move() {
        let mut b = book();
        b.insert(id(1), Owner::Flow, Side::Ask, Price::from_ticks(101), Qty::from_lots(5))
            .unwrap();
        b.insert(id(2), Owner::Flow, Side::Ask, Price::from_ticks(102), Qty::from_lots(7))
            .unwrap();

        // Pushing the best ask up to 102 means sweeping the 101 level
        assert_eq!(
            b.depth_to_move(Side::Bid, Price::from_ticks(102)),
            Qty::from_lots(5)
        );
    }
}
