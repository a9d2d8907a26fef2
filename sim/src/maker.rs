//! Quoting market maker
//!
//! On each refresh the maker reads the top of book, widens its half-spread
//! with the magnitude of its inventory, skews both quotes away from the side
//! that would grow inventory further, and issues an atomic cancel-replace.
//! Between refreshes it does not react at all; the cadence `K` is the only
//! latency in the system.

use lob::book::{OrderBook, TopOfBook};
use serde::{Deserialize, Serialize};
use types::event::{Event, Quote};
use types::ids::{OrderId, OrderIdGen, Owner};
use types::numeric::{notional, Cash, Price, Qty};
use types::order::Side;
use types::trade::Trade;

use crate::config::MakerConfig;

/// One fill against the maker's quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerFill {
    /// Side the maker traded: `Bid` means the maker bought
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

/// Market-maker state: inventory, cash, live quote ids, PnL trackers
#[derive(Debug, Clone)]
pub struct MarketMaker {
    config: MakerConfig,
    inventory: i64,
    cash: Cash,
    active_bid: Option<OrderId>,
    active_ask: Option<OrderId>,
    last_refresh: Option<u64>,
    avg_entry: f64,
    realized_pnl: f64,
    fill_count: u64,
}

impl MarketMaker {
    pub fn new(config: MakerConfig) -> Self {
        Self {
            config,
            inventory: 0,
            cash: Cash::zero(),
            active_bid: None,
            active_ask: None,
            last_refresh: None,
            avg_entry: 0.0,
            realized_pnl: 0.0,
            fill_count: 0,
        }
    }

    /// Build the cancel-replace for this refresh tick
    ///
    /// Quote prices: reference = mid (sticky when one side is empty),
    /// `half = half_spread + alpha * |inventory|`, `skew = -beta * inventory`,
    /// bid at `round(ref + skew - half)`, ask at `round(ref + skew + half)`.
    pub fn build_refresh(&mut self, ids: &mut OrderIdGen, top: &TopOfBook) -> Event {
        let reference = top.mid();
        let half = self.config.half_spread as f64
            + self.config.inventory_widen_alpha * self.inventory.abs() as f64;
        let skew = -self.config.skew_beta * self.inventory as f64;

        let mut bid = (reference + skew - half).round() as i64;
        let mut ask = (reference + skew + half).round() as i64;
        if bid >= ask {
            // Degenerate rounding; quote one tick around the reference.
            bid = reference.round() as i64 - 1;
            ask = reference.round() as i64 + 1;
        }
        bid = bid.max(1);
        ask = ask.max(bid + 1);

        let qty = Qty::from_lots(self.config.quote_size);
        Event::QuoteRefresh {
            cancel_bid: self.active_bid.take(),
            cancel_ask: self.active_ask.take(),
            bid: Some(Quote {
                id: ids.next_id(),
                price: Price::from_ticks(bid),
                qty,
            }),
            ask: Some(Quote {
                id: ids.next_id(),
                price: Price::from_ticks(ask),
                qty,
            }),
        }
    }

    /// Record which quote sides actually rested this refresh
    pub fn on_quotes_placed(&mut self, bid: Option<OrderId>, ask: Option<OrderId>, now: u64) {
        self.active_bid = bid;
        self.active_ask = ask;
        self.last_refresh = Some(now);
    }

    /// Update inventory and cash from a trade, if the maker was involved
    ///
    /// The maker only ever rests quotes, so it can only appear on the maker
    /// side of a trade. Inventory and cash move atomically here.
    pub fn on_trade(&mut self, trade: &Trade) -> Option<MakerFill> {
        if trade.maker_owner != Owner::MarketMaker {
            return None;
        }
        let side = trade.maker_side();
        self.apply_fill(side, trade.price, trade.qty);
        Some(MakerFill {
            side,
            price: trade.price,
            qty: trade.qty,
        })
    }

    /// Forget quote ids that no longer rest (fully filled since refresh)
    pub fn drop_stale(&mut self, book: &OrderBook) {
        if let Some(id) = self.active_bid {
            if !book.contains(id) {
                self.active_bid = None;
            }
        }
        if let Some(id) = self.active_ask {
            if !book.contains(id) {
                self.active_ask = None;
            }
        }
    }

    fn apply_fill(&mut self, side: Side, price: Price, qty: Qty) {
        match side {
            Side::Bid => self.cash.debit(notional(price, qty)),
            Side::Ask => self.cash.credit(notional(price, qty)),
        }
        self.update_position(side.sign(), qty.lots() as i64, price.ticks() as f64);
        self.fill_count += 1;
    }

    /// Average-entry position tracker: realized PnL accrues only when a
    /// fill closes existing inventory.
    fn update_position(&mut self, sign: i64, qty: i64, price: f64) {
        if self.inventory == 0 {
            self.inventory = sign * qty;
            self.avg_entry = price;
            return;
        }
        if self.inventory.signum() == sign {
            let current = self.inventory.abs() as f64;
            self.avg_entry = (self.avg_entry * current + price * qty as f64) / (current + qty as f64);
            self.inventory += sign * qty;
            return;
        }

        let close = self.inventory.abs().min(qty);
        if self.inventory > 0 {
            self.realized_pnl += (price - self.avg_entry) * close as f64;
        } else {
            self.realized_pnl += (self.avg_entry - price) * close as f64;
        }
        self.inventory += sign * close;
        if self.inventory == 0 {
            self.avg_entry = 0.0;
        }
        let flipped = qty - close;
        if flipped > 0 {
            self.inventory = sign * flipped;
            self.avg_entry = price;
        }
    }

    /// Mark-to-market PnL, doubled (exact with half-tick mids):
    /// `2 * cash + inventory * mid_x2`
    pub fn mark_to_market_x2(&self, mid_x2: i64) -> i64 {
        2 * self.cash.value() + self.inventory * mid_x2
    }

    /// PnL realized by round-trip inventory, in ticks per lot
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Open-position PnL against the given mid
    pub fn unrealized_pnl(&self, mid: f64) -> f64 {
        if self.inventory == 0 {
            0.0
        } else if self.inventory > 0 {
            (mid - self.avg_entry) * self.inventory as f64
        } else {
            (self.avg_entry - mid) * self.inventory.abs() as f64
        }
    }

    pub fn inventory(&self) -> i64 {
        self.inventory
    }

    pub fn cash(&self) -> Cash {
        self.cash
    }

    pub fn fill_count(&self) -> u64 {
        self.fill_count
    }

    pub fn active_bid(&self) -> Option<OrderId> {
        self.active_bid
    }

    pub fn active_ask(&self) -> Option<OrderId> {
        self.active_ask
    }

    pub fn last_refresh(&self) -> Option<u64> {
        self.last_refresh
    }
}
