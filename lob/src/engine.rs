//! Matching engine
//!
//! Applies incoming events to the order book and emits trades. Every event
//! resolves in a single transition: matched, rested, cancelled, or rejected.
//! Trades always execute at the resting order's price, in the order makers
//! were consumed.

use serde::{Deserialize, Serialize};
use types::event::{Event, Quote};
use types::ids::{OrderId, Owner};
use types::numeric::{Price, Qty};
use types::order::Side;
use types::trade::Trade;

use crate::book::{BookFill, OrderBook, TopOfBook};

/// Recoverable-condition counters
///
/// None of these aborts a run; they are surfaced in the diagnostics stream
/// so an experiment can tell how often each edge was hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Market orders whose residual was dropped against an empty book
    pub exhausted_book: u64,
    /// Maker quote sides skipped because they would have crossed
    pub crossed_quote: u64,
    /// Explicit cancels that found nothing to remove
    pub cancel_misses: u64,
}

/// Why an event failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    ZeroQuantity,
    NonPositivePrice,
}

/// Terminal outcome of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Passive limit rested without matching
    Rested { id: OrderId },
    /// Aggressor fully filled
    Filled { trades: Vec<Trade> },
    /// Aggressor partially filled; `rested` carries the residual's id for
    /// limits, and is `None` for market orders whose residual was dropped
    PartiallyFilled {
        trades: Vec<Trade>,
        rested: Option<OrderId>,
    },
    /// Cancel applied; `remaining` is `None` when the id was already gone
    Cancelled {
        id: OrderId,
        remaining: Option<Qty>,
    },
    /// Maker cancel-replace applied; the ids that actually rested
    QuoteRefreshed {
        bid: Option<OrderId>,
        ask: Option<OrderId>,
    },
    /// Event failed validation
    Rejected { reason: RejectReason },
}

impl ApplyResult {
    /// Trades produced by this event, if any
    pub fn trades(&self) -> &[Trade] {
        match self {
            ApplyResult::Filled { trades } | ApplyResult::PartiallyFilled { trades, .. } => trades,
            _ => &[],
        }
    }
}

/// Price-time-priority matching engine over a single book
pub struct MatchEngine {
    book: OrderBook,
    next_trade_seq: u64,
    diag: Diagnostics,
}

impl MatchEngine {
    /// Create an engine over an empty book with the given initial sticky mid
    pub fn new(initial_mid: Price) -> Self {
        Self {
            book: OrderBook::new(initial_mid),
            next_trade_seq: 1,
            diag: Diagnostics::default(),
        }
    }

    /// Apply one event at event-time `now`
    pub fn apply(&mut self, event: &Event, now: u64) -> ApplyResult {
        match event {
            Event::Limit {
                id,
                owner,
                side,
                price,
                qty,
            } => self.submit_limit(*id, *owner, *side, *price, *qty, now),
            Event::Market {
                id,
                owner,
                side,
                qty,
            } => self.submit_market(*id, *owner, *side, *qty, now),
            Event::Cancel { id } => self.submit_cancel(*id),
            Event::QuoteRefresh {
                cancel_bid,
                cancel_ask,
                bid,
                ask,
            } => self.refresh_quotes(*cancel_bid, *cancel_ask, *bid, *ask),
        }
    }

    /// Read access to the book
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Top-of-book snapshot after the last applied event
    pub fn snapshot(&self) -> TopOfBook {
        self.book.snapshot()
    }

    /// Counters for the recoverable conditions hit so far
    pub fn diagnostics(&self) -> Diagnostics {
        self.diag
    }

    fn submit_limit(
        &mut self,
        id: OrderId,
        owner: Owner,
        side: Side,
        price: Price,
        qty: Qty,
        now: u64,
    ) -> ApplyResult {
        if qty.is_zero() {
            return ApplyResult::Rejected {
                reason: RejectReason::ZeroQuantity,
            };
        }
        if !price.is_positive() {
            return ApplyResult::Rejected {
                reason: RejectReason::NonPositivePrice,
            };
        }

        let (fills, residual) = self.book.consume(side, id, qty, Some(price));
        let trades = self.emit_trades(&fills, id, owner, side, now);

        if residual.is_zero() {
            return ApplyResult::Filled { trades };
        }

        // Residual rests at the aggressor's limit price.
        let rested = match self.book.insert(id, owner, side, price, residual) {
            Ok(_) => Some(id),
            Err(err) => {
                tracing::warn!(%id, %err, "residual could not rest after walk");
                None
            }
        };
        if trades.is_empty() {
            match rested {
                Some(id) => ApplyResult::Rested { id },
                None => ApplyResult::PartiallyFilled {
                    trades,
                    rested: None,
                },
            }
        } else {
            ApplyResult::PartiallyFilled { trades, rested }
        }
    }

    fn submit_market(
        &mut self,
        id: OrderId,
        owner: Owner,
        side: Side,
        qty: Qty,
        now: u64,
    ) -> ApplyResult {
        if qty.is_zero() {
            return ApplyResult::Rejected {
                reason: RejectReason::ZeroQuantity,
            };
        }

        let (fills, residual) = self.book.consume(side, id, qty, None);
        let trades = self.emit_trades(&fills, id, owner, side, now);

        if residual.is_zero() {
            ApplyResult::Filled { trades }
        } else {
            // The opposing book ran out: the residual is dropped, never
            // queued or synthesized.
            self.diag.exhausted_book += 1;
            tracing::debug!(%id, residual = residual.lots(), "book exhausted, residual dropped");
            ApplyResult::PartiallyFilled {
                trades,
                rested: None,
            }
        }
    }

    fn submit_cancel(&mut self, id: OrderId) -> ApplyResult {
        match self.book.cancel(id) {
            Ok(remaining) => ApplyResult::Cancelled {
                id,
                remaining: Some(remaining),
            },
            Err(_) => {
                self.diag.cancel_misses += 1;
                ApplyResult::Cancelled {
                    id,
                    remaining: None,
                }
            }
        }
    }

    /// Atomic cancel-replace: old bid, old ask, new bid, new ask, in that
    /// order. A new side that would cross the opposing book after the
    /// cancels is skipped for this refresh.
    fn refresh_quotes(
        &mut self,
        cancel_bid: Option<OrderId>,
        cancel_ask: Option<OrderId>,
        bid: Option<Quote>,
        ask: Option<Quote>,
    ) -> ApplyResult {
        if let Some(id) = cancel_bid {
            // Quotes routinely get filled between refreshes; a miss here is
            // the normal case, not a diagnostic.
            let _ = self.book.cancel(id);
        }
        if let Some(id) = cancel_ask {
            let _ = self.book.cancel(id);
        }

        let placed_bid = bid.and_then(|q| self.place_quote(Side::Bid, q));
        let placed_ask = ask.and_then(|q| self.place_quote(Side::Ask, q));

        ApplyResult::QuoteRefreshed {
            bid: placed_bid,
            ask: placed_ask,
        }
    }

    fn place_quote(&mut self, side: Side, quote: Quote) -> Option<OrderId> {
        if quote.qty.is_zero() || !quote.price.is_positive() {
            tracing::warn!(id = %quote.id, "invalid maker quote dropped");
            return None;
        }
        match self
            .book
            .insert(quote.id, Owner::MarketMaker, side, quote.price, quote.qty)
        {
            Ok(_) => Some(quote.id),
            Err(err) => {
                self.diag.crossed_quote += 1;
                tracing::debug!(%err, "maker quote skipped for this refresh");
                None
            }
        }
    }

    fn emit_trades(
        &mut self,
        fills: &[BookFill],
        taker_id: OrderId,
        taker_owner: Owner,
        taker_side: Side,
        now: u64,
    ) -> Vec<Trade> {
        fills
            .iter()
            .map(|f| {
                let sequence = self.next_trade_seq;
                self.next_trade_seq += 1;
                Trade {
                    sequence,
                    taker_side,
                    price: f.price,
                    qty: f.qty,
                    maker_order_id: f.maker_id,
                    taker_order_id: taker_id,
                    maker_owner: f.maker_owner,
                    taker_owner,
                    timestamp: now,
                }
            })
            .collect()
    }
}
