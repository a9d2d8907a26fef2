//! Event variants consumed by the matching engine
//!
//! Every state change in a run flows through exactly one of these variants.
//! The engine dispatches on the tag; there is no other entry point for
//! mutating the book.

use crate::ids::{OrderId, Owner};
use crate::numeric::{Price, Qty};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// A single quote side within a `QuoteRefresh`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: OrderId,
    pub price: Price,
    pub qty: Qty,
}

/// Events applied by the matching engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Limit order; may be marketable, in which case the remainder rests
    /// at the submitted price.
    Limit {
        id: OrderId,
        owner: Owner,
        side: Side,
        price: Price,
        qty: Qty,
    },
    /// Market order; consumes the opposite side until filled or the book
    /// is exhausted, in which case the residual is dropped.
    Market {
        id: OrderId,
        owner: Owner,
        side: Side,
        qty: Qty,
    },
    /// Cancel by id; a no-op when the order is already gone.
    Cancel { id: OrderId },
    /// Market-maker composite: cancel both live quotes, then place the new
    /// ones. A side that would cross the opposing book is skipped for this
    /// refresh.
    QuoteRefresh {
        cancel_bid: Option<OrderId>,
        cancel_ask: Option<OrderId>,
        bid: Option<Quote>,
        ask: Option<Quote>,
    },
}

impl Event {
    /// Discriminant used in per-event records
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Limit { .. } => EventKind::Limit,
            Event::Market { .. } => EventKind::Market,
            Event::Cancel { .. } => EventKind::Cancel,
            Event::QuoteRefresh { .. } => EventKind::QuoteRefresh,
        }
    }
}

/// Event discriminant for records and counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Limit,
    Market,
    Cancel,
    QuoteRefresh,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind() {
        let ev = Event::Cancel {
            id: OrderId::from_raw(1),
        };
        assert_eq!(ev.kind(), EventKind::Cancel);
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let ev = Event::Limit {
            id: OrderId::from_raw(9),
            owner: Owner::Flow,
            side: Side::Bid,
            price: Price::from_ticks(100),
            qty: Qty::from_lots(5),
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }

    #[test]
    fn test_quote_refresh_serialization() {
        let ev = Event::QuoteRefresh {
            cancel_bid: Some(OrderId::from_raw(1)),
            cancel_ask: None,
            bid: Some(Quote {
                id: OrderId::from_raw(2),
                price: Price::from_ticks(99),
                qty: Qty::from_lots(3),
            }),
            ask: Some(Quote {
                id: OrderId::from_raw(3),
                price: Price::from_ticks(101),
                qty: Qty::from_lots(3),
            }),
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }
}
