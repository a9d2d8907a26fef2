//! Price level with a FIFO order queue
//!
//! A price level holds every resting order at one (side, price). Orders are
//! kept in arrival order; fills are always drawn from the head of the queue.

use std::collections::VecDeque;
use types::ids::{OrderId, Owner};
use types::numeric::Qty;
use types::order::Order;

/// One fill drawn from a level during a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFill {
    pub maker_id: OrderId,
    pub maker_owner: Owner,
    pub qty: Qty,
    /// True when this fill fully consumed the maker (it has left the queue)
    pub done: bool,
}

/// A price level containing orders at a specific price
///
/// Maintains strict FIFO ordering and a cached depth total. The invariant
/// `total == sum of entry remainders` holds after every operation.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
    total: Qty,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total: Qty::zero(),
        }
    }

    /// Append an order at the tail of the queue (time priority)
    pub fn push(&mut self, order: Order) {
        debug_assert!(
            self.orders
                .back()
                .map(|last| last.arrival_seq < order.arrival_seq)
                .unwrap_or(true),
            "arrival sequence must increase within a level"
        );
        self.total += order.remaining;
        self.orders.push_back(order);
    }

    /// Remove an order by id, returning it if present
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| o.id == order_id)?;
        let order = self.orders.remove(position)?;
        self.total -= order.remaining;
        Some(order)
    }

    /// Consume up to `want` from the head of the queue
    ///
    /// Entries whose id equals `taker` are skipped in place, never filled.
    /// Fully consumed makers are removed; a partially consumed head keeps
    /// its queue position. Returns the fills in consumption order and the
    /// unfilled remainder of `want`.
    pub fn fill_from_front(&mut self, taker: OrderId, mut want: Qty) -> (Vec<LevelFill>, Qty) {
        let mut fills = Vec::new();
        for entry in self.orders.iter_mut() {
            if want.is_zero() {
                break;
            }
            if entry.id == taker {
                continue;
            }
            let fill = want.min(entry.remaining);
            entry.remaining -= fill;
            want -= fill;
            self.total -= fill;
            fills.push(LevelFill {
                maker_id: entry.id,
                maker_owner: entry.owner,
                qty: fill,
                done: entry.remaining.is_zero(),
            });
        }
        self.orders.retain(|o| o.is_live());
        (fills, want)
    }

    /// Peek at the head of the queue
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Remaining quantity of one order at this level
    pub fn qty_of(&self, order_id: OrderId) -> Option<Qty> {
        self.orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|o| o.remaining)
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Aggregate resting quantity at this level
    pub fn total_qty(&self) -> Qty {
        self.total
    }

    /// Number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Iterate entries in queue order
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::Price;
    use types::order::Side;

    fn order(id: u64, qty: u64, seq: u64) -> Order {
        Order {
            id: OrderId::from_raw(id),
            owner: Owner::Flow,
            side: Side::Ask,
            price: Price::from_ticks(101),
            remaining: Qty::from_lots(qty),
            arrival_seq: seq,
        }
    }

    #[test]
    fn test_push_tracks_total() {
        let mut level = PriceLevel::new();
        level.push(order(1, 5, 1));
        level.push(order(2, 3, 2));
        assert_eq!(level.total_qty(), Qty::from_lots(8));
        assert_eq!(level.order_count(), 2);
    }

    #[test]
    fn test_fifo_fill_order() {
        let mut level = PriceLevel::new();
        level.push(order(1, 5, 1));
        level.push(order(2, 5, 2));

        let (fills, rem) = level.fill_from_front(OrderId::from_raw(99), Qty::from_lots(7));
        assert!(rem.is_zero());
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].maker_id, OrderId::from_raw(1));
        assert_eq!(fills[0].qty, Qty::from_lots(5));
        assert!(fills[0].done);
        assert_eq!(fills[1].maker_id, OrderId::from_raw(2));
        assert_eq!(fills[1].qty, Qty::from_lots(2));
        assert!(!fills[1].done);

        // Partially filled head keeps its position
        assert_eq!(level.front().map(|o| o.id), Some(OrderId::from_raw(2)));
        assert_eq!(level.total_qty(), Qty::from_lots(3));
    }

    #[test]
    fn test_fill_skips_taker_own_order() {
        let mut level = PriceLevel::new();
        level.push(order(7, 5, 1));
        level.push(order(8, 5, 2));

        let (fills, rem) = level.fill_from_front(OrderId::from_raw(7), Qty::from_lots(4));
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].maker_id, OrderId::from_raw(8));
        assert!(rem.is_zero());
        // The skipped order is untouched
        assert_eq!(level.qty_of(OrderId::from_raw(7)), Some(Qty::from_lots(5)));
    }

    #[test]
    fn test_remove_by_id() {
        let mut level = PriceLevel::new();
        level.push(order(1, 5, 1));
        level.push(order(2, 3, 2));

        let removed = level.remove(OrderId::from_raw(1)).unwrap();
        assert_eq!(removed.remaining, Qty::from_lots(5));
        assert_eq!(level.total_qty(), Qty::from_lots(3));
        assert!(level.remove(OrderId::from_raw(1)).is_none());
    }

    #[test]
    fn test_exhausting_fill_empties_level() {
        let mut level = PriceLevel::new();
        level.push(order(1, 2, 1));

        let (fills, rem) = level.fill_from_front(OrderId::from_raw(99), Qty::from_lots(6));
        assert_eq!(fills.len(), 1);
        assert_eq!(rem, Qty::from_lots(4));
        assert!(level.is_empty());
        assert!(level.total_qty().is_zero());
    }
}
