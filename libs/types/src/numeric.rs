//! Tick-quantized numeric types
//!
//! The engine works entirely in integer ticks and lots; `tick_size` and
//! `lot_size` map those units to display values at report time only. Keeping
//! the hot path integer-only makes every run exactly reproducible and every
//! invariant checkable with equality rather than tolerances.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Price in integer ticks
///
/// Always positive for resting orders; the book rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Create a price from a tick count
    pub fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Get the tick count
    pub fn ticks(&self) -> i64 {
        self.0
    }

    /// Whether this price is valid for a resting order
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Convert to display units at report time
    pub fn to_display(&self, tick_size: Decimal) -> Decimal {
        Decimal::from(self.0) * tick_size
    }
}

impl Add<i64> for Price {
    type Output = Self;

    fn add(self, rhs: i64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl Sub<i64> for Price {
    type Output = Self;

    fn sub(self, rhs: i64) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity in integer lots
///
/// Order quantities are strictly positive at submission; zero appears only
/// transiently while a fill drains an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qty(u64);

impl Qty {
    /// Create a quantity from a lot count
    pub fn from_lots(lots: u64) -> Self {
        Self(lots)
    }

    /// Zero quantity
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the lot count
    pub fn lots(&self) -> u64 {
        self.0
    }

    /// Check if the quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The smaller of two quantities (fill sizing)
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Convert to display units at report time
    pub fn to_display(&self, lot_size: Decimal) -> Decimal {
        Decimal::from(self.0) * lot_size
    }
}

impl Add for Qty {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Qty {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "quantity subtraction would underflow");
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Qty {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Qty {
    fn sub_assign(&mut self, rhs: Self) {
        assert!(self.0 >= rhs.0, "quantity subtraction would underflow");
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed cash balance in tick·lot units
///
/// A buy of `q` lots at `p` ticks debits `p·q`; a sell credits it. The
/// mark-to-market identity `cash + inventory · mid` holds exactly in these
/// units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cash(i64);

impl Cash {
    /// Zero balance
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the balance in tick·lot units
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Credit proceeds of a sale
    pub fn credit(&mut self, amount: i64) {
        self.0 += amount;
    }

    /// Debit the cost of a purchase
    pub fn debit(&mut self, amount: i64) {
        self.0 -= amount;
    }

    /// Convert to display units at report time
    pub fn to_display(&self, tick_size: Decimal, lot_size: Decimal) -> Decimal {
        Decimal::from(self.0) * tick_size * lot_size
    }
}

impl fmt::Display for Cash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade notional in tick·lot units
pub fn notional(price: Price, qty: Qty) -> i64 {
    price.ticks() * qty.lots() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_price_arithmetic() {
        let p = Price::from_ticks(100);
        assert_eq!(p + 3, Price::from_ticks(103));
        assert_eq!(p - 5, Price::from_ticks(95));
        assert!(p.is_positive());
        assert!(!Price::from_ticks(0).is_positive());
    }

    #[test]
    fn test_price_display_units() {
        let p = Price::from_ticks(10_050);
        let tick = Decimal::from_str("0.01").unwrap();
        assert_eq!(p.to_display(tick), Decimal::from_str("100.50").unwrap());
    }

    #[test]
    fn test_qty_arithmetic() {
        let a = Qty::from_lots(5);
        let b = Qty::from_lots(2);
        assert_eq!(a + b, Qty::from_lots(7));
        assert_eq!(a - b, Qty::from_lots(3));
        assert_eq!(a.min(b), b);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn test_qty_underflow_panics() {
        let _ = Qty::from_lots(1) - Qty::from_lots(2);
    }

    #[test]
    fn test_cash_fill_accounting() {
        let mut cash = Cash::zero();
        cash.debit(notional(Price::from_ticks(100), Qty::from_lots(3)));
        assert_eq!(cash.value(), -300);
        cash.credit(notional(Price::from_ticks(102), Qty::from_lots(3)));
        assert_eq!(cash.value(), 6);
    }

    #[test]
    fn test_serialization_transparent() {
        assert_eq!(serde_json::to_string(&Price::from_ticks(101)).unwrap(), "101");
        assert_eq!(serde_json::to_string(&Qty::from_lots(4)).unwrap(), "4");
        let p: Price = serde_json::from_str("101").unwrap();
        assert_eq!(p, Price::from_ticks(101));
    }
}
