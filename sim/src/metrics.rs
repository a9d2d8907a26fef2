//! Per-event records, trade log, markouts, and the run summary
//!
//! The recorder consumes post-event snapshots and trades as the scheduler
//! produces them, then finalizes markouts and aggregates once the run ends.
//! Markouts are signed so that a negative average always means adverse
//! selection against the maker; that sign convention is part of the
//! interface.

use lob::book::TopOfBook;
use lob::engine::Diagnostics;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::event::EventKind;
use types::ids::{OrderId, Owner};
use types::numeric::{Cash, Price, Qty};
use types::order::Side;
use types::trade::Trade;

use crate::maker::{MakerFill, MarketMaker};

/// Post-event state row, one per exogenous event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub time: u64,
    pub event_type: EventKind,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    /// Mid in ticks; sticky when one side is empty
    pub mid: f64,
    pub spread: Option<i64>,
    pub inventory: i64,
    pub cash: Cash,
    pub mtm_pnl: f64,
    pub last_trade_price: Option<Price>,
    /// Latent fundamental, in ticks (never visible to the maker)
    pub fundamental: i64,
    pub fundamental_gap: f64,
    pub mm_refreshed: bool,
}

/// Trade row: the engine's trade plus maker attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub sequence: u64,
    pub time: u64,
    pub taker_side: Side,
    pub price: Price,
    pub qty: Qty,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_owner: Owner,
    pub taker_owner: Owner,
    pub mm_involved: bool,
}

impl TradeRecord {
    fn from_trade(trade: &Trade) -> Self {
        Self {
            sequence: trade.sequence,
            time: trade.timestamp,
            taker_side: trade.taker_side,
            price: trade.price,
            qty: trade.qty,
            maker_order_id: trade.maker_order_id,
            taker_order_id: trade.taker_order_id,
            maker_owner: trade.maker_owner,
            taker_owner: trade.taker_owner,
            mm_involved: trade.mm_involved(),
        }
    }
}

/// Maker fill with its markout, finalized once the horizon exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    pub time: u64,
    /// `Bid` means the maker bought
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    /// `(mid[t+h] - fill_price) * sign`, in ticks; `None` for trailing fills
    /// whose horizon falls past the end of the run
    pub markout: Option<f64>,
}

/// Aggregates for a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub events: u64,
    pub trades: u64,
    pub mm_fills: u64,
    pub finalized_markouts: u64,
    pub final_inventory: i64,
    pub final_cash: Cash,
    pub final_mid: f64,
    pub final_fundamental: i64,
    pub final_mtm_pnl: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub avg_spread: f64,
    pub avg_abs_inventory: f64,
    /// Negative means adverse selection against the maker
    pub avg_markout: f64,
    /// Fraction of finalized maker fills with negative markout
    pub adverse_fill_ratio: f64,
    pub markout_horizon: u64,
    /// Signed taker-volume imbalance, (buys - sells) / total
    pub flow_imbalance: f64,
    pub diagnostics: Diagnostics,
    /// Mark-to-market PnL in display units (tick_size · lot_size applied)
    pub final_mtm_display: Decimal,
    /// Realized PnL in display units
    pub realized_pnl_display: Decimal,
}

/// Accumulates records during a run and finalizes them at the end
#[derive(Debug, Default)]
pub struct Recorder {
    records: Vec<EventRecord>,
    trades: Vec<TradeRecord>,
    fills: Vec<FillRecord>,
    mids_x2: Vec<i64>,
    last_trade_price: Option<Price>,
    buy_volume: u64,
    sell_volume: u64,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one trade as it is emitted
    pub fn record_trade(&mut self, trade: &Trade) {
        self.last_trade_price = Some(trade.price);
        match trade.taker_side {
            Side::Bid => self.buy_volume += trade.qty.lots(),
            Side::Ask => self.sell_volume += trade.qty.lots(),
        }
        self.trades.push(TradeRecord::from_trade(trade));
    }

    /// Record one maker fill; its markout is finalized at the end of the run
    pub fn record_fill(&mut self, time: u64, fill: MakerFill) {
        self.fills.push(FillRecord {
            time,
            side: fill.side,
            price: fill.price,
            qty: fill.qty,
            markout: None,
        });
    }

    /// Record the post-event state row
    pub fn record_event(
        &mut self,
        time: u64,
        event_type: EventKind,
        top: &TopOfBook,
        maker: &MarketMaker,
        fundamental: i64,
        mm_refreshed: bool,
    ) {
        let mid = top.mid();
        self.mids_x2.push(top.mid_x2);
        self.records.push(EventRecord {
            seq: time,
            time,
            event_type,
            best_bid: top.bid.map(|(p, _)| p),
            best_ask: top.ask.map(|(p, _)| p),
            mid,
            spread: top.spread,
            inventory: maker.inventory(),
            cash: maker.cash(),
            mtm_pnl: maker.mark_to_market_x2(top.mid_x2) as f64 / 2.0,
            last_trade_price: self.last_trade_price,
            fundamental,
            fundamental_gap: fundamental as f64 - mid,
            mm_refreshed,
        });
    }

    /// Finalize markouts and build the summary
    pub fn finish(
        mut self,
        markout_horizon: u64,
        tick_size: Decimal,
        lot_size: Decimal,
        maker: &MarketMaker,
        diagnostics: Diagnostics,
        final_fundamental: i64,
    ) -> (Vec<EventRecord>, Vec<TradeRecord>, Vec<FillRecord>, Summary) {
        let n = self.mids_x2.len() as u64;
        let mut markout_sum_x2 = 0i64;
        let mut finalized = 0u64;
        let mut adverse = 0u64;

        for fill in self.fills.iter_mut() {
            let target = fill.time + markout_horizon;
            if target >= n {
                continue;
            }
            let sign = fill.side.sign();
            let markout_x2 = sign * (self.mids_x2[target as usize] - 2 * fill.price.ticks());
            fill.markout = Some(markout_x2 as f64 / 2.0);
            markout_sum_x2 += markout_x2;
            finalized += 1;
            if markout_x2 < 0 {
                adverse += 1;
            }
        }

        let last_mid_x2 = self.mids_x2.last().copied().unwrap_or(0);
        let mtm_x2 = maker.mark_to_market_x2(last_mid_x2);

        let spreads: Vec<i64> = self.records.iter().filter_map(|r| r.spread).collect();
        let avg_spread = if spreads.is_empty() {
            0.0
        } else {
            spreads.iter().sum::<i64>() as f64 / spreads.len() as f64
        };
        let avg_abs_inventory = if self.records.is_empty() {
            0.0
        } else {
            self.records.iter().map(|r| r.inventory.abs()).sum::<i64>() as f64
                / self.records.len() as f64
        };
        let total_volume = self.buy_volume + self.sell_volume;
        let flow_imbalance = if total_volume == 0 {
            0.0
        } else {
            (self.buy_volume as f64 - self.sell_volume as f64) / total_volume as f64
        };

        let summary = Summary {
            events: n,
            trades: self.trades.len() as u64,
            mm_fills: self.fills.len() as u64,
            finalized_markouts: finalized,
            final_inventory: maker.inventory(),
            final_cash: maker.cash(),
            final_mid: last_mid_x2 as f64 / 2.0,
            final_fundamental,
            final_mtm_pnl: mtm_x2 as f64 / 2.0,
            realized_pnl: maker.realized_pnl(),
            unrealized_pnl: maker.unrealized_pnl(last_mid_x2 as f64 / 2.0),
            avg_spread,
            avg_abs_inventory,
            avg_markout: if finalized == 0 {
                0.0
            } else {
                markout_sum_x2 as f64 / 2.0 / finalized as f64
            },
            adverse_fill_ratio: if finalized == 0 {
                0.0
            } else {
                adverse as f64 / finalized as f64
            },
            markout_horizon,
            flow_imbalance,
            diagnostics,
            final_mtm_display: Decimal::from(mtm_x2) * tick_size * lot_size / Decimal::from(2),
            realized_pnl_display: Decimal::from_f64(maker.realized_pnl()).unwrap_or_default()
                * tick_size
                * lot_size,
        };

        (self.records, self.trades, self.fills, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MakerConfig;
    use types::ids::OrderId;

    fn top(bid: i64, ask: i64) -> TopOfBook {
        TopOfBook {
            bid: Some((Price::from_ticks(bid), Qty::from_lots(1))),
            ask: Some((Price::from_ticks(ask), Qty::from_lots(1))),
            mid_x2: bid + ask,
            spread: Some(ask - bid),
        }
    }

    fn trade(seq: u64, taker_side: Side, price: i64, qty: u64, maker_owner: Owner) -> Trade {
        Trade {
            sequence: seq,
            taker_side,
            price: Price::from_ticks(price),
            qty: Qty::from_lots(qty),
            maker_order_id: OrderId::from_raw(1),
            taker_order_id: OrderId::from_raw(2),
            maker_owner,
            taker_owner: Owner::Flow,
            timestamp: 0,
        }
    }

    fn finish(recorder: Recorder, horizon: u64) -> (Vec<EventRecord>, Vec<TradeRecord>, Vec<FillRecord>, Summary) {
        let maker = MarketMaker::new(MakerConfig::default());
        recorder.finish(
            horizon,
            Decimal::ONE,
            Decimal::ONE,
            &maker,
            Diagnostics::default(),
            100,
        )
    }

    #[test]
    fn test_markout_sign_convention() {
        let maker = MarketMaker::new(MakerConfig::default());
        let mut recorder = Recorder::new();

        // Maker bought at 100 on event 0; mid rises to 103 by event 2.
        recorder.record_fill(
            0,
            MakerFill {
                side: Side::Bid,
                price: Price::from_ticks(100),
                qty: Qty::from_lots(1),
            },
        );
        for (t, (b, a)) in [(99, 101), (101, 103), (102, 104)].iter().enumerate() {
            recorder.record_event(t as u64, EventKind::Limit, &top(*b, *a), &maker, 100, false);
        }

        let (_, _, fills, summary) = finish(recorder, 2);
        // mid at t+2 = 103, fill at 100, maker bought: markout = +3
        assert_eq!(fills[0].markout, Some(3.0));
        assert_eq!(summary.avg_markout, 3.0);
        assert_eq!(summary.adverse_fill_ratio, 0.0);
    }

    #[test]
    fn test_adverse_markout_is_negative() {
        let maker = MarketMaker::new(MakerConfig::default());
        let mut recorder = Recorder::new();

        // Maker bought at 101; mid falls to 98.
        recorder.record_fill(
            0,
            MakerFill {
                side: Side::Bid,
                price: Price::from_ticks(101),
                qty: Qty::from_lots(1),
            },
        );
        for (t, (b, a)) in [(100, 102), (97, 99)].iter().enumerate() {
            recorder.record_event(t as u64, EventKind::Market, &top(*b, *a), &maker, 100, false);
        }

        let (_, _, fills, summary) = finish(recorder, 1);
        assert_eq!(fills[0].markout, Some(-3.0));
        assert_eq!(summary.adverse_fill_ratio, 1.0);
    }

    #[test]
    fn test_trailing_fills_excluded() {
        let maker = MarketMaker::new(MakerConfig::default());
        let mut recorder = Recorder::new();

        recorder.record_fill(
            1,
            MakerFill {
                side: Side::Ask,
                price: Price::from_ticks(100),
                qty: Qty::from_lots(1),
            },
        );
        for t in 0..3u64 {
            recorder.record_event(t, EventKind::Limit, &top(99, 101), &maker, 100, false);
        }

        // Horizon 5 never lands inside the run: fill stays unfinalized.
        let (_, _, fills, summary) = finish(recorder, 5);
        assert_eq!(fills[0].markout, None);
        assert_eq!(summary.finalized_markouts, 0);
        assert_eq!(summary.avg_markout, 0.0);
    }

    #[test]
    fn test_flow_imbalance_from_taker_volume() {
        let mut recorder = Recorder::new();
        recorder.record_trade(&trade(1, Side::Bid, 100, 3, Owner::Flow));
        recorder.record_trade(&trade(2, Side::Ask, 100, 1, Owner::Flow));

        let (_, trades, _, summary) = finish(recorder, 1);
        assert_eq!(trades.len(), 2);
        assert_eq!(summary.flow_imbalance, 0.5);
    }

    #[test]
    fn test_mm_involved_flag() {
        let mut recorder = Recorder::new();
        recorder.record_trade(&trade(1, Side::Bid, 100, 1, Owner::MarketMaker));
        recorder.record_trade(&trade(2, Side::Bid, 100, 1, Owner::Flow));

        let (_, trades, _, _) = finish(recorder, 1);
        assert!(trades[0].mm_involved);
        assert!(!trades[1].mm_involved);
    }

    #[test]
    fn test_last_trade_price_carried_into_records() {
        let maker = MarketMaker::new(MakerConfig::default());
        let mut recorder = Recorder::new();

        recorder.record_event(0, EventKind::Limit, &top(99, 101), &maker, 100, false);
        recorder.record_trade(&trade(1, Side::Bid, 101, 1, Owner::Flow));
        recorder.record_event(1, EventKind::Market, &top(99, 101), &maker, 100, false);

        let (records, _, _, _) = finish(recorder, 1);
        assert_eq!(records[0].last_trade_price, None);
        assert_eq!(records[1].last_trade_price, Some(Price::from_ticks(101)));
    }
}
