//! Deterministic event loop
//!
//! Single-threaded and cooperative: one event at a time, nothing suspends,
//! and the matching engine returns before the next event is drawn. Within a
//! tick the order is fixed: maker refresh when due, then the exogenous
//! event, then any due fundamental realization, then metrics. The
//! refresh-first tie-break is what makes `K` behave as latency: raising it
//! delays adaptation by up to `K - 1` events.

use lob::engine::{ApplyResult, MatchEngine};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use types::event::{Event, EventKind};
use types::ids::{OrderIdGen, Owner};
use types::numeric::{Price, Qty};
use types::order::Side;

use crate::config::SimConfig;
use crate::flow::{FlowDecision, FlowKind, FlowModel};
use crate::maker::MarketMaker;
use crate::metrics::{EventRecord, FillRecord, Recorder, Summary, TradeRecord};
use crate::replay::{capture, EngineSnapshot, LoggedEvent};
use types::errors::ConfigError;

/// Everything a finished run produces, in memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimOutput {
    pub records: Vec<EventRecord>,
    pub trades: Vec<TradeRecord>,
    pub mm_fills: Vec<FillRecord>,
    pub summary: Summary,
    /// Every applied event, for replay validation
    pub event_log: Vec<LoggedEvent>,
    /// Fingerprint of the final book, for replay comparison
    pub final_book: EngineSnapshot,
}

/// The simulator: scheduler, agents, engine, and recorder in one loop
pub struct Simulator {
    config: SimConfig,
    rng: ChaCha8Rng,
    engine: MatchEngine,
    flow: FlowModel,
    maker: MarketMaker,
    ids: OrderIdGen,
    fundamental: i64,
    t: u64,
    recorder: Recorder,
    event_log: Vec<LoggedEvent>,
    trade_count: u64,
}

impl Simulator {
    /// Validate the config, seed the PRNG, and pre-load the book
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let engine = MatchEngine::new(Price::from_ticks(config.base_price));
        let flow = FlowModel::new(config.flow.clone());
        let maker = MarketMaker::new(config.mm.clone());
        let fundamental = config.base_price;

        let mut sim = Self {
            config,
            rng,
            engine,
            flow,
            maker,
            ids: OrderIdGen::default(),
            fundamental,
            t: 0,
            recorder: Recorder::new(),
            event_log: Vec::new(),
            trade_count: 0,
        };
        sim.seed_book();
        Ok(sim)
    }

    /// Passive depth around the base price so a mid exists from event 0
    fn seed_book(&mut self) {
        let base = self.config.base_price;
        let qty = Qty::from_lots(self.config.initial_depth_qty);
        for level in 1..=self.config.initial_depth_levels {
            for (side, price) in [
                (Side::Bid, Price::from_ticks(base - level)),
                (Side::Ask, Price::from_ticks(base + level)),
            ] {
                let event = Event::Limit {
                    id: self.ids.next_id(),
                    owner: Owner::Flow,
                    side,
                    price,
                    qty,
                };
                self.apply_logged(&event, 0);
            }
        }
        tracing::debug!(
            levels = self.config.initial_depth_levels,
            qty = self.config.initial_depth_qty,
            "seeded initial book depth"
        );
    }

    /// Advance one tick; returns false once the event budget is spent
    pub fn step(&mut self) -> bool {
        if self.t >= self.config.n_events {
            return false;
        }
        let t = self.t;

        // Refresh precedes the exogenous event at every K-th tick.
        let mut refreshed = false;
        if t % self.config.mm.refresh_k == 0 {
            self.refresh_maker(t);
            refreshed = true;
        }

        let decision = self.flow.next(&mut self.rng, t);
        let kind = match decision.kind {
            FlowKind::Limit => EventKind::Limit,
            FlowKind::Market => EventKind::Market,
            FlowKind::Cancel => EventKind::Cancel,
        };
        if let Some(event) = self.build_exogenous(&decision) {
            self.apply_logged(&event, t);
        }

        for mv in self.flow.take_due(t) {
            self.fundamental += mv.sign * mv.jump_ticks;
            if self.config.flow.informed.fundamental_beta == 0.0 {
                // v1: the move is realized into the mid immediately.
                self.apply_impact(mv.sign, mv.jump_ticks, t);
            }
        }
        let beta = self.config.flow.informed.fundamental_beta;
        if beta > 0.0 && decision.adapt_roll < beta {
            // v2: one adaptation step toward the fundamental.
            self.adapt_toward_fundamental(t);
        }

        self.maker.drop_stale(self.engine.book());
        let top = self.engine.snapshot();
        self.recorder
            .record_event(t, kind, &top, &self.maker, self.fundamental, refreshed);

        self.t += 1;
        true
    }

    /// Run to the event budget and finalize
    pub fn run(mut self) -> SimOutput {
        while self.step() {}
        self.finish()
    }

    /// Finalize markouts and aggregates without stepping further
    pub fn finish(self) -> SimOutput {
        let final_book = capture(&self.engine, self.trade_count);
        let diagnostics = self.engine.diagnostics();
        let (records, trades, mm_fills, summary) = self.recorder.finish(
            self.config.markout_horizon,
            self.config.tick_size,
            self.config.lot_size,
            &self.maker,
            diagnostics,
            self.fundamental,
        );
        SimOutput {
            records,
            trades,
            mm_fills,
            summary,
            event_log: self.event_log,
            final_book,
        }
    }

    fn refresh_maker(&mut self, t: u64) {
        let top = self.engine.snapshot();
        let event = self.maker.build_refresh(&mut self.ids, &top);
        let result = self.engine.apply(&event, t);
        if let ApplyResult::QuoteRefreshed { bid, ask } = &result {
            self.maker.on_quotes_placed(*bid, *ask, t);
        }
        self.event_log.push(LoggedEvent { time: t, event });
    }

    fn build_exogenous(&mut self, decision: &FlowDecision) -> Option<Event> {
        match decision.kind {
            FlowKind::Limit => Some(self.build_limit(decision)),
            FlowKind::Market => Some(Event::Market {
                id: self.ids.next_id(),
                owner: if decision.informed {
                    Owner::Informed
                } else {
                    Owner::Flow
                },
                side: decision.side,
                qty: decision.qty,
            }),
            FlowKind::Cancel => self.pick_cancel_target(decision.cancel_pick),
        }
    }

    fn build_limit(&mut self, decision: &FlowDecision) -> Event {
        let top = self.engine.snapshot();
        let reference = top.mid_ticks();
        let side = decision.side;

        let price = if decision.marketable {
            // One tick through the opposite best.
            match side {
                Side::Bid => top
                    .ask
                    .map(|(a, _)| a + 1)
                    .unwrap_or(Price::from_ticks(reference + 1)),
                Side::Ask => top
                    .bid
                    .map(|(b, _)| b - 1)
                    .unwrap_or(Price::from_ticks(reference - 1)),
            }
        } else {
            // Passive offset from the mid, clamped so it cannot cross.
            match side {
                Side::Bid => {
                    let mut p = reference - decision.offset;
                    if let Some((ask, _)) = top.ask {
                        p = p.min(ask.ticks() - 1);
                    }
                    Price::from_ticks(p)
                }
                Side::Ask => {
                    let mut p = reference + decision.offset;
                    if let Some((bid, _)) = top.bid {
                        p = p.max(bid.ticks() + 1);
                    }
                    Price::from_ticks(p)
                }
            }
        };
        let price = Price::from_ticks(price.ticks().max(1));

        Event::Limit {
            id: self.ids.next_id(),
            owner: Owner::Flow,
            side,
            price,
            qty: decision.qty,
        }
    }

    /// Select a flow-owned resting order via the fixed cancel draw;
    /// candidates iterate in ascending id order so selection is
    /// deterministic
    fn pick_cancel_target(&mut self, pick: f64) -> Option<Event> {
        let candidates = self.engine.book().open_orders(Owner::Flow);
        if candidates.is_empty() {
            return None;
        }
        let idx = ((pick * candidates.len() as f64) as usize).min(candidates.len() - 1);
        Some(Event::Cancel { id: candidates[idx] })
    }

    /// Realize a fundamental move by sweeping exactly the depth that keeps
    /// the opposing best within `jump_ticks` of where it was
    fn apply_impact(&mut self, sign: i64, jump_ticks: i64, t: u64) {
        let taker_side = if sign > 0 { Side::Bid } else { Side::Ask };
        let target = match taker_side {
            Side::Bid => match self.engine.book().best_ask() {
                Some((ask, _)) => ask + jump_ticks,
                None => return,
            },
            Side::Ask => match self.engine.book().best_bid() {
                Some((bid, _)) => bid - jump_ticks,
                None => return,
            },
        };
        let qty = self.engine.book().depth_to_move(taker_side, target);
        if qty.is_zero() {
            return;
        }
        let event = Event::Market {
            id: self.ids.next_id(),
            owner: Owner::Impact,
            side: taker_side,
            qty,
        };
        self.apply_logged(&event, t);
    }

    /// One v2 adaptation step: push the mid one tick toward the fundamental
    fn adapt_toward_fundamental(&mut self, t: u64) {
        let top = self.engine.snapshot();
        let gap = self.fundamental as f64 - top.mid();
        if gap.abs() < 1.0 {
            return;
        }
        let taker_side = if gap > 0.0 { Side::Bid } else { Side::Ask };
        let target = match taker_side {
            Side::Bid => match top.ask {
                Some((ask, _)) => ask + 1,
                None => return,
            },
            Side::Ask => match top.bid {
                Some((bid, _)) => bid - 1,
                None => return,
            },
        };
        let depth = self.engine.book().depth_to_move(taker_side, target);
        if depth.is_zero() {
            return;
        }
        let gap_ticks = (gap.abs() as u64).max(1);
        let cap = self.config.flow.informed.adapt_max_qty * gap_ticks.min(5);
        let qty = depth.min(Qty::from_lots(cap.max(1)));

        let event = Event::Market {
            id: self.ids.next_id(),
            owner: Owner::Impact,
            side: taker_side,
            qty,
        };
        self.apply_logged(&event, t);
    }

    fn apply_logged(&mut self, event: &Event, t: u64) {
        let result = self.engine.apply(event, t);
        for trade in result.trades() {
            self.trade_count += 1;
            self.recorder.record_trade(trade);
            if let Some(fill) = self.maker.on_trade(trade) {
                self.recorder.record_fill(t, fill);
            }
        }
        self.event_log.push(LoggedEvent {
            time: t,
            event: event.clone(),
        });
    }

    /// Current event index
    pub fn time(&self) -> u64 {
        self.t
    }

    /// Read access for invariant checks in tests
    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// Read access to maker state
    pub fn maker(&self) -> &MarketMaker {
        &self.maker
    }

    /// Latent fundamental price, in ticks
    pub fn fundamental(&self) -> i64 {
        self.fundamental
    }
}
