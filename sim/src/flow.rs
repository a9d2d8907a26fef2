//! Exogenous order-flow generator
//!
//! One seeded PRNG drives everything. Per event the model takes the same
//! variates in the same order (signal noise, type, side, marketable, size,
//! price offset, informed override, cancel selection, adaptation) whether
//! or not a branch uses them, so sweeping one parameter (say `p_informed`)
//! leaves every other draw of the run unchanged.
//!
//! The informed cohort rides a latent mean-reverting signal `s`. When an
//! informed market order fires, its side is `sign(s)` and a fundamental move
//! of the same sign is scheduled `info_horizon` events ahead; realized moves
//! are what make informed fills adversely selected at that horizon.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use types::numeric::Qty;
use types::order::Side;

use crate::config::FlowConfig;

/// What kind of exogenous event to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    Limit,
    Market,
    Cancel,
}

/// A fundamental move scheduled by an informed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundamentalMove {
    /// Event index at which the move is realized
    pub due: u64,
    /// +1 up, -1 down
    pub sign: i64,
    pub jump_ticks: i64,
}

/// Everything the scheduler needs from one event's draws
#[derive(Debug, Clone, Copy)]
pub struct FlowDecision {
    pub kind: FlowKind,
    pub side: Side,
    pub qty: Qty,
    /// Limit price offset from the mid, in ticks
    pub offset: i64,
    /// Price this limit through the opposite best instead of clamping
    pub marketable: bool,
    /// Side was forced by the latent signal
    pub informed: bool,
    /// Uniform variate selecting the cancel target
    pub cancel_pick: f64,
    /// Uniform variate gating one v2 adaptation step
    pub adapt_roll: f64,
}

/// Seeded stochastic flow model with an informed cohort
pub struct FlowModel {
    config: FlowConfig,
    signal: f64,
    pending: VecDeque<FundamentalMove>,
}

impl FlowModel {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            config,
            signal: 0.0,
            pending: VecDeque::new(),
        }
    }

    /// Current latent signal (never observable by the market maker)
    pub fn signal(&self) -> f64 {
        self.signal
    }

    /// Draw the next exogenous event at index `t`
    pub fn next(&mut self, rng: &mut ChaCha8Rng, t: u64) -> FlowDecision {
        // Fixed draw order; see the module docs.
        let noise: f64 = rng.gen_range(-1.0..1.0);
        let u_type: f64 = rng.gen();
        let u_side: f64 = rng.gen();
        let u_marketable: f64 = rng.gen();
        let sampled_qty = self.config.size.sample(rng);
        let offset = self.config.price_offset.sample(rng);
        let u_informed: f64 = rng.gen();
        let cancel_pick: f64 = rng.gen();
        let adapt_roll: f64 = rng.gen();

        let informed_cfg = &self.config.informed;
        self.signal = (1.0 - informed_cfg.signal_mean_reversion) * self.signal + noise;

        let kind = if u_type < self.config.probs.limit {
            FlowKind::Limit
        } else if u_type < self.config.probs.limit + self.config.probs.market {
            FlowKind::Market
        } else {
            FlowKind::Cancel
        };

        let p_buy = self.config.p_buy_at(t);
        let mut side = if u_side < p_buy { Side::Bid } else { Side::Ask };
        let mut qty = sampled_qty;

        let informed = kind == FlowKind::Market
            && u_informed < informed_cfg.p_informed
            && self.signal.abs() > informed_cfg.signal_tau;
        if informed {
            side = if self.signal > 0.0 { Side::Bid } else { Side::Ask };
            qty = ((qty as f64 * informed_cfg.informed_qty_mult).round() as u64).max(1);
            self.pending.push_back(FundamentalMove {
                due: t + informed_cfg.info_horizon,
                sign: if self.signal > 0.0 { 1 } else { -1 },
                jump_ticks: informed_cfg.toxic_jump_ticks,
            });
            tracing::trace!(t, signal = self.signal, "informed order scheduled a fundamental move");
        }

        let marketable =
            kind == FlowKind::Limit && u_marketable < self.config.marketable_limit_prob;

        FlowDecision {
            kind,
            side,
            qty: Qty::from_lots(qty),
            offset,
            marketable,
            informed,
            cancel_pick,
            adapt_roll,
        }
    }

    /// Pop every fundamental move due at or before `t`
    pub fn take_due(&mut self, t: u64) -> Vec<FundamentalMove> {
        let mut due = Vec::new();
        while let Some(front) = self.pending.front() {
            if front.due > t {
                break;
            }
            if let Some(mv) = self.pending.pop_front() {
                due.push(mv);
            }
        }
        due
    }

    /// Fundamental moves scheduled but not yet realized
    pub fn pending_moves(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use rand::SeedableRng;

    fn model(mutate: impl FnOnce(&mut FlowConfig)) -> FlowModel {
        let mut config = FlowConfig::default();
        mutate(&mut config);
        FlowModel::new(config)
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let mut a = model(|_| {});
        let mut b = model(|_| {});
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);

        for t in 0..200 {
            let da = a.next(&mut rng_a, t);
            let db = b.next(&mut rng_b, t);
            assert_eq!(da.kind, db.kind);
            assert_eq!(da.side, db.side);
            assert_eq!(da.qty, db.qty);
            assert_eq!(da.offset, db.offset);
            assert_eq!(da.informed, db.informed);
        }
    }

    #[test]
    fn test_full_imbalance_forces_side() {
        let mut flow = model(|c| c.p_buy = 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for t in 0..100 {
            let d = flow.next(&mut rng, t);
            if !d.informed {
                assert_eq!(d.side, Side::Bid);
            }
        }
    }

    #[test]
    fn test_informed_override_follows_signal() {
        let mut flow = model(|c| {
            c.probs.limit = 0.0;
            c.probs.market = 1.0;
            c.probs.cancel = 0.0;
            c.informed.p_informed = 1.0;
            c.informed.signal_tau = 0.0;
        });
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for t in 0..100 {
            let d = flow.next(&mut rng, t);
            assert!(d.informed);
            let expected = if flow.signal() > 0.0 { Side::Bid } else { Side::Ask };
            assert_eq!(d.side, expected);
        }
        assert_eq!(flow.pending_moves(), 100);
    }

    #[test]
    fn test_informed_scales_quantity() {
        let mut flow = model(|c| {
            c.probs.limit = 0.0;
            c.probs.market = 1.0;
            c.probs.cancel = 0.0;
            c.informed.p_informed = 1.0;
            c.informed.signal_tau = 0.0;
            c.informed.informed_qty_mult = 3.0;
            c.size = crate::config::SizeDist::Uniform { min: 2, max: 2 };
        });
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let d = flow.next(&mut rng, 0);
        assert_eq!(d.qty, Qty::from_lots(6));
    }

    #[test]
    fn test_fundamental_moves_come_due_in_order() {
        let mut flow = model(|c| {
            c.probs.limit = 0.0;
            c.probs.market = 1.0;
            c.probs.cancel = 0.0;
            c.informed.p_informed = 1.0;
            c.informed.signal_tau = 0.0;
            c.informed.info_horizon = 3;
        });
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        flow.next(&mut rng, 0);
        flow.next(&mut rng, 1);

        assert!(flow.take_due(1).is_empty());
        let due = flow.take_due(3);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].due, 3);
        assert_eq!(flow.take_due(10).len(), 1);
        assert_eq!(flow.pending_moves(), 0);
    }

    #[test]
    fn test_zero_p_informed_never_schedules() {
        let mut flow = model(|c| c.informed.p_informed = 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for t in 0..500 {
            let d = flow.next(&mut rng, t);
            assert!(!d.informed);
        }
        assert_eq!(flow.pending_moves(), 0);
    }
}
