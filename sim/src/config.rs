//! Simulation configuration
//!
//! All knobs for a run, validated once at construction. Validation failures
//! are the only fatal errors in the system; everything after the first event
//! is recoverable and recorded in diagnostics instead.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ConfigError;

/// Top-level simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seeds the single PRNG shared by all stochastic draws
    pub seed: u64,
    /// Total exogenous events to simulate
    pub n_events: u64,
    /// Display value of one tick (reporting only)
    pub tick_size: Decimal,
    /// Display value of one lot (reporting only)
    pub lot_size: Decimal,
    /// Initial mid and fundamental, in ticks
    pub base_price: i64,
    /// Passive levels seeded on each side before event 0
    pub initial_depth_levels: i64,
    /// Quantity per seeded level
    pub initial_depth_qty: u64,
    /// Markout horizon in events
    pub markout_horizon: u64,
    pub mm: MakerConfig,
    pub flow: FlowConfig,
}

/// Market-maker quoting policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Refresh cadence in events; the only latency knob
    pub refresh_k: u64,
    /// Base half-spread in ticks
    pub half_spread: i64,
    /// Half-spread widening per unit of absolute inventory
    pub inventory_widen_alpha: f64,
    /// Quote skew per unit of signed inventory
    pub skew_beta: f64,
    /// Constant size of each quote
    pub quote_size: u64,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            refresh_k: 10,
            half_spread: 1,
            inventory_widen_alpha: 0.0,
            skew_beta: 0.0,
            quote_size: 3,
        }
    }
}

/// Exogenous flow process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub probs: FlowProbs,
    /// Baseline probability that an exogenous order is buy-side
    pub p_buy: f64,
    /// Optional piecewise override of `p_buy` by event index
    pub imbalance_schedule: Vec<ImbalancePhase>,
    /// Probability that a flow limit is priced through the opposite best
    pub marketable_limit_prob: f64,
    pub price_offset: OffsetDist,
    pub size: SizeDist,
    pub informed: InformedConfig,
}

impl FlowConfig {
    /// Effective buy probability at event index `t`
    pub fn p_buy_at(&self, t: u64) -> f64 {
        self.imbalance_schedule
            .iter()
            .rev()
            .find(|phase| phase.from_event <= t)
            .map(|phase| phase.p_buy)
            .unwrap_or(self.p_buy)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            probs: FlowProbs::default(),
            p_buy: 0.5,
            imbalance_schedule: Vec::new(),
            marketable_limit_prob: 0.1,
            price_offset: OffsetDist::Uniform { min: 1, max: 4 },
            size: SizeDist::Uniform { min: 1, max: 6 },
            informed: InformedConfig::default(),
        }
    }
}

/// Event-type mix; must sum to 1
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlowProbs {
    pub limit: f64,
    pub market: f64,
    pub cancel: f64,
}

impl FlowProbs {
    pub fn sum(&self) -> f64 {
        self.limit + self.market + self.cancel
    }
}

impl Default for FlowProbs {
    fn default() -> Self {
        Self {
            limit: 0.55,
            market: 0.27,
            cancel: 0.18,
        }
    }
}

/// One phase of the imbalance schedule: from `from_event` onward, exogenous
/// orders are buy-side with probability `p_buy`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImbalancePhase {
    pub from_event: u64,
    pub p_buy: f64,
}

/// Informed-cohort and fundamental-process parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InformedConfig {
    /// Probability that a market order's side is forced by the signal
    pub p_informed: f64,
    /// Signal magnitude below which informed orders fall back to noise
    pub signal_tau: f64,
    /// Mean-reversion rate of the latent signal, in (0, 1]
    pub signal_mean_reversion: f64,
    /// Events between an informed order and its fundamental move
    pub info_horizon: u64,
    /// Fundamental jump per informed order, in ticks
    pub toxic_jump_ticks: i64,
    /// Informed orders scale their sampled size by this factor
    pub informed_qty_mult: f64,
    /// Per-event probability of one adaptation step toward the fundamental;
    /// zero selects the v1 immediate-impact layer
    pub fundamental_beta: f64,
    /// Per-step size cap for adaptation aggressors, per tick of gap
    pub adapt_max_qty: u64,
}

impl Default for InformedConfig {
    fn default() -> Self {
        Self {
            p_informed: 0.0,
            signal_tau: 0.8,
            signal_mean_reversion: 0.1,
            info_horizon: 5,
            toxic_jump_ticks: 1,
            informed_qty_mult: 1.8,
            fundamental_beta: 0.0,
            adapt_max_qty: 4,
        }
    }
}

/// Discrete order-size distribution, in lots
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizeDist {
    Uniform { min: u64, max: u64 },
    Geometric { p: f64, cap: u64 },
}

impl SizeDist {
    /// Draw one size; consumes exactly one variate slot
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> u64 {
        match self {
            SizeDist::Uniform { min, max } => rng.gen_range(*min..=*max),
            SizeDist::Geometric { p, cap } => {
                let u: f64 = rng.gen();
                let k = ((1.0 - u).ln() / (1.0 - p).ln()).floor() as u64 + 1;
                k.min(*cap)
            }
        }
    }
}

/// Discrete price-offset distribution, in ticks from the mid
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OffsetDist {
    Uniform { min: i64, max: i64 },
}

impl OffsetDist {
    /// Draw one offset; consumes exactly one variate slot
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> i64 {
        match self {
            OffsetDist::Uniform { min, max } => rng.gen_range(*min..=*max),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            n_events: 5_000,
            tick_size: Decimal::new(1, 2),
            lot_size: Decimal::ONE,
            base_price: 10_000,
            initial_depth_levels: 3,
            initial_depth_qty: 20,
            markout_horizon: 20,
            mm: MakerConfig::default(),
            flow: FlowConfig::default(),
        }
    }
}

impl SimConfig {
    /// Validate every knob; called before the first event
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.flow.probs.sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ConfigError::FlowProbs { sum });
        }
        for (field, value) in [
            ("flow_probs.limit", self.flow.probs.limit),
            ("flow_probs.market", self.flow.probs.market),
            ("flow_probs.cancel", self.flow.probs.cancel),
            ("p_buy", self.flow.p_buy),
            ("marketable_limit_prob", self.flow.marketable_limit_prob),
            ("p_informed", self.flow.informed.p_informed),
            ("fundamental_beta", self.flow.informed.fundamental_beta),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityRange { field, value });
            }
        }
        for phase in &self.flow.imbalance_schedule {
            if !(0.0..=1.0).contains(&phase.p_buy) {
                return Err(ConfigError::ProbabilityRange {
                    field: "imbalance_schedule.p_buy",
                    value: phase.p_buy,
                });
            }
        }
        if self.mm.refresh_k == 0 {
            return Err(ConfigError::RefreshCadence);
        }
        if self.mm.quote_size == 0 {
            return Err(ConfigError::NonPositive { field: "mm_quote_size" });
        }
        if self.mm.half_spread <= 0 {
            return Err(ConfigError::NonPositive { field: "mm_half_spread" });
        }
        if self.n_events == 0 {
            return Err(ConfigError::NonPositive { field: "n_events" });
        }
        if self.tick_size <= Decimal::ZERO {
            return Err(ConfigError::NonPositive { field: "tick_size" });
        }
        if self.lot_size <= Decimal::ZERO {
            return Err(ConfigError::NonPositive { field: "lot_size" });
        }
        if self.base_price <= self.initial_depth_levels {
            return Err(ConfigError::NonPositive { field: "base_price" });
        }
        if self.flow.informed.info_horizon == 0 {
            return Err(ConfigError::NonPositive { field: "info_horizon" });
        }
        if self.flow.informed.toxic_jump_ticks <= 0 {
            return Err(ConfigError::NonPositive { field: "toxic_jump_ticks" });
        }
        if self.flow.informed.signal_mean_reversion <= 0.0
            || self.flow.informed.signal_mean_reversion > 1.0
        {
            return Err(ConfigError::ProbabilityRange {
                field: "signal_mean_reversion",
                value: self.flow.informed.signal_mean_reversion,
            });
        }
        if self.markout_horizon == 0 {
            return Err(ConfigError::NonPositive { field: "markout_horizon" });
        }
        match self.flow.size {
            SizeDist::Uniform { min, max } => {
                if min == 0 {
                    return Err(ConfigError::NonPositive { field: "size_dist.min" });
                }
                if min > max {
                    return Err(ConfigError::EmptyRange {
                        field: "size_dist",
                        min: min as i64,
                        max: max as i64,
                    });
                }
            }
            SizeDist::Geometric { p, cap } => {
                if !(p > 0.0 && p < 1.0) {
                    return Err(ConfigError::ProbabilityRange {
                        field: "size_dist.p",
                        value: p,
                    });
                }
                if cap == 0 {
                    return Err(ConfigError::NonPositive { field: "size_dist.cap" });
                }
            }
        }
        match self.flow.price_offset {
            OffsetDist::Uniform { min, max } => {
                if min <= 0 {
                    return Err(ConfigError::NonPositive { field: "price_offset_dist.min" });
                }
                if min > max {
                    return Err(ConfigError::EmptyRange {
                        field: "price_offset_dist",
                        min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }
}
