//! Pricing policy: statistics in, bounded price out.
//!
//! # Model
//!
//! ```text
//! level  = (1 - w) * mean_cumulative + w * mean_window
//! cv     = stddev_cumulative / mean_cumulative
//! margin = clamp(base_margin + k * cv, margin_min, margin_max)
//! target = level * (1 + margin) + base_drift + trend offset + demand response
//! price  = clamp(clamp(target, last ± max_step), floor, ceiling)
//! ```
//!
//! A steady rival (low cv) gets a tight undercut; a volatile one widens the
//! margin as a hedge. `base_drift` is how far the adaptive base price has
//! moved from the anchor; it shifts every warm target.
//!
//! Rate limiting runs before bounding so the final price always honors the
//! hard floor and ceiling. `PricingAgent` refuses states whose previous price
//! lies outside the bounds, so bounding can only move the price toward it and
//! never breaks the step limit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::PricingConfig;
use super::state::PricingState;
use super::statistics::{batch_mean, OnlineStatistics};
use crate::errors::ColdStart;

/// Weight kept on the target when demand is volatile; the rest goes to the base price.
const VOLATILE_DEMAND_BLEND: f64 = 0.7;

/// Which branch produced the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Not enough rival history; anchor price returned
    ColdStart,
    /// Statistics-driven price
    Warm,
}

/// Output of a single decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Final bounded, rate-limited price
    pub price: f64,
    pub regime: Regime,
    /// Unconstrained target before rate limiting and bounding
    pub target: Option<f64>,
}

/// Deterministic pricing policy.
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    config: PricingConfig,
}

impl PricingPolicy {
    /// The config is assumed validated.
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Next price for `state`. Pure: same state, same decision.
    pub fn decide(&self, state: &PricingState) -> PolicyDecision {
        let target = match self.warm_target(state) {
            Ok(target) => target,
            Err(cold) => {
                debug!(
                    period = state.period,
                    required = cold.required,
                    available = cold.available,
                    price = self.config.anchor_price,
                    "Cold start, using anchor price"
                );
                return PolicyDecision {
                    price: self.config.anchor_price,
                    regime: Regime::ColdStart,
                    target: None,
                };
            }
        };

        let candidate = if target.is_finite() {
            target
        } else {
            state.last_own_price
        };
        let limited = self.rate_limit(candidate, state.last_own_price);
        let price = self.bound(limited);

        debug!(
            period = state.period,
            target,
            limited,
            price,
            last_price = state.last_own_price,
            base_drift = state.base_drift,
            "Warm pricing decision"
        );

        PolicyDecision {
            price,
            regime: Regime::Warm,
            target: Some(target),
        }
    }

    /// Unconstrained target. Fails with `ColdStart` until the rival warm-up is met.
    pub fn warm_target(&self, state: &PricingState) -> Result<f64, ColdStart> {
        let cfg = &self.config;
        let rival = &state.rival_price_stats;
        if rival.count() < cfg.warmup_periods {
            return Err(ColdStart {
                required: cfg.warmup_periods,
                available: rival.count(),
            });
        }

        let cumulative_mean = rival.mean()?;
        let stddev = rival.stddev()?;
        let window_mean = batch_mean(&state.rival_window()).unwrap_or(cumulative_mean);
        let level = (1.0 - cfg.recency_weight) * cumulative_mean + cfg.recency_weight * window_mean;

        let margin = self.margin(cumulative_mean, stddev);
        let mut target = level * (1.0 + margin);

        target += state.base_drift;
        target += cfg.trend_weight * state.signals.rival_trend;

        target = self.demand_response(target, &state.demand_stats, state.base_price(cfg));
        target += self.exploration_jitter(state);

        Ok(target)
    }

    /// Margin over the rival level, widening with rival volatility.
    pub fn margin(&self, rival_mean: f64, rival_stddev: f64) -> f64 {
        let cv = if rival_mean > 0.0 {
            rival_stddev / rival_mean
        } else {
            0.0
        };
        (self.config.base_margin + self.config.volatility_sensitivity * cv)
            .clamp(self.config.margin_min, self.config.margin_max)
    }

    fn demand_response(&self, target: f64, demand: &OnlineStatistics, base_price: f64) -> f64 {
        let cfg = &self.config;
        if demand.count() <= cfg.demand_warmup {
            return target;
        }
        let mut adjusted = target;
        if let Ok(mean) = demand.mean() {
            if mean > cfg.strong_demand_threshold {
                adjusted += cfg.strong_demand_premium;
            } else if mean < cfg.weak_demand_threshold {
                adjusted -= cfg.weak_demand_discount;
            }
        }
        if let Ok(stddev) = demand.stddev() {
            if stddev > cfg.demand_volatility_threshold {
                adjusted = VOLATILE_DEMAND_BLEND * adjusted
                    + (1.0 - VOLATILE_DEMAND_BLEND) * base_price;
            }
        }
        adjusted
    }

    /// Seeded jitter keyed on (seed, period). Zero unless exploration is
    /// enabled in config and the state carries a seed.
    fn exploration_jitter(&self, state: &PricingState) -> f64 {
        let exploration = &self.config.exploration;
        match state.exploration {
            Some(seeded) if exploration.enabled && exploration.amplitude > 0.0 => {
                let key = seeded.seed ^ state.period.wrapping_mul(0x9E37_79B9_7F4A_7C15);
                let mut rng = StdRng::seed_from_u64(key);
                rng.gen_range(-exploration.amplitude..=exploration.amplitude)
            }
            _ => 0.0,
        }
    }

    #[inline]
    fn rate_limit(&self, candidate: f64, last: f64) -> f64 {
        candidate.clamp(last - self.config.max_step, last + self.config.max_step)
    }

    #[inline]
    fn bound(&self, price: f64) -> f64 {
        price.clamp(self.config.price_floor, self.config.price_ceiling)
    }
}
