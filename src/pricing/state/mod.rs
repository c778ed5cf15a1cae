//! Pricing state carried between calls.
//!
//! The harness persists nothing but the encoded state blob, so everything the
//! agent learns lives in [`PricingState`]: the rolling window, the cumulative
//! accumulators, short-term signals, the adaptive base price and the
//! exploration seed.
//!
//! # Cumulative vs recent-window
//!
//! - `rival_price_stats`, `demand_stats`, `own_price_stats` are cumulative
//!   over the whole game and keep counting values the window has evicted.
//!   They drive volatility (margin width) and the demand regime.
//! - `history` holds the last C observations. The recent rival level and the
//!   trend signals are recomputed from it on demand; no second accumulator
//!   is kept for the window.

pub mod codec;

pub use codec::{decode, encode, SCHEMA_VERSION};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::PricingConfig;
use super::history::RollingHistory;
use super::observation::{LastValid, Observation};
use super::signals::Signals;
use super::statistics::{OnlineStatistics, StatsSnapshot};
use crate::errors::{InvalidObservation, ObservationField, Result};

/// Complete per-game state.
///
/// Owned by exactly one game; the caller serializes calls on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingState {
    /// Schema version for migrations
    pub schema_version: u32,
    /// Number of periods processed so far
    pub period: u64,
    /// Price returned by the previous call (anchor at game start)
    pub last_own_price: f64,
    /// Offset of the adaptive base price from the anchor. Starts at 0.0 and
    /// drifts with profit momentum and demand trend; anchor + drift stays
    /// inside the configured base price range.
    pub base_drift: f64,
    /// Recent window of observations
    pub history: RollingHistory,
    /// Cumulative rival price statistics
    pub rival_price_stats: OnlineStatistics,
    /// Cumulative demand statistics
    pub demand_stats: OnlineStatistics,
    /// Cumulative statistics of prices we actually charged
    pub own_price_stats: OnlineStatistics,
    /// Trend and profit momentum signals
    pub signals: Signals,
    /// Exploration generator state, present only when exploration is enabled
    pub exploration: Option<ExplorationState>,
}

/// Persisted exploration generator state.
///
/// Draws are keyed on (seed, period), so the seed alone reproduces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationState {
    pub seed: u64,
}

impl PricingState {
    /// Fresh state for a new game.
    pub fn new(config: &PricingConfig) -> Result<Self> {
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            period: 0,
            last_own_price: config.anchor_price,
            base_drift: 0.0,
            history: RollingHistory::new(config.history_capacity)?,
            rival_price_stats: OnlineStatistics::new(),
            demand_stats: OnlineStatistics::new(),
            own_price_stats: OnlineStatistics::new(),
            signals: Signals::default(),
            exploration: config.exploration.enabled.then_some(ExplorationState {
                seed: config.exploration.seed,
            }),
        })
    }

    /// Record one period's feedback.
    ///
    /// Invalid readings are substituted before storage and skipped by every
    /// accumulator. Once any demand has been seen, the base price drifts by
    /// the current signals. Returns the rejected readings.
    pub fn record(
        &mut self,
        observation: Option<Observation>,
        config: &PricingConfig,
    ) -> Vec<InvalidObservation> {
        self.period += 1;

        let Some(observation) = observation else {
            debug!(period = self.period, "No feedback this period");
            return Vec::new();
        };

        let sanitized = observation.sanitize(&self.last_valid(), &config.input_limits());
        let obs = sanitized.observation;
        self.history.push(obs);

        if let Some(rival) = sanitized.fresh_rival_price() {
            self.rival_price_stats.update(rival);
            self.signals.update_rival_trend(&self.rival_window());
        }

        let own_fresh = sanitized.is_fresh(ObservationField::OwnPrice);
        let demand_fresh = sanitized.is_fresh(ObservationField::Demand);
        if own_fresh {
            self.own_price_stats.update(obs.own_price);
        }
        if demand_fresh {
            self.demand_stats.update(obs.demand);
            self.signals.update_demand_trend(&self.demand_window());
        }
        if own_fresh && demand_fresh {
            self.signals
                .record_profit(obs.profit(config.unit_cost), config.profit_momentum_alpha);
        }
        if self.demand_stats.count() > 0 {
            self.drift_base_price(config);
        }

        debug!(
            period = self.period,
            reported_period = obs.period,
            own_price = obs.own_price,
            rival_price = ?obs.rival_price,
            demand = obs.demand,
            base_drift = self.base_drift,
            rejected = sanitized.rejected.len(),
            window = self.history.size(),
            "Recorded observation"
        );

        sanitized.rejected
    }

    /// Adaptive base price: anchor plus accumulated drift.
    pub fn base_price(&self, config: &PricingConfig) -> f64 {
        config.anchor_price + self.base_drift
    }

    fn drift_base_price(&mut self, config: &PricingConfig) {
        let step = config.profit_momentum_weight * self.signals.profit_momentum
            + config.demand_trend_weight * self.signals.demand_trend;
        self.base_drift = (self.base_drift + step).clamp(
            config.base_price_min - config.anchor_price,
            config.base_price_max - config.anchor_price,
        );
    }

    /// Substitutes for rejected readings, taken from the newest stored values.
    fn last_valid(&self) -> LastValid {
        let latest = self.history.latest();
        LastValid {
            own_price: latest.map_or(self.last_own_price, |o| o.own_price),
            rival_price: self.rival_window().last().copied(),
            demand: latest.map(|o| o.demand),
        }
    }

    /// Known rival prices in the window, oldest to newest.
    pub fn rival_window(&self) -> Vec<f64> {
        self.history
            .to_sequence()
            .iter()
            .filter_map(|o| o.rival_price)
            .collect()
    }

    /// Demands in the window, oldest to newest.
    pub fn demand_window(&self) -> Vec<f64> {
        self.history.to_sequence().iter().map(|o| o.demand).collect()
    }

    /// Read-only view for simulators and logging. Not used by pricing.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            period: self.period,
            last_own_price: self.last_own_price,
            base_drift: self.base_drift,
            window_size: self.history.size(),
            window_capacity: self.history.capacity(),
            rival_price: self.rival_price_stats.snapshot(),
            demand: self.demand_stats.snapshot(),
            own_price: self.own_price_stats.snapshot(),
            rival_trend: self.signals.rival_trend,
            demand_trend: self.signals.demand_trend,
            profit_momentum: self.signals.profit_momentum,
        }
    }
}

/// Diagnostic snapshot of a pricing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub period: u64,
    pub last_own_price: f64,
    /// Base price minus anchor
    pub base_drift: f64,
    pub window_size: usize,
    pub window_capacity: usize,
    pub rival_price: StatsSnapshot,
    pub demand: StatsSnapshot,
    pub own_price: StatsSnapshot,
    pub rival_trend: f64,
    pub demand_trend: f64,
    pub profit_momentum: f64,
}
