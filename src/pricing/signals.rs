//! Short-term signals carried in pricing state.
//!
//! Trend signals are stepped, bounded scores in [-1, 1] derived from the
//! recent window: each fresh reading compares the newest value with the one
//! two readings back. Profit momentum is an EMA of period-over-period changes
//! in realized profit.

use serde::{Deserialize, Serialize};

/// Step applied to a trend score per confirming reading
const TREND_STEP: f64 = 0.2;
/// Decay applied to a trend score on a flat reading
const TREND_DECAY: f64 = 0.8;
/// Readings compared for a trend decision
const TREND_SPAN: usize = 3;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signals {
    /// Rival price trend in [-1, 1]
    pub rival_trend: f64,
    /// Demand trend in [-1, 1]
    pub demand_trend: f64,
    /// EMA of profit change
    pub profit_momentum: f64,
    /// Profit realized in the last period with a valid price and demand
    pub last_profit: Option<f64>,
}

impl Signals {
    /// Update the rival trend from the rival prices in the window (oldest to newest).
    pub fn update_rival_trend(&mut self, window: &[f64]) {
        self.rival_trend = step_trend(self.rival_trend, window);
    }

    /// Update the demand trend from the demands in the window (oldest to newest).
    pub fn update_demand_trend(&mut self, window: &[f64]) {
        self.demand_trend = step_trend(self.demand_trend, window);
    }

    /// Record one period's realized profit.
    pub fn record_profit(&mut self, profit: f64, alpha: f64) {
        if let Some(prev) = self.last_profit {
            let change = profit - prev;
            self.profit_momentum = alpha * change + (1.0 - alpha) * self.profit_momentum;
        }
        self.last_profit = Some(profit);
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.rival_trend.is_finite()
            && self.demand_trend.is_finite()
            && self.profit_momentum.is_finite()
            && self.last_profit.map_or(true, f64::is_finite)
            && self.rival_trend.abs() <= 1.0
            && self.demand_trend.abs() <= 1.0
    }
}

fn step_trend(current: f64, window: &[f64]) -> f64 {
    if window.len() < TREND_SPAN {
        return current;
    }
    let recent = &window[window.len() - TREND_SPAN..];
    let (first, last) = (recent[0], recent[TREND_SPAN - 1]);
    if last > first {
        (current + TREND_STEP).min(1.0)
    } else if last < first {
        (current - TREND_STEP).max(-1.0)
    } else {
        current * TREND_DECAY
    }
}
