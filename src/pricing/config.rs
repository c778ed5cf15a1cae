//! Pricing agent configuration.
//!
//! Fixed at construction and never mutated at runtime. Call
//! [`PricingConfig::validate`] (done by `PricingAgent::new`) before use.

use serde::{Deserialize, Serialize};

use super::observation::InputLimits;

/// Configuration for the pricing agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    // === History ===
    /// Rolling history capacity C (observations kept in the window)
    pub history_capacity: usize,

    // === Cold start ===
    /// Rival-price samples required before statistics drive the price.
    /// Must be >= 2 so sample variance is defined.
    pub warmup_periods: u64,
    /// Price returned verbatim during cold start
    pub anchor_price: f64,
    /// Unit production cost, used for realized profit
    pub unit_cost: f64,

    // === Input limits ===
    /// Reported prices above this are rejected as out of range
    pub max_input_price: f64,
    /// Reported demand above this is rejected as out of range
    pub max_demand: f64,

    // === Margin over rival level ===
    /// Margin at zero rival volatility (negative = undercut)
    pub base_margin: f64,
    /// Margin added per unit of rival coefficient of variation
    pub volatility_sensitivity: f64,
    /// Lower clamp on margin
    pub margin_min: f64,
    /// Upper clamp on margin
    pub margin_max: f64,
    /// Weight of the recent-window rival mean against the cumulative mean.
    /// 0.0 = cumulative only, 1.0 = window only.
    pub recency_weight: f64,

    // === Short-term signals ===
    /// Price offset per unit of rival trend signal
    pub trend_weight: f64,
    /// EMA smoothing for profit momentum
    pub profit_momentum_alpha: f64,

    // === Adaptive base price ===
    /// Base price drift per period, per unit of demand trend
    pub demand_trend_weight: f64,
    /// Base price drift per period, per unit of profit momentum
    pub profit_momentum_weight: f64,
    /// Lower clamp on the drifting base price
    pub base_price_min: f64,
    /// Upper clamp on the drifting base price
    pub base_price_max: f64,

    // === Demand response ===
    /// Demand samples required before the demand adjustments apply
    pub demand_warmup: u64,
    /// Mean demand above which the premium applies
    pub strong_demand_threshold: f64,
    pub strong_demand_premium: f64,
    /// Mean demand below which the discount applies
    pub weak_demand_threshold: f64,
    pub weak_demand_discount: f64,
    /// Demand stddev above which the price is pulled toward the base price
    pub demand_volatility_threshold: f64,

    // === Hard constraints ===
    /// Max absolute change from the previous price
    pub max_step: f64,
    pub price_floor: f64,
    pub price_ceiling: f64,

    /// Optional seeded exploration
    pub exploration: ExplorationConfig,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            history_capacity: 30,

            warmup_periods: 3,
            anchor_price: 10.0,
            unit_cost: 5.0,

            max_input_price: 1_000.0,
            max_demand: 1_000_000.0,

            // Slight undercut when the rival is steady; hedge upward when it is noisy
            base_margin: -0.03,
            volatility_sensitivity: 0.5,
            margin_min: -0.10,
            margin_max: 0.15,
            recency_weight: 0.5,

            trend_weight: 0.5,
            profit_momentum_alpha: 0.1,

            demand_trend_weight: 0.01,
            profit_momentum_weight: 0.02,
            base_price_min: 6.0,
            base_price_max: 15.0,

            demand_warmup: 5,
            strong_demand_threshold: 6.0,
            strong_demand_premium: 0.3,
            weak_demand_threshold: 3.0,
            weak_demand_discount: 0.2,
            demand_volatility_threshold: 3.0,

            max_step: 1.0,
            price_floor: 1.0,
            price_ceiling: 20.0,

            exploration: ExplorationConfig::default(),
        }
    }
}

impl PricingConfig {
    /// Validate invariants that would make the policy misbehave.
    ///
    /// Returns a descriptive error for the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.history_capacity == 0 {
            return Err("history_capacity must be > 0".to_string());
        }
        if self.warmup_periods < 2 {
            return Err(format!(
                "warmup_periods must be >= 2 (variance needs two samples), got {}",
                self.warmup_periods
            ));
        }
        let finite = [
            ("anchor_price", self.anchor_price),
            ("unit_cost", self.unit_cost),
            ("max_input_price", self.max_input_price),
            ("max_demand", self.max_demand),
            ("base_margin", self.base_margin),
            ("volatility_sensitivity", self.volatility_sensitivity),
            ("margin_min", self.margin_min),
            ("margin_max", self.margin_max),
            ("recency_weight", self.recency_weight),
            ("trend_weight", self.trend_weight),
            ("demand_trend_weight", self.demand_trend_weight),
            ("profit_momentum_weight", self.profit_momentum_weight),
            ("profit_momentum_alpha", self.profit_momentum_alpha),
            ("base_price_min", self.base_price_min),
            ("base_price_max", self.base_price_max),
            ("strong_demand_threshold", self.strong_demand_threshold),
            ("strong_demand_premium", self.strong_demand_premium),
            ("weak_demand_threshold", self.weak_demand_threshold),
            ("weak_demand_discount", self.weak_demand_discount),
            ("demand_volatility_threshold", self.demand_volatility_threshold),
            ("max_step", self.max_step),
            ("price_floor", self.price_floor),
            ("price_ceiling", self.price_ceiling),
            ("exploration.amplitude", self.exploration.amplitude),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} must be finite, got {value}"));
        }
        if self.price_floor <= 0.0 {
            return Err(format!(
                "price_floor must be > 0.0, got {}",
                self.price_floor
            ));
        }
        if self.price_floor > self.price_ceiling {
            return Err(format!(
                "price_floor ({}) must be <= price_ceiling ({})",
                self.price_floor, self.price_ceiling
            ));
        }
        if self.anchor_price < self.price_floor || self.anchor_price > self.price_ceiling {
            return Err(format!(
                "anchor_price {} outside [{}, {}]",
                self.anchor_price, self.price_floor, self.price_ceiling
            ));
        }
        if self.base_price_min > self.base_price_max {
            return Err(format!(
                "base_price_min ({}) must be <= base_price_max ({})",
                self.base_price_min, self.base_price_max
            ));
        }
        if self.anchor_price < self.base_price_min || self.anchor_price > self.base_price_max {
            return Err(format!(
                "anchor_price {} outside base price range [{}, {}]",
                self.anchor_price, self.base_price_min, self.base_price_max
            ));
        }
        if self.max_input_price < self.price_ceiling {
            return Err(format!(
                "max_input_price ({}) must be >= price_ceiling ({})",
                self.max_input_price, self.price_ceiling
            ));
        }
        if self.max_demand <= 0.0 {
            return Err(format!("max_demand must be > 0.0, got {}", self.max_demand));
        }
        if self.max_step <= 0.0 {
            return Err(format!("max_step must be > 0.0, got {}", self.max_step));
        }
        if self.margin_min > self.margin_max {
            return Err(format!(
                "margin_min ({}) must be <= margin_max ({})",
                self.margin_min, self.margin_max
            ));
        }
        if self.margin_min <= -1.0 {
            return Err(format!(
                "margin_min must be > -1.0 (price would go non-positive), got {}",
                self.margin_min
            ));
        }
        if !(0.0..=1.0).contains(&self.recency_weight) {
            return Err(format!(
                "recency_weight must be in [0.0, 1.0], got {}",
                self.recency_weight
            ));
        }
        if !(self.profit_momentum_alpha > 0.0 && self.profit_momentum_alpha <= 1.0) {
            return Err(format!(
                "profit_momentum_alpha must be in (0.0, 1.0], got {}",
                self.profit_momentum_alpha
            ));
        }
        if self.exploration.amplitude < 0.0 {
            return Err(format!(
                "exploration.amplitude must be >= 0.0, got {}",
                self.exploration.amplitude
            ));
        }
        Ok(())
    }

    pub fn input_limits(&self) -> InputLimits {
        InputLimits {
            max_price: self.max_input_price,
            max_demand: self.max_demand,
        }
    }
}

/// Seeded price exploration.
///
/// Off by default. When on, the generator seed is stored in the pricing state
/// so replaying the same state and inputs reproduces the same jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    pub enabled: bool,
    /// Jitter is uniform in [-amplitude, amplitude]
    pub amplitude: f64,
    /// Seed written into new game states
    pub seed: u64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            amplitude: 0.25,
            seed: 0x5eed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(PricingConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let config = PricingConfig {
            price_floor: 15.0,
            price_ceiling: 5.0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("price_floor"));
    }

    #[test]
    fn test_rejects_anchor_outside_bounds() {
        let config = PricingConfig {
            anchor_price: 50.0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("anchor_price"));
    }

    #[test]
    fn test_rejects_short_warmup_and_zero_capacity() {
        let config = PricingConfig {
            warmup_periods: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PricingConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_anchor_outside_base_range() {
        let config = PricingConfig {
            anchor_price: 18.0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("base price range"));

        let config = PricingConfig {
            base_price_min: 12.0,
            base_price_max: 8.0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("base_price_min"));
    }

    #[test]
    fn test_rejects_input_limits_below_ceiling() {
        let config = PricingConfig {
            max_input_price: 15.0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("max_input_price"));

        let config = PricingConfig {
            max_demand: 0.0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("max_demand"));
    }

    #[test]
    fn test_rejects_non_finite() {
        let config = PricingConfig {
            max_step: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("max_step"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PricingConfig =
            serde_json::from_str(r#"{"anchor_price": 12.0, "max_step": 0.5}"#).expect("parse");
        assert_eq!(config.anchor_price, 12.0);
        assert_eq!(config.max_step, 0.5);
        assert_eq!(config.history_capacity, 30);
        assert!(config.validate().is_ok());
    }
}
