//! The per-period pricing call.
//!
//! ```text
//! prior blob ──decode──▶ PricingState ──record(obs)──▶ decide ──encode──▶ (price, blob)
//! ```
//!
//! The agent holds only immutable configuration; all game state travels in
//! the blob, so the call is a pure function of its inputs.

use tracing::{debug, info};

use super::config::PricingConfig;
use super::observation::Observation;
use super::policy::{PricingPolicy, Regime};
use super::state::{decode, encode, PricingState};
use crate::errors::{Error, InvalidObservation, Result};

/// Result of a typed pricing step.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingDecision {
    pub price: f64,
    pub regime: Regime,
    /// Updated state to pass to the next call
    pub state: PricingState,
    /// Inputs that were rejected and substituted this period
    pub rejected: Vec<InvalidObservation>,
}

/// Result of a blob-level pricing call.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResponse {
    pub price: f64,
    pub regime: Regime,
    /// Encoded state to pass to the next call
    pub state_blob: String,
    pub rejected: Vec<InvalidObservation>,
}

/// Pricing agent for one configuration. Holds no game state.
#[derive(Debug, Clone)]
pub struct PricingAgent {
    policy: PricingPolicy,
}

impl PricingAgent {
    /// Validate the configuration and build an agent.
    pub fn new(config: PricingConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        info!(
            capacity = config.history_capacity,
            warmup = config.warmup_periods,
            anchor = config.anchor_price,
            floor = config.price_floor,
            ceiling = config.price_ceiling,
            max_step = config.max_step,
            exploration = config.exploration.enabled,
            "Pricing agent configured"
        );
        Ok(Self {
            policy: PricingPolicy::new(config),
        })
    }

    pub fn config(&self) -> &PricingConfig {
        self.policy.config()
    }

    /// Empty state for a new game.
    pub fn new_state(&self) -> Result<PricingState> {
        PricingState::new(self.config())
    }

    /// Process one period on decoded state.
    pub fn step(&self, mut state: PricingState, observation: Option<Observation>) -> PricingDecision {
        let rejected = state.record(observation, self.config());
        let decision = self.policy.decide(&state);
        state.last_own_price = decision.price;

        PricingDecision {
            price: decision.price,
            regime: decision.regime,
            state,
            rejected,
        }
    }

    /// Process one period on an encoded state blob.
    ///
    /// `None` or an empty blob starts a new game. Any other blob that cannot
    /// be decoded fails with `StateCorrupt` rather than silently restarting.
    pub fn price(
        &self,
        prior: Option<&str>,
        observation: Option<Observation>,
    ) -> Result<PricingResponse> {
        let state = self.load(prior)?;
        let decision = self.step(state, observation);
        let state_blob = encode(&decision.state)?;

        debug!(
            period = decision.state.period,
            price = decision.price,
            regime = ?decision.regime,
            blob_len = state_blob.len(),
            "Priced period"
        );

        Ok(PricingResponse {
            price: decision.price,
            regime: decision.regime,
            state_blob,
            rejected: decision.rejected,
        })
    }

    fn load(&self, prior: Option<&str>) -> Result<PricingState> {
        let blob = match prior {
            Some(blob) if !blob.trim().is_empty() => blob,
            _ => {
                debug!("No prior state, starting new game");
                return self.new_state();
            }
        };

        let state = decode(blob)?;
        if state.history.capacity() != self.config().history_capacity {
            return Err(Error::state_corrupt(format!(
                "history capacity {} does not match configured {}",
                state.history.capacity(),
                self.config().history_capacity
            )));
        }
        // The step limit survives bounding only if the previous price is in bounds
        let (floor, ceiling) = (self.config().price_floor, self.config().price_ceiling);
        if !(floor..=ceiling).contains(&state.last_own_price) {
            return Err(Error::state_corrupt(format!(
                "last_own_price {} outside configured bounds [{floor}, {ceiling}]",
                state.last_own_price
            )));
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        let config = PricingConfig {
            price_floor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            PricingAgent::new(config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_first_call_without_state_or_feedback() {
        let agent = PricingAgent::new(PricingConfig::default()).unwrap();
        let resp = agent.price(None, None).unwrap();
        assert_eq!(resp.price, 10.0);
        assert_eq!(resp.regime, Regime::ColdStart);

        let state = decode(&resp.state_blob).unwrap();
        assert_eq!(state.period, 1);

        let resp = agent.price(Some(""), None).unwrap();
        assert_eq!(resp.price, 10.0);
    }

    #[test]
    fn test_corrupt_blob_is_surfaced() {
        let agent = PricingAgent::new(PricingConfig::default()).unwrap();
        let err = agent
            .price(Some("{\"broken\":"), Some(Observation::new(1, 10.0, Some(9.0), 3.0)))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_capacity_mismatch_is_corrupt() {
        let small = PricingAgent::new(PricingConfig {
            history_capacity: 5,
            ..Default::default()
        })
        .unwrap();
        let blob = small.price(None, None).unwrap().state_blob;

        let default = PricingAgent::new(PricingConfig::default()).unwrap();
        assert!(matches!(
            default.price(Some(blob.as_str()), None),
            Err(Error::StateCorrupt(_))
        ));
    }

    #[test]
    fn test_previous_price_outside_bounds_is_corrupt() {
        let wide = PricingAgent::new(PricingConfig::default()).unwrap();
        let mut state = wide.new_state().unwrap();
        state.last_own_price = 18.0;
        let blob = encode(&state).unwrap();

        let narrow = PricingAgent::new(PricingConfig {
            price_ceiling: 15.0,
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            narrow.price(Some(blob.as_str()), None),
            Err(Error::StateCorrupt(_))
        ));
        assert!(wide.price(Some(blob.as_str()), None).is_ok());
    }

    #[test]
    fn test_rejected_inputs_are_annotated_not_raised() {
        let agent = PricingAgent::new(PricingConfig::default()).unwrap();
        let resp = agent
            .price(None, Some(Observation::new(1, f64::NAN, Some(12.0), -1.0)))
            .unwrap();
        assert_eq!(resp.rejected.len(), 2);
        assert_eq!(resp.price, 10.0);
    }

    #[test]
    fn test_step_records_returned_price() {
        let agent = PricingAgent::new(PricingConfig::default()).unwrap();
        let mut state = agent.new_state().unwrap();
        for i in 0..6u64 {
            let d = agent.step(state, Some(Observation::new(i, 10.0, Some(14.0), 5.0)));
            assert_eq!(d.state.last_own_price, d.price);
            state = d.state;
        }
        assert_eq!(state.period, 6);
    }
}
