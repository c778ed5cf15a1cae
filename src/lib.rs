#![deny(unreachable_pub)]

//! Pricing agent for a two-seller repeated pricing game.
//!
//! The host calls the agent once per period with the previous state blob and
//! the latest market feedback; the agent returns the next price and a new
//! blob. No globals, no I/O: the blob is the only memory.
//!
//! ```
//! use duopoly_pricer::{Observation, PricingAgent, PricingConfig};
//!
//! let agent = PricingAgent::new(PricingConfig::default()).unwrap();
//! let first = agent.price(None, None).unwrap();
//! let next = agent
//!     .price(
//!         Some(first.state_blob.as_str()),
//!         Some(Observation::new(1, first.price, Some(9.5), 6.0)),
//!     )
//!     .unwrap();
//! assert!(next.price >= 1.0 && next.price <= 20.0);
//! ```

mod errors;
mod pricing;

pub use errors::{ColdStart, Error, InvalidObservation, ObservationField, Result};
pub use pricing::*;
