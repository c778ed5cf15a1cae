//! Duopoly pricing agent.
//!
//! Components, leaf-first:
//! - **Observation**: one period's facts, sanitized before storage
//! - **RollingHistory**: fixed-capacity ring of recent observations
//! - **OnlineStatistics**: cumulative Welford accumulators, O(1) per update
//! - **Signals**: short-term trend and profit momentum
//! - **PricingPolicy**: statistics to a bounded, rate-limited price
//! - **PricingState**: versioned bundle carried between calls as a blob
//! - **PricingAgent**: the per-period call tying these together

mod agent;
mod config;
mod history;
mod observation;
mod policy;
mod signals;
mod state;
mod statistics;


pub use agent::*;
pub use config::*;
pub use history::*;
pub use observation::*;
pub use policy::*;
pub use signals::*;
pub use state::*;
pub use statistics::*;
