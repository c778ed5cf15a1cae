//! State blob encoding.
//!
//! Compact JSON with a top-level `schema_version`. Floats round-trip exactly
//! (serde_json `float_roundtrip`), so `decode(encode(s)) == s`.
//!
//! Version policy:
//! - `3`: current layout.
//! - `2`: no `base_drift`. Migrated with zero drift, which prices exactly as
//!   version 2 did.
//! - `1`: legacy layout without `own_price_stats`, `signals`, `exploration`
//!   and `base_drift`. Migrated by filling empty accumulators, neutral signals,
//!   zero drift and no exploration; the window and rival/demand accumulators
//!   are kept.
//! - anything else, or no version at all: `StateCorrupt`. A blob that cannot
//!   be read is never replaced by a fresh state.
//!
//! The same invariants are checked on both sides: `encode` refuses to write a
//! state that `decode` would reject.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{ExplorationState, PricingState};
use crate::errors::{Error, Result};
use crate::pricing::history::RollingHistory;
use crate::pricing::signals::Signals;
use crate::pricing::statistics::OnlineStatistics;

pub const SCHEMA_VERSION: u32 = 3;

/// Serialize a state into an opaque blob.
pub fn encode(state: &PricingState) -> Result<String> {
    check_invariants(state)?;
    serde_json::to_string(state).map_err(|e| Error::state_corrupt(format!("JSON serialize: {e}")))
}

/// Deserialize a blob, migrating older schema versions.
pub fn decode(blob: &str) -> Result<PricingState> {
    let value: Value = serde_json::from_str(blob)
        .map_err(|e| Error::state_corrupt(format!("JSON deserialize: {e}")))?;

    let version = value
        .get("schema_version")
        .ok_or_else(|| Error::state_corrupt("missing schema_version"))?
        .as_u64()
        .ok_or_else(|| Error::state_corrupt("schema_version is not an unsigned integer"))?;

    let state = match version {
        3 => serde_json::from_value::<PricingState>(value)
            .map_err(|e| Error::state_corrupt(format!("v3 layout: {e}")))?,
        2 => {
            let legacy = serde_json::from_value::<StateV2>(value)
                .map_err(|e| Error::state_corrupt(format!("v2 layout: {e}")))?;
            warn!(
                period = legacy.period,
                from = 2,
                to = SCHEMA_VERSION,
                "Migrating pricing state"
            );
            legacy.migrate()
        }
        1 => {
            let legacy = serde_json::from_value::<StateV1>(value)
                .map_err(|e| Error::state_corrupt(format!("v1 layout: {e}")))?;
            warn!(
                period = legacy.period,
                from = 1,
                to = SCHEMA_VERSION,
                "Migrating pricing state"
            );
            legacy.migrate()
        }
        other => {
            return Err(Error::state_corrupt(format!(
                "unsupported schema_version {other} (current {SCHEMA_VERSION})"
            )))
        }
    };

    check_invariants(&state)?;
    Ok(state)
}

fn check_invariants(state: &PricingState) -> Result<()> {
    if !(state.last_own_price.is_finite() && state.last_own_price > 0.0) {
        return Err(Error::state_corrupt(format!(
            "last_own_price {} is not a positive finite price",
            state.last_own_price
        )));
    }
    let accumulators = [
        ("rival_price_stats", &state.rival_price_stats),
        ("demand_stats", &state.demand_stats),
        ("own_price_stats", &state.own_price_stats),
    ];
    for (name, stats) in accumulators {
        if !stats.is_consistent() {
            return Err(Error::state_corrupt(format!("{name} inconsistent")));
        }
    }
    for (name, count) in [
        ("rival_price_stats", state.rival_price_stats.count()),
        ("demand_stats", state.demand_stats.count()),
        ("own_price_stats", state.own_price_stats.count()),
        ("history", state.history.size() as u64),
    ] {
        // At most one sample per processed period
        if count > state.period {
            return Err(Error::state_corrupt(format!(
                "{name} holds {count} samples after {} periods",
                state.period
            )));
        }
    }
    if !state.signals.is_consistent() {
        return Err(Error::state_corrupt("signals out of range"));
    }
    if !state.base_drift.is_finite() {
        return Err(Error::state_corrupt(format!(
            "base_drift {} is not finite",
            state.base_drift
        )));
    }
    Ok(())
}

/// Layout written by schema version 2.
#[derive(Deserialize)]
struct StateV2 {
    period: u64,
    last_own_price: f64,
    history: RollingHistory,
    rival_price_stats: OnlineStatistics,
    demand_stats: OnlineStatistics,
    own_price_stats: OnlineStatistics,
    signals: Signals,
    exploration: Option<ExplorationState>,
}

impl StateV2 {
    fn migrate(self) -> PricingState {
        PricingState {
            schema_version: SCHEMA_VERSION,
            period: self.period,
            last_own_price: self.last_own_price,
            base_drift: 0.0,
            history: self.history,
            rival_price_stats: self.rival_price_stats,
            demand_stats: self.demand_stats,
            own_price_stats: self.own_price_stats,
            signals: self.signals,
            exploration: self.exploration,
        }
    }
}

/// Layout written by schema version 1.
#[derive(Deserialize)]
struct StateV1 {
    period: u64,
    last_own_price: f64,
    history: RollingHistory,
    rival_price_stats: OnlineStatistics,
    demand_stats: OnlineStatistics,
}

impl StateV1 {
    fn migrate(self) -> PricingState {
        PricingState {
            schema_version: SCHEMA_VERSION,
            period: self.period,
            last_own_price: self.last_own_price,
            base_drift: 0.0,
            history: self.history,
            rival_price_stats: self.rival_price_stats,
            demand_stats: self.demand_stats,
            own_price_stats: OnlineStatistics::new(),
            signals: Signals::default(),
            exploration: None,
        }
    }
}
