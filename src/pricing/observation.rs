//! Per-period observations and input sanitization.
//!
//! A reading that fails validation is replaced by the last known valid value
//! before it is stored, and is flagged so the statistics layer skips it. A
//! poisoned price or demand can therefore never reach the cumulative
//! accumulators.
//!
//! Valid ranges:
//! - own price in (0, max_price]
//! - rival price in [0, max_price], or unknown
//! - demand in [0, max_demand]
//!
//! The upper limits keep every accumulator finite; a finite but huge reading
//! would otherwise overflow the Welford sum of squares.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{InvalidObservation, ObservationField};

/// One period's recorded facts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Selling period reported by the harness
    pub period: u64,
    /// Price we actually charged (> 0)
    pub own_price: f64,
    /// Rival's price, `None` when unobserved
    pub rival_price: Option<f64>,
    /// Realized demand (>= 0)
    pub demand: f64,
}

impl Observation {
    pub fn new(period: u64, own_price: f64, rival_price: Option<f64>, demand: f64) -> Self {
        Self {
            period,
            own_price,
            rival_price,
            demand,
        }
    }

    /// Realized profit for this period at the given unit cost.
    pub fn profit(&self, unit_cost: f64) -> f64 {
        (self.own_price - unit_cost) * self.demand
    }

    /// Validate every field, substituting `fallback` values for rejected ones.
    pub fn sanitize(self, fallback: &LastValid, limits: &InputLimits) -> Sanitized {
        let mut rejected = Vec::new();
        let mut observation = self;

        if !(self.own_price > 0.0 && self.own_price <= limits.max_price) {
            observation.own_price = fallback.own_price;
            rejected.push(InvalidObservation {
                field: ObservationField::OwnPrice,
                value: self.own_price,
                substitute: Some(fallback.own_price),
            });
        }

        if let Some(rival) = self.rival_price {
            if !(rival >= 0.0 && rival <= limits.max_price) {
                observation.rival_price = fallback.rival_price;
                rejected.push(InvalidObservation {
                    field: ObservationField::RivalPrice,
                    value: rival,
                    substitute: fallback.rival_price,
                });
            }
        }

        if !(self.demand >= 0.0 && self.demand <= limits.max_demand) {
            let substitute = fallback.demand.unwrap_or(0.0);
            observation.demand = substitute;
            rejected.push(InvalidObservation {
                field: ObservationField::Demand,
                value: self.demand,
                substitute: Some(substitute),
            });
        }

        for r in &rejected {
            warn!(
                period = self.period,
                field = r.field.name(),
                value = r.value,
                substitute = ?r.substitute,
                "Rejected invalid observation"
            );
        }

        Sanitized {
            observation,
            rejected,
        }
    }
}

/// Upper limits on accepted readings. NaN fails every comparison and is
/// rejected along with the out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputLimits {
    pub max_price: f64,
    pub max_demand: f64,
}

/// Last known valid readings, used as substitutes for rejected inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastValid {
    pub own_price: f64,
    pub rival_price: Option<f64>,
    pub demand: Option<f64>,
}

/// An observation after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    /// Observation with rejected fields substituted
    pub observation: Observation,
    /// Fields that were rejected, in field order
    pub rejected: Vec<InvalidObservation>,
}

impl Sanitized {
    /// Whether the given field arrived valid and may feed statistics.
    pub fn is_fresh(&self, field: ObservationField) -> bool {
        !self.rejected.iter().any(|r| r.field == field)
    }

    /// Rival price suitable for the statistics layer.
    pub fn fresh_rival_price(&self) -> Option<f64> {
        if self.is_fresh(ObservationField::RivalPrice) {
            self.observation.rival_price
        } else {
            None
        }
    }
}
