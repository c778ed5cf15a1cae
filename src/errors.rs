use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A statistic was requested before enough samples were seen.
///
/// Recoverable: the caller supplies its own fallback (the policy falls back
/// to the anchor price).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Cold start: need {required} samples, have {available}")]
pub struct ColdStart {
    pub required: u64,
    pub available: u64,
}

/// Observation field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationField {
    OwnPrice,
    RivalPrice,
    Demand,
}

impl ObservationField {
    /// Field name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ObservationField::OwnPrice => "own_price",
            ObservationField::RivalPrice => "rival_price",
            ObservationField::Demand => "demand",
        }
    }
}

impl fmt::Display for ObservationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An input reading that was rejected and replaced by the last known valid value.
///
/// Never raised to the harness as an `Err`; returned as an annotation alongside
/// the price so the caller can log it through its own mechanism.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[error("Invalid observation: {field} = {value}, substituted {substitute:?}")]
pub struct InvalidObservation {
    pub field: ObservationField,
    pub value: f64,
    pub substitute: Option<f64>,
}

/// Main crate error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Statistic requested on an accumulator with too few samples
    #[error(transparent)]
    ColdStart(#[from] ColdStart),

    /// Persisted state could not be decoded or failed its invariants.
    /// Fatal for the period: continuing on corrupted statistics is worse than failing.
    #[error("State corrupt: {0}")]
    StateCorrupt(String),

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a state corruption error
    pub fn state_corrupt(msg: impl Into<String>) -> Self {
        Error::StateCorrupt(msg.into())
    }

    /// Create a configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Whether the harness should treat this as fatal for the current period.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::StateCorrupt(_) | Error::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
