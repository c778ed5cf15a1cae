//! Online statistics using Welford's algorithm.
//!
//! Each update is O(1) and never revisits earlier values, so accumulators
//! stay exact over arbitrarily long games. Accumulators are cumulative: there
//! is no removal, and they keep counting values the rolling history has
//! already evicted.
//!
//! Statistics that are undefined for the current sample count return
//! [`ColdStart`] instead of a numeric sentinel, so callers cannot mistake
//! "unknown" for zero.

use serde::{Deserialize, Serialize};

use crate::errors::ColdStart;

/// Incremental mean/variance/min/max accumulator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OnlineStatistics {
    /// Observation count
    count: u64,
    /// Running mean (0.0 while empty)
    mean: f64,
    /// Sum of squared deviations from the mean
    m2: f64,
    /// Smallest value seen (0.0 while empty)
    min: f64,
    /// Largest value seen (0.0 while empty)
    max: f64,
}

impl OnlineStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an accumulator by feeding `values` in order.
    #[cfg(test)]
    pub(crate) fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut stats = Self::new();
        for v in values {
            stats.update(v);
        }
        stats
    }

    /// Incorporate one value.
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        if self.count == 1 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    fn require(&self, required: u64) -> Result<(), ColdStart> {
        if self.count < required {
            Err(ColdStart {
                required,
                available: self.count,
            })
        } else {
            Ok(())
        }
    }

    pub fn mean(&self) -> Result<f64, ColdStart> {
        self.require(1)?;
        Ok(self.mean)
    }

    /// Sample variance, m2 / (n - 1). Needs at least two values.
    pub fn variance(&self) -> Result<f64, ColdStart> {
        self.require(2)?;
        Ok(self.m2 / (self.count - 1).max(1) as f64)
    }

    pub fn stddev(&self) -> Result<f64, ColdStart> {
        Ok(self.variance()?.sqrt())
    }

    pub fn min(&self) -> Result<f64, ColdStart> {
        self.require(1)?;
        Ok(self.min)
    }

    pub fn max(&self) -> Result<f64, ColdStart> {
        self.require(1)?;
        Ok(self.max)
    }

    /// Read-only view for diagnostics; unavailable statistics are `None`.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            count: self.count,
            mean: self.mean().ok(),
            variance: self.variance().ok(),
            min: self.min().ok(),
            max: self.max().ok(),
        }
    }

    /// Internal consistency check used when decoding persisted state.
    pub(crate) fn is_consistent(&self) -> bool {
        let finite = self.mean.is_finite()
            && self.m2.is_finite()
            && self.min.is_finite()
            && self.max.is_finite();
        if !finite || self.m2 < 0.0 {
            return false;
        }
        if self.count == 0 {
            return self.mean == 0.0 && self.m2 == 0.0 && self.min == 0.0 && self.max == 0.0;
        }
        self.min <= self.max
    }
}

/// Diagnostic snapshot of an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub count: u64,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Batch mean of a slice. `None` when empty.
pub fn batch_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn batch_variance(values: &[f64]) -> f64 {
        let mean = batch_mean(values).unwrap();
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
    }

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_empty_is_cold_start() {
        let s = OnlineStatistics::new();
        assert_eq!(
            s.mean(),
            Err(ColdStart {
                required: 1,
                available: 0
            })
        );
        assert!(s.min().is_err());
        assert!(s.max().is_err());
        assert!(s.variance().is_err());
    }

    #[test]
    fn test_single_value_has_no_variance() {
        let s = OnlineStatistics::from_values([7.5]);
        assert_eq!(s.mean(), Ok(7.5));
        assert_eq!(s.min(), Ok(7.5));
        assert_eq!(s.max(), Ok(7.5));
        assert_eq!(
            s.stddev(),
            Err(ColdStart {
                required: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_known_values() {
        let s = OnlineStatistics::from_values([10.0, 12.0, 14.0, 16.0]);
        assert_eq!(s.count(), 4);
        assert!((s.mean().unwrap() - 13.0).abs() < 1e-12);
        // sum of squared deviations = 9 + 1 + 1 + 9 = 20, / 3
        assert!((s.variance().unwrap() - 20.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.min(), Ok(10.0));
        assert_eq!(s.max(), Ok(16.0));
    }

    #[test]
    fn test_matches_batch_on_random_sequences() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let n = rng.gen_range(2..500);
            let offset = rng.gen_range(-1e3..1e3);
            let values: Vec<f64> = (0..n).map(|_| offset + rng.gen_range(-50.0..50.0)).collect();
            let s = OnlineStatistics::from_values(values.iter().copied());

            assert!(rel_close(s.mean().unwrap(), batch_mean(&values).unwrap(), 1e-9));
            assert!(
                rel_close(s.variance().unwrap(), batch_variance(&values), 1e-9),
                "variance {} vs batch {}",
                s.variance().unwrap(),
                batch_variance(&values)
            );
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(s.min(), Ok(min));
            assert_eq!(s.max(), Ok(max));
        }
    }

    #[test]
    fn test_stable_with_large_offset() {
        // Naive sum-of-squares loses all precision here
        let small: Vec<f64> = (0..1000).map(|i| (i % 7) as f64).collect();
        let shifted = small.iter().map(|v| 1e9 + v);
        let s = OnlineStatistics::from_values(shifted);
        assert!(rel_close(s.variance().unwrap(), batch_variance(&small), 1e-6));
    }

    #[test]
    fn test_snapshot_and_consistency() {
        let empty = OnlineStatistics::new();
        assert!(empty.is_consistent());
        let snap = empty.snapshot();
        assert_eq!(snap.count, 0);
        assert!(snap.mean.is_none() && snap.variance.is_none());

        let s = OnlineStatistics::from_values([1.0, 3.0]);
        assert!(s.is_consistent());
        assert_eq!(s.snapshot().variance, Some(2.0));
    }

    #[test]
    fn test_serde_roundtrip_exact() {
        let s = OnlineStatistics::from_values([0.1, 0.2, 0.7, 1.0 / 3.0]);
        let json = serde_json::to_string(&s).expect("serialize");
        let restored: OnlineStatistics = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, s);
    }
}
