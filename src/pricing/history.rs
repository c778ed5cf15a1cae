//! Fixed-capacity rolling history of observations.
//!
//! Storage is a true ring: slots fill in order until `capacity` is reached,
//! after which every push overwrites the slot at `cursor` (the chronologically
//! oldest entry) and advances the cursor. Memory stays O(capacity) no matter
//! how long the game runs.

use serde::{Deserialize, Serialize};

use super::observation::Observation;
use crate::errors::{Error, Result};

/// Circular buffer of the most recent observations.
///
/// ```text
/// capacity 3, after pushes a b c d e:
///   slots  = [d, e, c]
///   cursor = 2          (c is oldest)
///   to_sequence() = [c, d, e]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHistory")]
pub struct RollingHistory {
    capacity: usize,
    slots: Vec<Observation>,
    /// Slot holding the oldest entry once full; always 0 while filling
    cursor: usize,
}

impl RollingHistory {
    /// Create an empty history. A zero capacity is a configuration error.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::invalid_config("history capacity must be > 0"));
        }
        Ok(Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            cursor: 0,
        })
    }

    /// Append an observation, evicting the oldest when full. O(1).
    pub fn push(&mut self, observation: Observation) {
        if self.slots.len() < self.capacity {
            self.slots.push(observation);
        } else {
            self.slots[self.cursor] = observation;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    /// Owned snapshot, oldest to newest.
    pub fn to_sequence(&self) -> Vec<Observation> {
        let mut out = Vec::with_capacity(self.slots.len());
        out.extend_from_slice(&self.slots[self.cursor..]);
        out.extend_from_slice(&self.slots[..self.cursor]);
        out
    }

    /// Most recently pushed observation.
    pub fn latest(&self) -> Option<&Observation> {
        if self.is_empty() {
            None
        } else if self.is_full() {
            let idx = (self.cursor + self.capacity - 1) % self.capacity;
            self.slots.get(idx)
        } else {
            self.slots.last()
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Wire form, validated before it becomes a `RollingHistory`.
#[derive(Deserialize)]
struct RawHistory {
    capacity: usize,
    slots: Vec<Observation>,
    cursor: usize,
}

impl TryFrom<RawHistory> for RollingHistory {
    type Error = Error;

    fn try_from(raw: RawHistory) -> Result<Self> {
        if raw.capacity == 0 {
            return Err(Error::state_corrupt("history capacity is 0"));
        }
        if raw.slots.len() > raw.capacity {
            return Err(Error::state_corrupt(format!(
                "history holds {} entries, capacity {}",
                raw.slots.len(),
                raw.capacity
            )));
        }
        if raw.cursor >= raw.capacity || (raw.slots.len() < raw.capacity && raw.cursor != 0) {
            return Err(Error::state_corrupt(format!(
                "history cursor {} invalid for {}/{} entries",
                raw.cursor,
                raw.slots.len(),
                raw.capacity
            )));
        }
        Ok(Self {
            capacity: raw.capacity,
            slots: raw.slots,
            cursor: raw.cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(i: u64) -> Observation {
        Observation::new(i, 10.0 + i as f64, Some(i as f64), i as f64)
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            RollingHistory::new(0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rollover_keeps_last_c_in_order() {
        for capacity in 1..=7 {
            for n in 0..25u64 {
                let mut h = RollingHistory::new(capacity).unwrap();
                for i in 0..n {
                    h.push(obs(i));
                }
                let expected: Vec<_> = (n.saturating_sub(capacity as u64)..n).map(obs).collect();
                assert_eq!(h.to_sequence(), expected, "capacity={capacity} n={n}");
                assert_eq!(h.size(), expected.len());
                assert_eq!(h.is_full(), n as usize >= capacity);
                assert_eq!(h.latest().copied(), n.checked_sub(1).map(obs));
            }
        }
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut h = RollingHistory::new(2).unwrap();
        h.push(obs(1));
        let snap = h.to_sequence();
        h.push(obs(2));
        h.push(obs(3));
        assert_eq!(snap, vec![obs(1)]);
    }

    #[test]
    fn test_deserialize_rejects_broken_ring() {
        let over = r#"{"capacity":1,"slots":[
            {"period":1,"own_price":1.0,"rival_price":null,"demand":0.0},
            {"period":2,"own_price":1.0,"rival_price":null,"demand":0.0}],"cursor":0}"#;
        assert!(serde_json::from_str::<RollingHistory>(over).is_err());

        let bad_cursor = r#"{"capacity":3,"slots":[],"cursor":1}"#;
        assert!(serde_json::from_str::<RollingHistory>(bad_cursor).is_err());

        let zero = r#"{"capacity":0,"slots":[],"cursor":0}"#;
        assert!(serde_json::from_str::<RollingHistory>(zero).is_err());
    }

    #[test]
    fn test_serde_roundtrip_preserves_ring_position() {
        let mut h = RollingHistory::new(3).unwrap();
        for i in 0..5 {
            h.push(obs(i));
        }
        let json = serde_json::to_string(&h).expect("serialize");
        let restored: RollingHistory = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, h);

        let mut a = h.clone();
        let mut b = restored;
        a.push(obs(9));
        b.push(obs(9));
        assert_eq!(a.to_sequence(), b.to_sequence());
    }
}
