//! Histogram state machine: fixed bucket bounds plus an overflow
//! bucket.
//!
//! Buckets store raw per-bucket counts; the running cumulative counts
//! required by the exposition format are computed at render time.

use serde::{Deserialize, Serialize};

use pulse_core::{MetricError, MetricResult};

use crate::snapshot::require_inputs;

/// Mutable histogram state, guarded by the owning instance's lock.
#[derive(Debug)]
pub(crate) struct HistogramState {
    /// Upper bounds, sorted ascending (fixed at construction).
    bounds: Vec<f64>,
    /// Raw counts aligned to `bounds`.
    counts: Vec<u64>,
    /// Observations exceeding every bound.
    overflow: u64,
    sum: f64,
}

impl HistogramState {
    pub(crate) fn new(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.to_vec(),
            counts: vec![0; bounds.len()],
            overflow: 0,
            sum: 0.0,
        }
    }

    /// Count `value` in the first bucket whose bound is `>= value`, or
    /// in the overflow bucket when it exceeds every bound.
    pub(crate) fn observe(&mut self, value: f64) {
        let idx = self.bounds.partition_point(|b| *b < value);
        if idx < self.counts.len() {
            self.counts[idx] += 1;
        } else {
            self.overflow += 1;
        }
        self.sum += value;
    }

    pub(crate) fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            bounds: self.bounds.clone(),
            counts: self.counts.clone(),
            overflow: self.overflow,
            sum: self.sum,
        }
    }
}

/// Point-in-time copy of a histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSnapshot {
    pub bounds: Vec<f64>,
    /// Raw per-bucket counts aligned to `bounds` (not cumulative).
    pub counts: Vec<u64>,
    pub overflow: u64,
    pub sum: f64,
}

impl HistogramSnapshot {
    /// Total number of observations across all buckets.
    pub fn count(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.overflow
    }

    /// Bucket-wise sum. Every input must carry the same bound vector;
    /// anything else is an `IncompatibleMerge`.
    pub fn merge(snapshots: &[HistogramSnapshot]) -> MetricResult<HistogramSnapshot> {
        require_inputs(snapshots.len())?;
        let first = &snapshots[0];
        let mut merged = first.clone();
        for s in &snapshots[1..] {
            if s.bounds != first.bounds {
                return Err(MetricError::IncompatibleMerge(format!(
                    "bucket bounds {:?} do not match {:?}",
                    s.bounds, first.bounds
                )));
            }
            for (total, count) in merged.counts.iter_mut().zip(&s.counts) {
                *total += count;
            }
            merged.overflow += s.overflow;
            merged.sum += s.sum;
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_observation_lands_in_exactly_one_bucket() {
        let mut h = HistogramState::new(&[0.3, 0.6]);
        h.observe(0.5);
        h.observe(0.2);
        h.observe(0.11);
        h.observe(-5.0);
        h.observe(26.0);
        h.observe(48.0);

        let snap = h.snapshot();
        assert_eq!(snap.counts, vec![3, 1]);
        assert_eq!(snap.overflow, 2);
        assert_eq!(snap.count(), 6);
        assert!((snap.sum - 69.81).abs() < 1e-9);
    }

    #[test]
    fn value_equal_to_a_bound_counts_in_that_bucket() {
        let mut h = HistogramState::new(&[0.3, 0.6]);
        h.observe(0.3);
        h.observe(0.6);
        let snap = h.snapshot();
        assert_eq!(snap.counts, vec![1, 1]);
        assert_eq!(snap.overflow, 0);
    }

    #[test]
    fn count_always_matches_total_observations() {
        let mut h = HistogramState::new(&[1.0, 2.0, 3.0]);
        for i in 0..50 {
            h.observe(f64::from(i) * 0.1);
        }
        assert_eq!(h.snapshot().count(), 50);
    }

    #[test]
    fn merge_sums_bucket_by_bucket() {
        let mut a = HistogramState::new(&[0.3, 0.6]);
        a.observe(0.1);
        a.observe(5.0);
        let mut b = HistogramState::new(&[0.3, 0.6]);
        b.observe(0.5);

        let merged = HistogramSnapshot::merge(&[a.snapshot(), b.snapshot()]).unwrap();
        assert_eq!(merged.counts, vec![1, 1]);
        assert_eq!(merged.overflow, 1);
        assert_eq!(merged.count(), 3);
        assert!((merged.sum - 5.6).abs() < 1e-9);
    }

    #[test]
    fn merge_of_single_snapshot_is_identity() {
        let mut h = HistogramState::new(&[1.0]);
        h.observe(0.5);
        let snap = h.snapshot();
        assert_eq!(HistogramSnapshot::merge(&[snap.clone()]).unwrap(), snap);
    }

    #[test]
    fn merge_rejects_mismatched_bounds() {
        let a = HistogramState::new(&[0.3, 0.6]).snapshot();
        let b = HistogramState::new(&[0.3, 0.9]).snapshot();
        assert!(matches!(
            HistogramSnapshot::merge(&[a, b]),
            Err(MetricError::IncompatibleMerge(_))
        ));
    }
}
