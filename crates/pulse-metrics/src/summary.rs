//! Sliding-window summary state machine.
//!
//! Raw observations are timestamped on write and retained only for a
//! trailing time window. Eviction is lazy: writes never prune, and the
//! snapshot path drops everything older than the window before
//! computing sum, count, and quantile estimates. This bounds memory
//! while keeping the hot path a single append.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use pulse_core::{MetricError, MetricResult};

use crate::snapshot::require_inputs;

/// Mutable summary state, guarded by the owning instance's lock.
#[derive(Debug)]
pub(crate) struct SummaryState {
    /// Quantiles to report, sorted ascending (fixed at construction).
    quantiles: Vec<f64>,
    window: Duration,
    /// Samples in observation order; eviction only pops the front.
    samples: VecDeque<(f64, Instant)>,
}

impl SummaryState {
    pub(crate) fn new(quantiles: &[f64], window: Duration) -> Self {
        Self {
            quantiles: quantiles.to_vec(),
            window,
            samples: VecDeque::new(),
        }
    }

    pub(crate) fn observe(&mut self, value: f64) {
        self.observe_at(value, Instant::now());
    }

    pub(crate) fn observe_at(&mut self, value: f64, at: Instant) {
        self.samples.push_back((value, at));
    }

    pub(crate) fn snapshot(&mut self) -> SummarySnapshot {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&mut self, now: Instant) -> SummarySnapshot {
        self.evict(now);
        SummarySnapshot {
            quantiles: self.quantiles.clone(),
            samples: self.samples.iter().map(|(v, _)| *v).collect(),
        }
    }

    /// Drop samples whose age exceeds the window. A sample exactly at
    /// the window edge is retained.
    fn evict(&mut self, now: Instant) {
        while let Some((_, at)) = self.samples.front() {
            if now.duration_since(*at) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Windowed raw samples plus the configured quantile set.
///
/// Unlike the other snapshot types this is not a numeric reduction:
/// merging concatenates the raw samples of all inputs and recomputes
/// the quantiles over the union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySnapshot {
    pub quantiles: Vec<f64>,
    /// Values that were still inside the window at snapshot time.
    pub samples: Vec<f64>,
}

impl SummarySnapshot {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn count(&self) -> u64 {
        self.samples.len() as u64
    }

    pub fn sum(&self) -> f64 {
        self.samples.iter().sum()
    }

    /// `(quantile, estimate)` pairs in ascending quantile order, by
    /// linear interpolation at rank `q * (n - 1)` over the value-sorted
    /// samples. Empty when there are no samples.
    pub fn estimates(&self) -> Vec<(f64, f64)> {
        if self.samples.is_empty() {
            return Vec::new();
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        self.quantiles
            .iter()
            .map(|&q| (q, rank_estimate(&sorted, q)))
            .collect()
    }

    /// Concatenate-then-recompute. Inputs must agree on the quantile
    /// set; samples are assumed already windowed by their producers.
    pub fn merge(snapshots: &[SummarySnapshot]) -> MetricResult<SummarySnapshot> {
        require_inputs(snapshots.len())?;
        let first = &snapshots[0];
        let mut merged = first.clone();
        for s in &snapshots[1..] {
            if s.quantiles != first.quantiles {
                return Err(MetricError::IncompatibleMerge(format!(
                    "quantile set {:?} does not match {:?}",
                    s.quantiles, first.quantiles
                )));
            }
            merged.samples.extend_from_slice(&s.samples);
        }
        Ok(merged)
    }
}

fn rank_estimate(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    fn seeded(base: Instant) -> SummaryState {
        let mut s = SummaryState::new(&[0.25, 0.5, 0.75], WINDOW);
        s.observe_at(20.0, at(base, 0));
        s.observe_at(30.0, at(base, 20));
        s.observe_at(50.0, at(base, 40));
        s
    }

    #[test]
    fn all_samples_inside_window_are_reported() {
        let base = Instant::now();
        let mut s = seeded(base);

        let snap = s.snapshot_at(at(base, 40));
        assert_eq!(snap.count(), 3);
        assert_eq!(snap.sum(), 100.0);
        assert_eq!(
            snap.estimates(),
            vec![(0.25, 25.0), (0.5, 30.0), (0.75, 40.0)]
        );
    }

    #[test]
    fn eviction_drops_samples_as_they_age_out() {
        let base = Instant::now();
        let mut s = seeded(base);

        // t = 70: the t = 0 sample has aged out.
        let snap = s.snapshot_at(at(base, 70));
        assert_eq!(snap.samples, vec![30.0, 50.0]);
        assert_eq!(snap.sum(), 80.0);
        assert_eq!(
            snap.estimates(),
            vec![(0.25, 35.0), (0.5, 40.0), (0.75, 45.0)]
        );

        // t = 90: only the t = 40 sample remains.
        let snap = s.snapshot_at(at(base, 90));
        assert_eq!(snap.samples, vec![50.0]);
        assert_eq!(
            snap.estimates(),
            vec![(0.25, 50.0), (0.5, 50.0), (0.75, 50.0)]
        );

        // t = 110: the window is empty.
        let snap = s.snapshot_at(at(base, 110));
        assert!(snap.is_empty());
        assert!(snap.estimates().is_empty());
    }

    #[test]
    fn sample_exactly_at_window_edge_is_retained() {
        let base = Instant::now();
        let mut s = SummaryState::new(&[0.5], WINDOW);
        s.observe_at(1.0, base);
        let snap = s.snapshot_at(at(base, 60));
        assert_eq!(snap.count(), 1);
    }

    #[test]
    fn writes_never_prune() {
        let base = Instant::now();
        let mut s = SummaryState::new(&[0.5], WINDOW);
        s.observe_at(1.0, base);
        // A much later write does not evict the stale sample yet.
        s.observe_at(2.0, at(base, 1000));
        assert_eq!(s.samples.len(), 2);
        // The next snapshot does.
        let snap = s.snapshot_at(at(base, 1000));
        assert_eq!(snap.samples, vec![2.0]);
    }

    #[test]
    fn merge_unions_samples_and_recomputes() {
        let a = SummarySnapshot {
            quantiles: vec![0.5],
            samples: vec![10.0, 20.0],
        };
        let b = SummarySnapshot {
            quantiles: vec![0.5],
            samples: vec![30.0],
        };
        let merged = SummarySnapshot::merge(&[a, b]).unwrap();
        assert_eq!(merged.count(), 3);
        assert_eq!(merged.estimates(), vec![(0.5, 20.0)]);
    }

    #[test]
    fn merge_rejects_mismatched_quantile_sets() {
        let a = SummarySnapshot { quantiles: vec![0.5], samples: vec![1.0] };
        let b = SummarySnapshot { quantiles: vec![0.9], samples: vec![2.0] };
        assert!(matches!(
            SummarySnapshot::merge(&[a, b]),
            Err(MetricError::IncompatibleMerge(_))
        ));
    }
}
