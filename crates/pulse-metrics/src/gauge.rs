//! Gauge state machine: a free-moving signed level.

use serde::{Deserialize, Serialize};

use pulse_core::MetricResult;

use crate::snapshot::require_inputs;

/// Mutable gauge state, guarded by the owning instance's lock.
#[derive(Debug, Default)]
pub(crate) struct GaugeState {
    value: f64,
    last_update_ms: Option<u64>,
}

impl GaugeState {
    pub(crate) fn inc(&mut self, delta: f64, now_ms: Option<u64>) {
        self.value += delta;
        self.touch(now_ms);
    }

    pub(crate) fn dec(&mut self, delta: f64, now_ms: Option<u64>) {
        self.value -= delta;
        self.touch(now_ms);
    }

    pub(crate) fn set(&mut self, value: f64, now_ms: Option<u64>) {
        self.value = value;
        self.touch(now_ms);
    }

    fn touch(&mut self, now_ms: Option<u64>) {
        if now_ms.is_some() {
            self.last_update_ms = now_ms;
        }
    }

    pub(crate) fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            value: self.value,
            last_update_ms: self.last_update_ms,
        }
    }
}

/// Point-in-time copy of a gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSnapshot {
    pub value: f64,
    /// Epoch millis of the last update, when timestamps are enabled.
    pub last_update_ms: Option<u64>,
}

impl GaugeSnapshot {
    /// Arithmetic mean of all non-NaN values; NaN when every input is
    /// NaN.
    ///
    /// A gauge denotes a current level, not a cumulative count, so
    /// summing across workers would be meaningless. Averaging is one
    /// policy among several equally defensible reductions (max,
    /// last-writer); it is a compatibility choice, not a guarantee.
    /// See DESIGN.md.
    pub fn merge(snapshots: &[GaugeSnapshot]) -> MetricResult<GaugeSnapshot> {
        require_inputs(snapshots.len())?;
        let live: Vec<f64> = snapshots
            .iter()
            .map(|s| s.value)
            .filter(|v| !v.is_nan())
            .collect();
        let value = if live.is_empty() {
            f64::NAN
        } else {
            live.iter().sum::<f64>() / live.len() as f64
        };
        Ok(GaugeSnapshot {
            value,
            last_update_ms: snapshots.iter().filter_map(|s| s.last_update_ms).max(),
        })
    }
}
