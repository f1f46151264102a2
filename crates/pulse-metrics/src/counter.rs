//! Counter state machine: a monotonically non-decreasing accumulator.

use serde::{Deserialize, Serialize};

use pulse_core::{MetricError, MetricResult};

use crate::snapshot::require_inputs;

/// Mutable counter state, guarded by the owning instance's lock.
#[derive(Debug, Default)]
pub(crate) struct CounterState {
    total: f64,
    last_update_ms: Option<u64>,
}

impl CounterState {
    /// Add `delta` to the accumulator. Counters are monotonic by
    /// contract: a negative (or NaN) delta fails and leaves the
    /// accumulator untouched.
    pub(crate) fn inc(&mut self, delta: f64, now_ms: Option<u64>) -> MetricResult<()> {
        if !(delta >= 0.0) {
            return Err(MetricError::InvalidArgument(format!(
                "counter increment must be >= 0, got {delta}"
            )));
        }
        self.total += delta;
        if now_ms.is_some() {
            self.last_update_ms = now_ms;
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total: self.total,
            last_update_ms: self.last_update_ms,
        }
    }
}

/// Point-in-time copy of a counter, safe to ship between workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub total: f64,
    /// Epoch millis of the last increment, when timestamps are enabled.
    pub last_update_ms: Option<u64>,
}

impl CounterSnapshot {
    /// Sum all accumulators. Associative and commutative, so the same
    /// logical counter tracked by independent workers merges safely in
    /// any grouping or order. The merged timestamp is the most recent
    /// write across inputs.
    pub fn merge(snapshots: &[CounterSnapshot]) -> MetricResult<CounterSnapshot> {
        require_inputs(snapshots.len())?;
        Ok(CounterSnapshot {
            total: snapshots.iter().map(|s| s.total).sum(),
            last_update_ms: snapshots.iter().filter_map(|s| s.last_update_ms).max(),
        })
    }
}
