//! Cross-instance snapshot merging.
//!
//! Snapshots are plain serializable values: independent workers each
//! snapshot the same logical metric, ship the snapshots to an
//! aggregator (serde makes the wire format someone else's problem),
//! and the aggregator merges them into one reported value.

use serde::{Deserialize, Serialize};

use pulse_core::{MetricError, MetricResult};

use crate::counter::CounterSnapshot;
use crate::gauge::GaugeSnapshot;
use crate::histogram::HistogramSnapshot;
use crate::summary::SummarySnapshot;

/// Point-in-time state of a metric instance of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetricSnapshot {
    Counter(CounterSnapshot),
    Gauge(GaugeSnapshot),
    Histogram(HistogramSnapshot),
    Summary(SummarySnapshot),
}

impl MetricSnapshot {
    /// Merge snapshots of one logical metric taken by independent
    /// instances. All inputs must share a kind; per-kind compatibility
    /// rules (bucket bounds, quantile sets) apply on top.
    pub fn merge(snapshots: &[MetricSnapshot]) -> MetricResult<MetricSnapshot> {
        require_inputs(snapshots.len())?;
        match &snapshots[0] {
            MetricSnapshot::Counter(_) => {
                let inputs: Vec<CounterSnapshot> = snapshots
                    .iter()
                    .map(|s| match s {
                        MetricSnapshot::Counter(c) => Ok(c.clone()),
                        _ => Err(mixed_kinds()),
                    })
                    .collect::<MetricResult<_>>()?;
                Ok(MetricSnapshot::Counter(CounterSnapshot::merge(&inputs)?))
            }
            MetricSnapshot::Gauge(_) => {
                let inputs: Vec<GaugeSnapshot> = snapshots
                    .iter()
                    .map(|s| match s {
                        MetricSnapshot::Gauge(g) => Ok(g.clone()),
                        _ => Err(mixed_kinds()),
                    })
                    .collect::<MetricResult<_>>()?;
                Ok(MetricSnapshot::Gauge(GaugeSnapshot::merge(&inputs)?))
            }
            MetricSnapshot::Histogram(_) => {
                let inputs: Vec<HistogramSnapshot> = snapshots
                    .iter()
                    .map(|s| match s {
                        MetricSnapshot::Histogram(h) => Ok(h.clone()),
                        _ => Err(mixed_kinds()),
                    })
                    .collect::<MetricResult<_>>()?;
                Ok(MetricSnapshot::Histogram(HistogramSnapshot::merge(&inputs)?))
            }
            MetricSnapshot::Summary(_) => {
                let inputs: Vec<SummarySnapshot> = snapshots
                    .iter()
                    .map(|s| match s {
                        MetricSnapshot::Summary(s) => Ok(s.clone()),
                        _ => Err(mixed_kinds()),
                    })
                    .collect::<MetricResult<_>>()?;
                Ok(MetricSnapshot::Summary(SummarySnapshot::merge(&inputs)?))
            }
        }
    }
}

fn mixed_kinds() -> MetricError {
    MetricError::IncompatibleMerge("snapshots are of mixed metric kinds".to_string())
}

pub(crate) fn require_inputs(n: usize) -> MetricResult<()> {
    if n == 0 {
        return Err(MetricError::InvalidArgument(
            "merge requires at least one snapshot".to_string(),
        ));
    }
    Ok(())
}
