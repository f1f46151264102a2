//! Immutable metric identity: name, help, kind, and per-kind
//! configuration.
//!
//! A `MetricSpec` is validated in full at construction and never
//! changes afterwards. Bucket bounds and quantile sets are normalized
//! (sorted ascending, deduplicated) before being stored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MetricError, MetricResult};
use crate::validate;

/// The four canonical metric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    /// Exposition name, as used in `# TYPE` lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }

    /// Label names this kind reserves for its own sample lines.
    pub fn reserved_labels(&self) -> &'static [&'static str] {
        match self {
            MetricKind::Histogram => &["le"],
            MetricKind::Summary => &["quantile"],
            _ => &[],
        }
    }
}

/// Immutable definition of one metric family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    name: String,
    help: Option<String>,
    kind: MetricKind,
    /// Histogram bucket bounds or summary quantiles, sorted ascending,
    /// deduplicated. Empty for counters and gauges.
    bounds: Vec<f64>,
    /// Sliding-window width for summaries.
    window: Option<Duration>,
    /// Emit last-write timestamps on counter and gauge sample lines.
    timestamps: bool,
}

impl MetricSpec {
    pub fn counter(name: &str) -> MetricResult<Self> {
        Self::build(name, MetricKind::Counter, Vec::new(), None)
    }

    pub fn gauge(name: &str) -> MetricResult<Self> {
        Self::build(name, MetricKind::Gauge, Vec::new(), None)
    }

    /// Histogram with the given bucket upper bounds. Bounds are sorted
    /// and deduplicated; an empty or non-finite set is rejected.
    pub fn histogram(name: &str, buckets: &[f64]) -> MetricResult<Self> {
        let bounds = normalize_bounds(buckets, "bucket")?;
        Self::build(name, MetricKind::Histogram, bounds, None)
    }

    /// Summary reporting the given quantiles over a trailing time
    /// window. Quantiles must lie strictly inside (0, 1); the window
    /// must be non-zero.
    pub fn summary(name: &str, quantiles: &[f64], window: Duration) -> MetricResult<Self> {
        let bounds = normalize_bounds(quantiles, "quantile")?;
        if let Some(q) = bounds.iter().find(|q| **q <= 0.0 || **q >= 1.0) {
            return Err(MetricError::InvalidArgument(format!(
                "quantile {q} is outside (0, 1)"
            )));
        }
        if window.is_zero() {
            return Err(MetricError::InvalidArgument(
                "summary window must be non-zero".to_string(),
            ));
        }
        Self::build(name, MetricKind::Summary, bounds, Some(window))
    }

    fn build(
        name: &str,
        kind: MetricKind,
        bounds: Vec<f64>,
        window: Option<Duration>,
    ) -> MetricResult<Self> {
        if !validate::is_valid_metric_name(name) {
            return Err(MetricError::InvalidIdentifier(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            help: None,
            kind,
            bounds,
            window,
            timestamps: false,
        })
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Bucket bounds (histogram) or quantiles (summary), ascending.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn window(&self) -> Option<Duration> {
        self.window
    }

    pub fn timestamps(&self) -> bool {
        self.timestamps
    }
}

fn normalize_bounds(raw: &[f64], what: &str) -> MetricResult<Vec<f64>> {
    if raw.is_empty() {
        return Err(MetricError::InvalidArgument(format!(
            "{what} set must not be empty"
        )));
    }
    if let Some(b) = raw.iter().find(|b| !b.is_finite()) {
        return Err(MetricError::InvalidArgument(format!(
            "{what} {b} is not finite"
        )));
    }
    let mut bounds = raw.to_vec();
    bounds.sort_by(f64::total_cmp);
    bounds.dedup();
    Ok(bounds)
}
