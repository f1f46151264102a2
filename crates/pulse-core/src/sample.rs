//! Sample keys: the rendered identity of one exposition line.
//!
//! A sample key is derived at render time from a metric's name and
//! label set; it is never stored with the metric state.

use crate::labels::LabelSet;

/// Metric name (optionally suffixed) plus a label set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleKey {
    name: String,
    labels: LabelSet,
}

impl SampleKey {
    pub fn new(name: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// The same key with a suffix appended to the metric name
    /// (`_bucket`, `_sum`, `_count`).
    pub fn with_suffix(&self, suffix: &str) -> SampleKey {
        SampleKey {
            name: format!("{}{suffix}", self.name),
            labels: self.labels.clone(),
        }
    }

    /// The same key with one more label (`le`, `quantile`).
    pub fn with_label(&self, name: &str, value: &str) -> SampleKey {
        let mut labels = self.labels.clone();
        labels.insert(name, value);
        SampleKey {
            name: self.name.clone(),
            labels,
        }
    }

    /// Full key as it appears at the start of a sample line.
    pub fn render(&self) -> String {
        format!("{}{}", self.name, self.labels.render())
    }
}
