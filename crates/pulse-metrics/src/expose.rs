//! Prometheus text exposition.
//!
//! Renders metric snapshots into newline-terminated UTF-8 text for a
//! scraping agent: `# HELP`/`# TYPE` header comments followed by
//! sample lines. Counters, gauges, and histograms render a zero
//! default when nothing has been observed; a summary whose window is
//! empty renders nothing at all, header included.

use pulse_core::{MetricSpec, SampleKey, render_number};

use crate::counter::CounterSnapshot;
use crate::family::{Metric, MetricFamily};
use crate::gauge::GaugeSnapshot;
use crate::histogram::HistogramSnapshot;
use crate::snapshot::MetricSnapshot;
use crate::summary::SummarySnapshot;

/// Renders exposition lines for a single metric instance.
pub struct Exposer {
    metric: Metric,
}

impl Exposer {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }

    /// Header comments plus sample lines for the instance's current
    /// snapshot. Restartable: each call re-snapshots.
    pub fn lines(&self) -> Vec<String> {
        let samples = sample_lines(&self.metric.snapshot(), &self.metric.sample_key());
        if samples.is_empty() {
            return Vec::new();
        }
        let mut out = header_lines(self.metric.family().spec());
        out.extend(samples);
        out
    }
}

impl MetricFamily {
    /// Exposition lines for the whole family: the header block once,
    /// then sample lines for every instance in creation order.
    /// Empty-window summary instances are skipped; a summary family
    /// with no live instance emits nothing.
    pub fn expose_lines(&self) -> Vec<String> {
        let mut samples = Vec::new();
        for metric in self.instances() {
            samples.extend(sample_lines(&metric.snapshot(), &metric.sample_key()));
        }
        if samples.is_empty() {
            return Vec::new();
        }
        let mut out = header_lines(self.spec());
        out.extend(samples);
        out
    }
}

fn header_lines(spec: &MetricSpec) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(help) = spec.help() {
        out.push(format!("# HELP {} {}", spec.name(), help));
    }
    out.push(format!("# TYPE {} {}", spec.name(), spec.kind().as_str()));
    out
}

fn sample_lines(snap: &MetricSnapshot, key: &SampleKey) -> Vec<String> {
    match snap {
        MetricSnapshot::Counter(c) => vec![scalar_line(key, c.total, c.last_update_ms)],
        MetricSnapshot::Gauge(g) => vec![scalar_line(key, g.value, g.last_update_ms)],
        MetricSnapshot::Histogram(h) => histogram_lines(key, h),
        MetricSnapshot::Summary(s) => summary_lines(key, s),
    }
}

fn scalar_line(key: &SampleKey, value: f64, ts: Option<u64>) -> String {
    match ts {
        Some(ts) => format!("{} {} {ts}", key.render(), render_number(value)),
        None => format!("{} {}", key.render(), render_number(value)),
    }
}

fn histogram_lines(key: &SampleKey, h: &HistogramSnapshot) -> Vec<String> {
    let bucket_key = key.with_suffix("_bucket");
    let mut out = Vec::with_capacity(h.bounds.len() + 3);
    let mut cumulative = 0u64;
    for (bound, count) in h.bounds.iter().zip(&h.counts) {
        cumulative += count;
        out.push(format!(
            "{} {cumulative}",
            bucket_key.with_label("le", &render_number(*bound)).render()
        ));
    }
    out.push(format!(
        "{} {}",
        bucket_key.with_label("le", "+Inf").render(),
        h.count()
    ));
    out.push(format!(
        "{} {}",
        key.with_suffix("_sum").render(),
        render_number(h.sum)
    ));
    out.push(format!("{} {}", key.with_suffix("_count").render(), h.count()));
    out
}

fn summary_lines(key: &SampleKey, s: &SummarySnapshot) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(s.quantiles.len() + 2);
    for (q, estimate) in s.estimates() {
        out.push(format!(
            "{} {}",
            key.with_label("quantile", &render_number(q)).render(),
            render_number(estimate)
        ));
    }
    out.push(format!(
        "{} {}",
        key.with_suffix("_sum").render(),
        render_number(s.sum())
    ));
    out.push(format!("{} {}", key.with_suffix("_count").render(), s.count()));
    out
}
