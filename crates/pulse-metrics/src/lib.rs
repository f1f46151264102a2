//! pulse-metrics — in-process metric state machines and Prometheus
//! exposition.
//!
//! Application code obtains a root `Metric` handle from a `Registry`
//! (or a standalone `MetricFamily`), branches it into labeled
//! children, and mutates it cheaply on the hot path; a scraping layer
//! periodically calls `Registry::render` for the text exposition.
//!
//! # Architecture
//!
//! ```text
//! Registry::get_or_create(spec) -> Metric (root)
//!   ├── branch(labels)  -> Metric (labeled child, zeroed state)
//!   ├── inc()/set()/observe()  <- hot path
//!   └── snapshot() -> MetricSnapshot (serializable, mergeable
//!                                     across workers)
//!
//! Exposition
//!   └── Registry::render() -> text/plain for a /metrics endpoint
//! ```

pub mod counter;
pub mod expose;
pub mod family;
pub mod gauge;
pub mod histogram;
pub mod registry;
pub mod snapshot;
pub mod summary;

pub use counter::CounterSnapshot;
pub use expose::Exposer;
pub use family::{Metric, MetricFamily};
pub use gauge::GaugeSnapshot;
pub use histogram::HistogramSnapshot;
pub use registry::Registry;
pub use snapshot::MetricSnapshot;
pub use summary::SummarySnapshot;

pub use pulse_core::{LabelSet, MetricError, MetricKind, MetricResult, MetricSpec, SampleKey};
