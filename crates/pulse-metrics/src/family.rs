//! Metric families: one root definition branched into labeled
//! instances.
//!
//! Instances live in a flat arena owned by the family. Handles hold an
//! `Arc` to the family plus a slot index, never a direct reference to
//! another instance's state, so branching from a child always attaches
//! the grandchild to the same flat arena and enumeration never chases
//! a tree. Slot 0 is always the unlabeled root.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use pulse_core::{
    LabelSet, MetricError, MetricKind, MetricResult, MetricSpec, SampleKey, validate,
};

use crate::counter::CounterState;
use crate::gauge::GaugeState;
use crate::histogram::HistogramState;
use crate::snapshot::MetricSnapshot;
use crate::summary::SummaryState;

const DEFAULT_SUMMARY_WINDOW: Duration = Duration::from_secs(60);

/// Per-kind mutable state behind one polymorphic interface.
enum MachineState {
    Counter(CounterState),
    Gauge(GaugeState),
    Histogram(HistogramState),
    Summary(SummaryState),
}

impl MachineState {
    fn new(spec: &MetricSpec) -> Self {
        match spec.kind() {
            MetricKind::Counter => MachineState::Counter(CounterState::default()),
            MetricKind::Gauge => MachineState::Gauge(GaugeState::default()),
            MetricKind::Histogram => MachineState::Histogram(HistogramState::new(spec.bounds())),
            MetricKind::Summary => MachineState::Summary(SummaryState::new(
                spec.bounds(),
                spec.window().unwrap_or(DEFAULT_SUMMARY_WINDOW),
            )),
        }
    }
}

/// One arena slot: labels, structural parent, and locked state.
struct Instance {
    labels: LabelSet,
    /// Slot index of the instance this one was branched from. `None`
    /// for the root. Enumeration only; state is never shared.
    parent: Option<usize>,
    state: Mutex<MachineState>,
}

struct Arena {
    /// Root at slot 0, then children in creation order.
    slots: Vec<Arc<Instance>>,
    /// Canonical label key to slot, for get-or-create branching.
    by_key: HashMap<String, usize>,
}

struct FamilyInner {
    spec: MetricSpec,
    arena: RwLock<Arena>,
}

/// A family of metric instances sharing one definition.
///
/// Cheap to clone; all clones see the same arena.
#[derive(Clone)]
pub struct MetricFamily {
    inner: Arc<FamilyInner>,
}

impl MetricFamily {
    /// Create a family with a zeroed root instance (empty label set).
    pub fn new(spec: MetricSpec) -> Self {
        let root = Arc::new(Instance {
            labels: LabelSet::new(),
            parent: None,
            state: Mutex::new(MachineState::new(&spec)),
        });
        let mut by_key = HashMap::new();
        by_key.insert(root.labels.canonical_key(), 0);
        Self {
            inner: Arc::new(FamilyInner {
                spec,
                arena: RwLock::new(Arena {
                    slots: vec![root],
                    by_key,
                }),
            }),
        }
    }

    pub fn spec(&self) -> &MetricSpec {
        &self.inner.spec
    }

    /// Handle to the unlabeled root instance.
    pub fn root(&self) -> Metric {
        Metric {
            inner: Arc::clone(&self.inner),
            slot: 0,
        }
    }

    /// Handles to every instance (root included) in creation order.
    pub fn instances(&self) -> Vec<Metric> {
        let arena = self.inner.arena.read();
        (0..arena.slots.len())
            .map(|slot| Metric {
                inner: Arc::clone(&self.inner),
                slot,
            })
            .collect()
    }
}

/// A cheap, cloneable handle to one metric instance.
///
/// Update operations are kind-checked at runtime: calling an operation
/// the underlying kind does not support fails with `InvalidArgument`
/// and touches nothing.
#[derive(Clone)]
pub struct Metric {
    inner: Arc<FamilyInner>,
    slot: usize,
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        self.inner.spec.kind()
    }

    pub fn name(&self) -> &str {
        self.inner.spec.name()
    }

    /// This instance's full label set.
    pub fn labels(&self) -> LabelSet {
        self.instance().labels.clone()
    }

    /// The rendered identity of this instance's primary sample line.
    pub fn sample_key(&self) -> SampleKey {
        SampleKey::new(self.inner.spec.name(), self.instance().labels.clone())
    }

    pub fn family(&self) -> MetricFamily {
        MetricFamily {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Handle to the instance this one was branched from, or `None`
    /// for the root. Structural only; parent and child never share
    /// state.
    pub fn parent(&self) -> Option<Metric> {
        self.instance().parent.map(|slot| Metric {
            inner: Arc::clone(&self.inner),
            slot,
        })
    }

    /// Add 1 to a counter, or 1.0 to a gauge.
    pub fn inc(&self) -> MetricResult<()> {
        self.inc_by(1.0)
    }

    /// Add `delta` to a counter (`delta >= 0`) or gauge.
    pub fn inc_by(&self, delta: f64) -> MetricResult<()> {
        let now = self.stamp();
        match &mut *self.instance().state.lock() {
            MachineState::Counter(c) => c.inc(delta, now),
            MachineState::Gauge(g) => {
                g.inc(delta, now);
                Ok(())
            }
            _ => Err(self.unsupported("inc")),
        }
    }

    /// Subtract 1.0 from a gauge.
    pub fn dec(&self) -> MetricResult<()> {
        self.dec_by(1.0)
    }

    /// Subtract `delta` from a gauge.
    pub fn dec_by(&self, delta: f64) -> MetricResult<()> {
        let now = self.stamp();
        match &mut *self.instance().state.lock() {
            MachineState::Gauge(g) => {
                g.dec(delta, now);
                Ok(())
            }
            _ => Err(self.unsupported("dec")),
        }
    }

    /// Set a gauge to `value`.
    pub fn set(&self, value: f64) -> MetricResult<()> {
        let now = self.stamp();
        match &mut *self.instance().state.lock() {
            MachineState::Gauge(g) => {
                g.set(value, now);
                Ok(())
            }
            _ => Err(self.unsupported("set")),
        }
    }

    /// Record an observation on a histogram or summary.
    pub fn observe(&self, value: f64) -> MetricResult<()> {
        match &mut *self.instance().state.lock() {
            MachineState::Histogram(h) => {
                h.observe(value);
                Ok(())
            }
            MachineState::Summary(s) => {
                s.observe(value);
                Ok(())
            }
            _ => Err(self.unsupported("observe")),
        }
    }

    /// Immutable copy of this instance's current state. For summaries
    /// this also performs the lazy window eviction pass.
    pub fn snapshot(&self) -> MetricSnapshot {
        match &mut *self.instance().state.lock() {
            MachineState::Counter(c) => MetricSnapshot::Counter(c.snapshot()),
            MachineState::Gauge(g) => MetricSnapshot::Gauge(g.snapshot()),
            MachineState::Histogram(h) => MetricSnapshot::Histogram(h.snapshot()),
            MachineState::Summary(s) => MetricSnapshot::Summary(s.snapshot()),
        }
    }

    /// Produce (or fetch) the labeled child whose label set is the
    /// union of this instance's labels and `labels`.
    ///
    /// New values win when a key is re-specified. The child starts
    /// with zeroed state, joins the root's flat arena regardless of
    /// how deep the branch point is, and records this instance as its
    /// structural parent. Branching to a label set the family already
    /// has returns the existing instance.
    pub fn branch(&self, labels: &[(&str, &str)]) -> MetricResult<Metric> {
        if labels.is_empty() {
            return Err(MetricError::LabelsRequired);
        }
        let kind = self.inner.spec.kind();
        for &(name, _) in labels {
            if kind.reserved_labels().iter().any(|&r| r == name) {
                return Err(MetricError::ReservedLabelCollision(
                    name.to_string(),
                    kind.as_str(),
                ));
            }
            if !validate::is_valid_label_name(name) {
                return Err(MetricError::InvalidIdentifier(name.to_string()));
            }
        }

        let mut arena = self.inner.arena.write();
        let mut merged = arena.slots[self.slot].labels.clone();
        for &(k, v) in labels {
            merged.insert(k, v);
        }
        let key = merged.canonical_key();
        if let Some(&slot) = arena.by_key.get(&key) {
            return Ok(Metric {
                inner: Arc::clone(&self.inner),
                slot,
            });
        }

        let slot = arena.slots.len();
        arena.slots.push(Arc::new(Instance {
            labels: merged,
            parent: Some(self.slot),
            state: Mutex::new(MachineState::new(&self.inner.spec)),
        }));
        arena.by_key.insert(key, slot);
        debug!(metric = self.inner.spec.name(), slot, "branched labeled instance");
        Ok(Metric {
            inner: Arc::clone(&self.inner),
            slot,
        })
    }

    fn instance(&self) -> Arc<Instance> {
        Arc::clone(&self.inner.arena.read().slots[self.slot])
    }

    /// Last-write timestamp in epoch millis, when enabled on the spec.
    fn stamp(&self) -> Option<u64> {
        if !self.inner.spec.timestamps() {
            return None;
        }
        Some(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        )
    }

    fn unsupported(&self, op: &str) -> MetricError {
        MetricError::InvalidArgument(format!(
            "{op} is not supported by {} metric {:?}",
            self.kind().as_str(),
            self.name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn counter_family() -> MetricFamily {
        MetricFamily::new(MetricSpec::counter("http_requests_total").unwrap())
    }

    #[test]
    fn root_has_empty_labels_and_zero_state() {
        let family = counter_family();
        let root = family.root();
        assert!(root.labels().is_empty());
        match root.snapshot() {
            MetricSnapshot::Counter(c) => assert_eq!(c.total, 0.0),
            other => panic!("expected counter, got {other:?}"),
        }
    }

    #[test]
    fn branch_unions_labels_in_insertion_order() {
        let family = counter_family();
        let child = family
            .root()
            .branch(&[("method", "post"), ("code", "200")])
            .unwrap();
        assert_eq!(
            child.sample_key().render(),
            r#"http_requests_total{method="post",code="200"}"#
        );
    }

    #[test]
    fn branch_without_labels_fails() {
        let family = counter_family();
        assert!(matches!(
            family.root().branch(&[]),
            Err(MetricError::LabelsRequired)
        ));
    }

    #[test]
    fn branch_rejects_reserved_labels_per_kind() {
        let histogram =
            MetricFamily::new(MetricSpec::histogram("lat", &[0.5]).unwrap());
        assert!(matches!(
            histogram.root().branch(&[("le", "0.5")]),
            Err(MetricError::ReservedLabelCollision(..))
        ));

        let summary = MetricFamily::new(
            MetricSpec::summary("lat", &[0.5], Duration::from_secs(60)).unwrap(),
        );
        assert!(matches!(
            summary.root().branch(&[("quantile", "0.5")]),
            Err(MetricError::ReservedLabelCollision(..))
        ));

        // A counter may use either name freely.
        assert!(counter_family().root().branch(&[("le", "x")]).is_ok());
    }

    #[test]
    fn branch_rejects_invalid_label_names() {
        let family = counter_family();
        assert!(matches!(
            family.root().branch(&[("__internal", "x")]),
            Err(MetricError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn branching_is_get_or_create_by_label_set() {
        let family = counter_family();
        let a = family.root().branch(&[("method", "post")]).unwrap();
        let b = family.root().branch(&[("method", "post")]).unwrap();
        a.inc_by(3.0).unwrap();
        b.inc_by(4.0).unwrap();
        match a.snapshot() {
            MetricSnapshot::Counter(c) => assert_eq!(c.total, 7.0),
            other => panic!("expected counter, got {other:?}"),
        }
        assert_eq!(family.instances().len(), 2);
    }

    #[test]
    fn grandchildren_join_the_root_arena() {
        let family = counter_family();
        let child = family.root().branch(&[("method", "post")]).unwrap();
        let grandchild = child.branch(&[("code", "200")]).unwrap();
        assert_eq!(
            grandchild.sample_key().render(),
            r#"http_requests_total{method="post",code="200"}"#
        );
        // Root, child, grandchild: one flat arena.
        assert_eq!(family.instances().len(), 3);

        // The structural parent chain is still recorded.
        let parent = grandchild.parent().unwrap();
        assert_eq!(parent.sample_key().render(), child.sample_key().render());
        assert!(family.root().parent().is_none());
    }

    #[test]
    fn respecifying_a_parent_label_overrides_it() {
        let family = counter_family();
        let child = family.root().branch(&[("code", "200")]).unwrap();
        let overridden = child.branch(&[("code", "404")]).unwrap();
        assert_eq!(
            overridden.sample_key().render(),
            r#"http_requests_total{code="404"}"#
        );
    }

    #[test]
    fn children_start_zeroed_and_do_not_feed_the_parent() {
        let family = counter_family();
        let root = family.root();
        root.inc_by(10.0).unwrap();
        let child = root.branch(&[("method", "get")]).unwrap();
        child.inc().unwrap();

        match child.snapshot() {
            MetricSnapshot::Counter(c) => assert_eq!(c.total, 1.0),
            other => panic!("expected counter, got {other:?}"),
        }
        match root.snapshot() {
            MetricSnapshot::Counter(c) => assert_eq!(c.total, 10.0),
            other => panic!("expected counter, got {other:?}"),
        }
    }

    #[test]
    fn wrong_kind_operations_fail_cleanly() {
        let family = counter_family();
        let root = family.root();
        assert!(root.set(5.0).is_err());
        assert!(root.dec().is_err());
        assert!(root.observe(1.0).is_err());
        assert!(root.inc().is_ok());

        let gauge = MetricFamily::new(MetricSpec::gauge("g").unwrap());
        assert!(gauge.root().observe(1.0).is_err());
        assert!(gauge.root().inc_by(-2.0).is_ok());
    }

    #[test]
    fn concurrent_updates_are_serialized() {
        let family = counter_family();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let root = family.root();
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    root.inc().unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        match family.root().snapshot() {
            MetricSnapshot::Counter(c) => assert_eq!(c.total, 8000.0),
            other => panic!("expected counter, got {other:?}"),
        }
    }
}
