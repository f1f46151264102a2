//! The metric registry: name to family, plus whole-process exposition.
//!
//! An explicit constructed object with a documented lifecycle: created
//! once at process start and cloned (cheaply) into whatever needs to
//! register or scrape metrics. There is no module-level singleton.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use pulse_core::{MetricError, MetricResult, MetricSpec};

use crate::family::{Metric, MetricFamily};

/// Process-wide metric bookkeeping.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    /// Families in registration order, for stable exposition output.
    families: Vec<MetricFamily>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root handle for `spec`, creating the family on first call.
    ///
    /// Idempotent: registering the same definition again returns the
    /// existing family. A spec that reuses a registered name with a
    /// different kind, configuration, or help text is rejected.
    pub fn get_or_create(&self, spec: MetricSpec) -> MetricResult<Metric> {
        let mut inner = self.inner.write();
        if let Some(&idx) = inner.by_name.get(spec.name()) {
            let existing = &inner.families[idx];
            if existing.spec() != &spec {
                return Err(MetricError::InvalidArgument(format!(
                    "metric {:?} is already registered with a different definition",
                    spec.name()
                )));
            }
            return Ok(existing.root());
        }

        debug!(
            metric = spec.name(),
            kind = spec.kind().as_str(),
            "registered metric family"
        );
        let family = MetricFamily::new(spec);
        let root = family.root();
        let idx = inner.families.len();
        inner.by_name.insert(family.spec().name().to_string(), idx);
        inner.families.push(family);
        Ok(root)
    }

    /// Registered families in registration order.
    pub fn families(&self) -> Vec<MetricFamily> {
        self.inner.read().families.clone()
    }

    /// Exposition lines for every family, one family after another,
    /// each immediately preceded by its own header block.
    pub fn expose_all(&self) -> Vec<String> {
        let mut out = Vec::new();
        for family in self.families() {
            out.extend(family.expose_lines());
        }
        out
    }

    /// Full text exposition, newline-terminated UTF-8, ready to serve
    /// as `text/plain` to a scraper.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.expose_all() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
