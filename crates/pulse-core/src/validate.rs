//! Name syntax predicates for metrics and labels.
//!
//! Pure, total functions. Callers (metric constructors, label
//! branching, the registry) turn a `false` into an
//! `InvalidIdentifier` error before any state is touched.

use std::sync::LazyLock;

use regex::Regex;

static METRIC_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_:][A-Za-z0-9_:]*$").unwrap());

static LABEL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// True iff `s` is a syntactically valid metric name.
///
/// Colons are legal in the exposition format; the scraping side
/// reserves them for recording rules.
pub fn is_valid_metric_name(s: &str) -> bool {
    METRIC_NAME_RE.is_match(s)
}

/// True iff `s` is a syntactically valid label name.
///
/// Names starting with `__` are reserved for internal use by the
/// consuming monitoring system and are rejected.
pub fn is_valid_label_name(s: &str) -> bool {
    !s.starts_with("__") && LABEL_NAME_RE.is_match(s)
}
