//! Error types for the Pulse metrics core.

use thiserror::Error;

/// Result type alias for metrics operations.
pub type MetricResult<T> = Result<T, MetricError>;

/// Errors raised by metric construction, mutation, and merging.
///
/// Every variant is surfaced synchronously at the offending call site
/// and leaves the prior state of the metric intact. None are retried
/// internally; they indicate a contract violation at the
/// instrumentation call.
#[derive(Debug, Error)]
pub enum MetricError {
    /// Malformed metric or label name.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Out-of-contract argument: negative counter delta, bad bucket or
    /// quantile configuration, mismatched registration, and the like.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A user-supplied label collides with a name the metric kind
    /// reserves for itself (`le` for histograms, `quantile` for
    /// summaries).
    #[error("label {0:?} is reserved for {1} metrics")]
    ReservedLabelCollision(String, &'static str),

    /// Branching was requested without any new labels.
    #[error("branching requires at least one label")]
    LabelsRequired,

    /// Merge inputs disagree on kind, bucket bounds, or quantile set.
    #[error("incompatible merge: {0}")]
    IncompatibleMerge(String),
}
