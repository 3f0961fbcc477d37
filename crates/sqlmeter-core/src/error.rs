//! Core error types.

use thiserror::Error;

/// Errors raised by the metrics registry.
#[derive(Debug, Error)]
pub enum Error {
    /// A metric with the same name was registered before.
    #[error("metric '{0}' is already registered")]
    DuplicateMetric(String),

    /// Metric name does not match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
    #[error("invalid metric name '{0}'")]
    InvalidMetricName(String),

    /// Label name is malformed, reserved, or declared twice.
    #[error("invalid label name '{label}' for metric '{metric}'")]
    InvalidLabelName {
        /// Metric the label was declared on.
        metric: String,
        /// Offending label name.
        label: String,
    },

    /// A label set does not carry exactly the label names a metric was declared with.
    #[error("label mismatch for metric '{metric}': expected [{expected}], got [{got}]")]
    LabelMismatch {
        /// Metric being addressed.
        metric: String,
        /// Declared label names, comma separated.
        expected: String,
        /// Supplied label names, comma separated.
        got: String,
    },

    /// Summary quantile outside of `0.0..=1.0`.
    #[error("invalid quantile {0} (must be within 0.0..=1.0)")]
    InvalidQuantile(f64),
}
