//! Middleware and metric configuration.

use std::sync::Arc;
use std::time::Duration;

use sqlmeter_core::metrics::{Label, SummaryOpts, DEFAULT_QUANTILES, DEFAULT_SUMMARY_WINDOW};

use crate::query::{CommonEngine, Engine};

/// Default metric name prefix.
pub const DEFAULT_PREFIX: &str = "sqlmeter";

/// Default slow query threshold in milliseconds.
pub const DEFAULT_SLOW_QUERY_THRESHOLD_MS: u64 = 1000;

/// Middleware configuration.
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    /// Time to first row above which a query counts as slow.
    pub slow_query_threshold: Duration,

    /// Engine used to render queries before extracting labels.
    pub engine: Arc<dyn Engine>,
}

impl MiddlewareConfig {
    /// Create a configuration with the default threshold and bare identifiers.
    pub fn new() -> Self {
        Self {
            slow_query_threshold: Duration::from_millis(DEFAULT_SLOW_QUERY_THRESHOLD_MS),
            engine: Arc::new(CommonEngine),
        }
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = threshold;
        self
    }

    /// Set the rendering engine.
    pub fn with_engine(mut self, engine: impl Engine + 'static) -> Self {
        self.engine = Arc::new(engine);
        self
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for the instruments bound by [`QueryMetrics::create`].
///
/// [`QueryMetrics::create`]: crate::QueryMetrics::create
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsOptions {
    /// Prefix for every metric name.
    pub prefix: String,

    /// Labels attached to every series, in addition to `type` and `table`.
    pub default_labels: Vec<Label>,

    /// Quantiles reported by both summaries.
    pub quantiles: Vec<f64>,

    /// Number of recent observations each summary series keeps.
    pub summary_window: usize,
}

impl MetricsOptions {
    /// Create options with the default prefix and quantiles.
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_labels: Vec::new(),
            quantiles: DEFAULT_QUANTILES.to_vec(),
            summary_window: DEFAULT_SUMMARY_WINDOW,
        }
    }

    /// Set the metric name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Add a default label.
    pub fn with_default_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_labels.push(Label::new(name, value));
        self
    }

    /// Set the summary quantiles.
    pub fn with_quantiles(mut self, quantiles: impl Into<Vec<f64>>) -> Self {
        self.quantiles = quantiles.into();
        self
    }

    /// Set the summary window size.
    pub fn with_summary_window(mut self, window: usize) -> Self {
        self.summary_window = window;
        self
    }

    pub(crate) fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }

    pub(crate) fn summary_opts(&self) -> SummaryOpts {
        SummaryOpts::default()
            .with_quantiles(self.quantiles.clone())
            .with_window(self.summary_window)
    }
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MiddlewareConfig::default();
        assert_eq!(config.slow_query_threshold, Duration::from_secs(1));
        assert_eq!(config.engine.name(), "common");

        let options = MetricsOptions::default();
        assert_eq!(options.prefix, "sqlmeter");
        assert_eq!(options.quantiles, vec![0.1, 0.5, 0.9, 0.99]);
        assert!(options.default_labels.is_empty());
    }

    #[test]
    fn test_builders() {
        let config = MiddlewareConfig::new()
            .with_slow_query_threshold(Duration::from_millis(250))
            .with_engine(crate::query::PostgresEngine);
        assert_eq!(config.slow_query_threshold, Duration::from_millis(250));
        assert_eq!(config.engine.name(), "postgres");

        let options = MetricsOptions::new()
            .with_prefix("app_db")
            .with_default_label("database", "test")
            .with_quantiles(vec![0.5])
            .with_summary_window(16);
        assert_eq!(options.metric_name("rows"), "app_db_rows");
        assert_eq!(options.default_labels, vec![Label::new("database", "test")]);
        assert_eq!(options.quantiles, vec![0.5]);
        assert_eq!(options.summary_opts().window, 16);
    }

    #[test]
    fn test_empty_prefix() {
        let options = MetricsOptions::new().with_prefix("");
        assert_eq!(options.metric_name("queries_total"), "queries_total");
    }
}
