//! The eight query instruments.

use std::sync::Arc;

use sqlmeter_core::metrics::{Counter, Family, Gauge, Label, Registry, Summary};

use crate::config::MetricsOptions;
use crate::error::Result;
use crate::labels::QueryLabels;

const INFLIGHT_HELP: &str = "Number of SQL queries currently waiting for their first row";
const ROWS_HELP: &str = "Number of rows returned by SQL queries";
const TOTAL_HELP: &str = "Number of SQL queries started";
const SLOW_HELP: &str = "Number of SQL queries whose first row arrived after the slow query threshold";
const COMPLETED_HELP: &str = "Number of SQL queries that completed successfully";
const ERRORED_HELP: &str = "Number of SQL queries that failed";
const RESPONSE_TIMES_HELP: &str = "Seconds from query start until the first row or failure";
const COMPLETED_TIMES_HELP: &str = "Seconds from query start until completion or failure";

/// Instrument families bound to a registry.
///
/// Cloning is cheap; clones share the same families.
#[derive(Debug, Clone)]
pub struct QueryMetrics {
    default_labels: Arc<[Label]>,
    inflight: Family<Gauge>,
    rows: Family<Counter>,
    queries_total: Family<Counter>,
    queries_slow: Family<Counter>,
    queries_completed: Family<Counter>,
    queries_errored: Family<Counter>,
    response_times: Family<Summary>,
    completed_times: Family<Summary>,
}

impl QueryMetrics {
    /// Register all instruments on `registry`.
    ///
    /// Every family is declared with the label names `type`, `table` and the
    /// names of the default labels. Fails if any name is already registered
    /// or if a default label collides with `type` or `table`.
    pub fn create(registry: &Registry, options: &MetricsOptions) -> Result<Self> {
        let mut label_names = vec!["type", "table"];
        label_names.extend(options.default_labels.iter().map(|l| l.name()));
        let summary_opts = options.summary_opts();

        let metrics = Self {
            default_labels: options.default_labels.clone().into(),
            inflight: registry.gauge(
                &options.metric_name("queries_inflight"),
                INFLIGHT_HELP,
                &label_names,
            )?,
            rows: registry.counter(&options.metric_name("rows"), ROWS_HELP, &label_names)?,
            queries_total: registry.counter(
                &options.metric_name("queries_total"),
                TOTAL_HELP,
                &label_names,
            )?,
            queries_slow: registry.counter(
                &options.metric_name("queries_slow"),
                SLOW_HELP,
                &label_names,
            )?,
            queries_completed: registry.counter(
                &options.metric_name("queries_completed"),
                COMPLETED_HELP,
                &label_names,
            )?,
            queries_errored: registry.counter(
                &options.metric_name("queries_errored"),
                ERRORED_HELP,
                &label_names,
            )?,
            response_times: registry.summary(
                &options.metric_name("queries_response_times"),
                RESPONSE_TIMES_HELP,
                summary_opts.clone(),
                &label_names,
            )?,
            completed_times: registry.summary(
                &options.metric_name("queries_completed_times"),
                COMPLETED_TIMES_HELP,
                summary_opts,
                &label_names,
            )?,
        };

        tracing::debug!(
            prefix = %options.prefix,
            default_labels = options.default_labels.len(),
            "query metrics registered"
        );
        Ok(metrics)
    }

    /// Labels attached to every series.
    pub fn default_labels(&self) -> &[Label] {
        &self.default_labels
    }

    pub(crate) fn shared_default_labels(&self) -> Arc<[Label]> {
        Arc::clone(&self.default_labels)
    }

    /// Build the labels for a query of `kind` against `table`.
    pub fn labels(&self, kind: &str, table: &str) -> QueryLabels {
        QueryLabels::new(self.shared_default_labels(), kind, table)
    }

    /// Queries started whose first row has not arrived yet.
    pub fn inflight(&self) -> &Family<Gauge> {
        &self.inflight
    }

    /// Rows delivered to consumers.
    pub fn rows(&self) -> &Family<Counter> {
        &self.rows
    }

    /// Queries started.
    pub fn queries_total(&self) -> &Family<Counter> {
        &self.queries_total
    }

    /// Queries slower than the threshold to their first row or early error.
    pub fn queries_slow(&self) -> &Family<Counter> {
        &self.queries_slow
    }

    /// Queries whose row stream ended normally.
    pub fn queries_completed(&self) -> &Family<Counter> {
        &self.queries_completed
    }

    /// Queries that failed or were abandoned.
    pub fn queries_errored(&self) -> &Family<Counter> {
        &self.queries_errored
    }

    /// Seconds from start to the first row.
    pub fn response_times(&self) -> &Family<Summary> {
        &self.response_times
    }

    /// Seconds from start to completion or failure.
    pub fn completed_times(&self) -> &Family<Summary> {
        &self.completed_times
    }

    /// Resolve every series for one label set.
    pub(crate) fn series(&self, labels: &QueryLabels) -> Result<QuerySeries> {
        let set = labels.to_label_set();
        Ok(QuerySeries {
            inflight: self.inflight.with_labels(&set)?,
            rows: self.rows.with_labels(&set)?,
            total: self.queries_total.with_labels(&set)?,
            slow: self.queries_slow.with_labels(&set)?,
            completed: self.queries_completed.with_labels(&set)?,
            errored: self.queries_errored.with_labels(&set)?,
            response_times: self.response_times.with_labels(&set)?,
            completed_times: self.completed_times.with_labels(&set)?,
        })
    }
}

/// Series handles for one label set, resolved once per query.
#[derive(Debug, Clone)]
pub(crate) struct QuerySeries {
    pub(crate) inflight: Arc<Gauge>,
    pub(crate) rows: Arc<Counter>,
    pub(crate) total: Arc<Counter>,
    pub(crate) slow: Arc<Counter>,
    pub(crate) completed: Arc<Counter>,
    pub(crate) errored: Arc<Counter>,
    pub(crate) response_times: Arc<Summary>,
    pub(crate) completed_times: Arc<Summary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_create_registers_eight_families() {
        let registry = Registry::new();
        let options = MetricsOptions::new().with_default_label("database", "test");
        let metrics = QueryMetrics::create(&registry, &options).unwrap();

        assert_eq!(
            registry.metric_names(),
            vec![
                "sqlmeter_queries_inflight",
                "sqlmeter_rows",
                "sqlmeter_queries_total",
                "sqlmeter_queries_slow",
                "sqlmeter_queries_completed",
                "sqlmeter_queries_errored",
                "sqlmeter_queries_response_times",
                "sqlmeter_queries_completed_times",
            ]
        );
        assert_eq!(metrics.default_labels(), &[Label::new("database", "test")]);
        assert_eq!(
            metrics.rows().descriptor().label_names,
            vec!["type", "table", "database"]
        );
    }

    #[test]
    fn test_create_twice_on_one_registry_fails() {
        let registry = Registry::new();
        let options = MetricsOptions::new();
        QueryMetrics::create(&registry, &options).unwrap();

        let err = QueryMetrics::create(&registry, &options).unwrap_err();
        assert!(matches!(err, Error::Registry(_)));

        // A different prefix does not collide.
        QueryMetrics::create(&registry, &options.clone().with_prefix("other")).unwrap();
    }

    #[test]
    fn test_default_label_cannot_shadow_type() {
        let registry = Registry::new();
        let options = MetricsOptions::new().with_default_label("type", "x");
        assert!(QueryMetrics::create(&registry, &options).is_err());
    }

    #[test]
    fn test_series_resolves_shared_handles() {
        let registry = Registry::new();
        let metrics = QueryMetrics::create(&registry, &MetricsOptions::new()).unwrap();
        let labels = metrics.labels("SELECT", "users");

        let a = metrics.series(&labels).unwrap();
        let b = metrics.series(&labels).unwrap();
        a.rows.increment_by(3);
        assert_eq!(b.rows.get(), 3);
        assert_eq!(metrics.rows().len(), 1);
    }
}
