//! Metrics collection infrastructure.
//!
//! This module provides labelled counters, gauges and summaries grouped into
//! families, a registry owning them, and Prometheus text export.
//!
//! # Usage
//!
//! ```ignore
//! use sqlmeter_core::metrics::{new_shared_registry, LabelSet, SummaryOpts};
//!
//! let registry = new_shared_registry();
//! let rows = registry.counter("app_rows", "Rows read", &["table"])?;
//! rows.with_labels(&LabelSet::new().with("table", "users"))?.increment();
//!
//! let latency = registry.summary("app_latency", "Latency", SummaryOpts::default(), &[])?;
//! latency.with_labels(&LabelSet::new())?.observe(0.25);
//!
//! let prometheus_text = registry.to_prometheus();
//! ```

mod family;
mod labels;
mod registry;
mod series;
mod snapshot;
mod summary;

pub use family::{Descriptor, Family, MetricKind};
pub use labels::{Label, LabelSet, SeriesKey};
pub use registry::{new_shared_registry, Registry, SharedRegistry};
pub use series::{Counter, Gauge};
pub use snapshot::{MetricSnapshot, QuantileValue, SeriesSnapshot, SeriesValue};
pub use summary::{Summary, SummaryOpts, DEFAULT_QUANTILES, DEFAULT_SUMMARY_WINDOW};
