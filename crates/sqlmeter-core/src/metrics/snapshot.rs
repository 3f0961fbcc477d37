//! Point-in-time metric snapshots.
//!
//! These types are what [`Registry::snapshot`](super::Registry::snapshot)
//! returns, suitable for JSON output or assertions in tests.

use serde::{Deserialize, Serialize};

use super::family::MetricKind;
use super::labels::LabelSet;

/// Snapshot of a whole metric family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Metric name.
    pub name: String,
    /// Help text.
    pub help: String,
    /// Instrument kind.
    pub kind: MetricKind,
    /// One entry per series.
    pub series: Vec<SeriesSnapshot>,
}

impl MetricSnapshot {
    /// Find the series addressed by `labels`.
    pub fn find(&self, labels: &LabelSet) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|s| &s.labels == labels)
    }
}

/// Snapshot of a single series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    /// Series labels in stored order.
    pub labels: LabelSet,
    /// Current value.
    pub value: SeriesValue,
}

/// Value of a series at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeriesValue {
    /// Counter value.
    Counter {
        /// Count.
        value: u64,
    },
    /// Gauge value.
    Gauge {
        /// Current level.
        value: i64,
    },
    /// Summary state.
    Summary {
        /// Number of observations.
        count: u64,
        /// Sum of observations.
        sum: f64,
        /// Estimated quantiles.
        quantiles: Vec<QuantileValue>,
    },
}

/// One estimated quantile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileValue {
    /// Quantile in `0.0..=1.0`.
    pub quantile: f64,
    /// Estimate, absent when nothing was observed.
    pub value: Option<f64>,
}
