//! Labelled metric families.
//!
//! A [`Family`] is one named instrument declared with a fixed set of label
//! names. Concrete series are created lazily the first time a label set is
//! seen and shared by every later caller using an equal set.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::labels::{LabelSet, SeriesKey};
use crate::error::Error;

/// Kind of instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Monotonic counter.
    Counter,
    /// Up/down gauge.
    Gauge,
    /// Quantile summary.
    Summary,
}

impl MetricKind {
    /// Name used in `# TYPE` lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Summary => "summary",
        }
    }
}

/// Static description of a family.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Metric name.
    pub name: String,
    /// Human readable description.
    pub help: String,
    /// Instrument kind.
    pub kind: MetricKind,
    /// Declared label names, in declaration order.
    pub label_names: Vec<String>,
}

struct FamilyInner<S> {
    descriptor: Descriptor,
    series: DashMap<SeriesKey, (LabelSet, Arc<S>)>,
    init: Box<dyn Fn() -> S + Send + Sync>,
}

/// A named instrument producing one series per label set.
///
/// Cloning a family is cheap; clones address the same series.
pub struct Family<S> {
    inner: Arc<FamilyInner<S>>,
}

impl<S> Clone for Family<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Family<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Family")
            .field("descriptor", &self.inner.descriptor)
            .field("series", &self.inner.series.len())
            .finish()
    }
}

impl<S> Family<S> {
    pub(crate) fn new(
        descriptor: Descriptor,
        init: impl Fn() -> S + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(FamilyInner {
                descriptor,
                series: DashMap::new(),
                init: Box::new(init),
            }),
        }
    }

    /// Family description.
    pub fn descriptor(&self) -> &Descriptor {
        &self.inner.descriptor
    }

    /// Metric name.
    pub fn name(&self) -> &str {
        &self.inner.descriptor.name
    }

    /// Get or create the series for `labels`.
    ///
    /// The label set must carry exactly the declared label names, in any
    /// order.
    pub fn with_labels(&self, labels: &LabelSet) -> Result<Arc<S>, Error> {
        self.check_labels(labels)?;
        let key = labels.key();

        if let Some(entry) = self.inner.series.get(&key) {
            return Ok(Arc::clone(&entry.1));
        }

        let entry = self
            .inner
            .series
            .entry(key)
            .or_insert_with(|| (labels.clone(), Arc::new((self.inner.init)())));
        Ok(Arc::clone(&entry.1))
    }

    /// Look up an existing series without creating it.
    pub fn get(&self, labels: &LabelSet) -> Option<Arc<S>> {
        self.inner
            .series
            .get(&labels.key())
            .map(|entry| Arc::clone(&entry.1))
    }

    /// Number of series created so far.
    pub fn len(&self) -> usize {
        self.inner.series.len()
    }

    /// Whether no series has been created yet.
    pub fn is_empty(&self) -> bool {
        self.inner.series.is_empty()
    }

    /// All series, ordered by label identity.
    pub fn series(&self) -> Vec<(LabelSet, Arc<S>)> {
        let mut all: Vec<(SeriesKey, LabelSet, Arc<S>)> = self
            .inner
            .series
            .iter()
            .map(|entry| {
                let (labels, series) = entry.value();
                (entry.key().clone(), labels.clone(), Arc::clone(series))
            })
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all.into_iter()
            .map(|(_, labels, series)| (labels, series))
            .collect()
    }

    fn check_labels(&self, labels: &LabelSet) -> Result<(), Error> {
        let declared = &self.inner.descriptor.label_names;
        let matches = labels.len() == declared.len()
            && declared
                .iter()
                .all(|name| labels.names().filter(|n| *n == name.as_str()).count() == 1);

        if matches {
            Ok(())
        } else {
            Err(Error::LabelMismatch {
                metric: self.inner.descriptor.name.clone(),
                expected: declared.join(","),
                got: labels.names().collect::<Vec<_>>().join(","),
            })
        }
    }
}
