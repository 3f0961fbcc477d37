//! Per-query label sets.

use std::sync::Arc;

use sqlmeter_core::metrics::{Label, LabelSet};
use sqlmeter_lang::QueryLabel;

/// Labels for one query: the configured defaults plus `type` and `table`.
///
/// The default labels are shared between every query of a middleware, so
/// building one of these only allocates the two derived values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLabels {
    defaults: Arc<[Label]>,
    kind: String,
    table: String,
}

impl QueryLabels {
    /// Create labels for a statement of `kind` against `table`.
    pub fn new(defaults: Arc<[Label]>, kind: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            defaults,
            kind: kind.into(),
            table: table.into(),
        }
    }

    pub(crate) fn from_extracted(defaults: Arc<[Label]>, label: QueryLabel) -> Self {
        Self::new(defaults, label.method.as_str(), label.table)
    }

    /// Value of the `type` label.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Value of the `table` label.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn defaults(&self) -> &[Label] {
        &self.defaults
    }

    /// Defaults first, then `type`, then `table`.
    pub fn to_label_set(&self) -> LabelSet {
        self.defaults
            .iter()
            .cloned()
            .chain([
                Label::new("type", self.kind.as_str()),
                Label::new("table", self.table.as_str()),
            ])
            .collect()
    }
}
