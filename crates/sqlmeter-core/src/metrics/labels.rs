//! Labels and label sets.
//!
//! A [`LabelSet`] keeps its labels in insertion order for output, while its
//! identity (the series it addresses) ignores ordering: two sets with the
//! same `(name, value)` pairs map to the same [`SeriesKey`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    name: String,
    value: String,
}

impl Label {
    /// Create a new label.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Label name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Label value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered collection of labels identifying one series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self { labels: Vec::new() }
    }

    /// Append a label.
    pub fn push(&mut self, label: Label) {
        self.labels.push(label);
    }

    /// Append a label, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push(Label::new(name, value));
        self
    }

    /// Iterate over the labels in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    /// Iterate over the label names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(Label::name)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the set carries no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Order-insensitive identity of this set.
    pub fn key(&self) -> SeriesKey {
        let mut pairs: Vec<(String, String)> = self
            .labels
            .iter()
            .map(|l| (l.name.clone(), l.value.clone()))
            .collect();
        pairs.sort();
        SeriesKey(pairs)
    }
}

impl PartialEq for LabelSet {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for LabelSet {}

impl FromIterator<Label> for LabelSet {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Label>> for LabelSet {
    fn from(labels: Vec<Label>) -> Self {
        Self { labels }
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

/// Renders as `name="value",...` with Prometheus escaping.
impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}=\"{}\"", label.name, escape_label_value(&label.value))?;
        }
        Ok(())
    }
}

/// Sorted `(name, value)` pairs; the identity of a series within a family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey(Vec<(String, String)>);

/// Escape a label value for the text exposition format.
pub(crate) fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Whether `name` is a valid metric name.
pub(crate) fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Whether `name` is a valid, non-reserved label name.
pub(crate) fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
