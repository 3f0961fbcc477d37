//! Central metrics registry.
//!
//! The registry owns every metric family registered against it and renders
//! them in the Prometheus text exposition format.

use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::RwLock;

use super::family::{Descriptor, Family, MetricKind};
use super::labels::{is_valid_label_name, is_valid_metric_name, LabelSet};
use super::series::{Counter, Gauge};
use super::snapshot::{MetricSnapshot, QuantileValue, SeriesSnapshot, SeriesValue};
use super::summary::{Summary, SummaryOpts};
use crate::error::Error;

/// A registered family of any kind.
#[derive(Debug, Clone)]
enum Collector {
    Counter(Family<Counter>),
    Gauge(Family<Gauge>),
    Summary(Family<Summary>),
}

impl Collector {
    fn descriptor(&self) -> &Descriptor {
        match self {
            Collector::Counter(f) => f.descriptor(),
            Collector::Gauge(f) => f.descriptor(),
            Collector::Summary(f) => f.descriptor(),
        }
    }
}

/// Registry of metric families.
///
/// Families are kept in registration order, which is also the order of the
/// exposition output.
#[derive(Debug)]
pub struct Registry {
    collectors: RwLock<Vec<Collector>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            collectors: RwLock::new(Vec::new()),
        }
    }

    /// Register a counter family.
    pub fn counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Family<Counter>, Error> {
        let descriptor = describe(name, help, MetricKind::Counter, label_names)?;
        let family = Family::new(descriptor, Counter::new);
        self.register(Collector::Counter(family.clone()))?;
        Ok(family)
    }

    /// Register a gauge family.
    pub fn gauge(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Family<Gauge>, Error> {
        let descriptor = describe(name, help, MetricKind::Gauge, label_names)?;
        let family = Family::new(descriptor, Gauge::new);
        self.register(Collector::Gauge(family.clone()))?;
        Ok(family)
    }

    /// Register a summary family.
    ///
    /// `quantile` is reserved as a label name for summaries.
    pub fn summary(
        &self,
        name: &str,
        help: &str,
        opts: SummaryOpts,
        label_names: &[&str],
    ) -> Result<Family<Summary>, Error> {
        opts.validate()?;
        if let Some(reserved) = label_names.iter().find(|n| **n == "quantile") {
            return Err(Error::InvalidLabelName {
                metric: name.to_string(),
                label: reserved.to_string(),
            });
        }
        let descriptor = describe(name, help, MetricKind::Summary, label_names)?;
        let family = Family::new(descriptor, move || Summary::new(&opts));
        self.register(Collector::Summary(family.clone()))?;
        Ok(family)
    }

    fn register(&self, collector: Collector) -> Result<(), Error> {
        let mut collectors = self.collectors.write();
        let name = &collector.descriptor().name;
        if collectors.iter().any(|c| &c.descriptor().name == name) {
            return Err(Error::DuplicateMetric(name.clone()));
        }
        tracing::debug!(
            metric = %name,
            kind = collector.descriptor().kind.as_str(),
            "registered metric"
        );
        collectors.push(collector);
        Ok(())
    }

    /// Names of all registered families, in registration order.
    pub fn metric_names(&self) -> Vec<String> {
        self.collectors
            .read()
            .iter()
            .map(|c| c.descriptor().name.clone())
            .collect()
    }

    /// Take a snapshot of every family.
    pub fn snapshot(&self) -> Vec<MetricSnapshot> {
        self.collectors.read().iter().map(snapshot_of).collect()
    }

    /// Export to Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        for collector in self.collectors.read().iter() {
            // Writing to a String cannot fail.
            let _ = write_collector(&mut out, collector);
        }
        out
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics registry handle.
pub type SharedRegistry = Arc<Registry>;

/// Create a new shared metrics registry.
pub fn new_shared_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

fn describe(
    name: &str,
    help: &str,
    kind: MetricKind,
    label_names: &[&str],
) -> Result<Descriptor, Error> {
    if !is_valid_metric_name(name) {
        return Err(Error::InvalidMetricName(name.to_string()));
    }
    for (i, label) in label_names.iter().enumerate() {
        if !is_valid_label_name(label) || label_names[..i].contains(label) {
            return Err(Error::InvalidLabelName {
                metric: name.to_string(),
                label: label.to_string(),
            });
        }
    }
    Ok(Descriptor {
        name: name.to_string(),
        help: help.to_string(),
        kind,
        label_names: label_names.iter().map(|s| s.to_string()).collect(),
    })
}

fn snapshot_of(collector: &Collector) -> MetricSnapshot {
    let descriptor = collector.descriptor();
    let series = match collector {
        Collector::Counter(family) => family
            .series()
            .into_iter()
            .map(|(labels, c)| SeriesSnapshot {
                labels,
                value: SeriesValue::Counter { value: c.get() },
            })
            .collect(),
        Collector::Gauge(family) => family
            .series()
            .into_iter()
            .map(|(labels, g)| SeriesSnapshot {
                labels,
                value: SeriesValue::Gauge { value: g.get() },
            })
            .collect(),
        Collector::Summary(family) => family
            .series()
            .into_iter()
            .map(|(labels, s)| SeriesSnapshot {
                labels,
                value: SeriesValue::Summary {
                    count: s.count(),
                    sum: s.sum(),
                    quantiles: s
                        .quantile_values()
                        .into_iter()
                        .map(|(quantile, value)| QuantileValue { quantile, value })
                        .collect(),
                },
            })
            .collect(),
    };

    MetricSnapshot {
        name: descriptor.name.clone(),
        help: descriptor.help.clone(),
        kind: descriptor.kind,
        series,
    }
}

fn write_collector(out: &mut String, collector: &Collector) -> std::fmt::Result {
    let descriptor = collector.descriptor();
    let name = match descriptor.kind {
        MetricKind::Counter => format!("{}_total", descriptor.name),
        _ => descriptor.name.clone(),
    };

    writeln!(out, "# HELP {} {}", name, escape_help(&descriptor.help))?;
    writeln!(out, "# TYPE {} {}", name, descriptor.kind.as_str())?;

    match collector {
        Collector::Counter(family) => {
            for (labels, counter) in family.series() {
                writeln!(out, "{}{} {}", name, braces(&labels), counter.get())?;
            }
        }
        Collector::Gauge(family) => {
            for (labels, gauge) in family.series() {
                writeln!(out, "{}{} {}", name, braces(&labels), gauge.get())?;
            }
        }
        Collector::Summary(family) => {
            for (labels, summary) in family.series() {
                for (q, value) in summary.quantile_values() {
                    let mut quantile = format!("quantile=\"{}\"", format_value(q));
                    if !labels.is_empty() {
                        quantile.push(',');
                        quantile.push_str(&labels.to_string());
                    }
                    let value = value.map_or_else(|| "NaN".to_string(), format_value);
                    writeln!(out, "{}{{{}}} {}", name, quantile, value)?;
                }
                writeln!(
                    out,
                    "{}_sum{} {}",
                    name,
                    braces(&labels),
                    format_value(summary.sum())
                )?;
                writeln!(out, "{}_count{} {}", name, braces(&labels), summary.count())?;
            }
        }
    }

    out.push('\n');
    Ok(())
}

fn braces(labels: &LabelSet) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", labels)
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a sample value; integral values are printed without a fraction.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "+" } else { "-" };
        format!("{}Inf", sign)
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
