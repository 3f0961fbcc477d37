//! sqlmeter core - metric primitives, registry and clocks.
//!
//! This crate provides the storage side of sqlmeter's instrumentation: the
//! registry the query middleware binds its instruments to.

pub mod clock;
pub mod error;
pub mod metrics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;

// Metrics exports
pub use metrics::{
    new_shared_registry, Counter, Family, Gauge, Label, LabelSet, MetricKind, MetricSnapshot,
    Registry, SeriesValue, SharedRegistry, Summary, SummaryOpts,
};
