//! Per-query bookkeeping.
//!
//! A [`QueryProbe`] is created when a query starts and translates the events of
//! its row stream into metric updates. It guarantees the in-flight gauge is
//! released exactly once: on the first row, on a failure before any row, on
//! completion without rows, or when the probe is dropped early.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlmeter_core::Clock;

use crate::labels::QueryLabels;
use crate::metrics::QuerySeries;

/// Where a query is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Started, no row yet; the in-flight gauge is held.
    Inflight,
    /// At least one row delivered; the gauge has been released.
    FirstRowSeen,
    /// Completed, failed or abandoned. Further events are ignored.
    Finished,
}

/// Something observed on a query's row stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    /// A row was delivered.
    Row,
    /// The stream, or the call producing it, failed.
    Error,
    /// The stream ended normally.
    Complete,
    /// The consumer went away before a terminal event.
    Abandon,
}

/// Metric state machine for one query invocation.
#[derive(Debug)]
pub struct QueryProbe {
    labels: QueryLabels,
    series: QuerySeries,
    clock: Arc<dyn Clock>,
    slow_query_threshold: Duration,
    started_at: Instant,
    phase: Phase,
}

impl QueryProbe {
    /// Count the query as started and take the in-flight gauge.
    pub(crate) fn start(
        labels: QueryLabels,
        series: QuerySeries,
        clock: Arc<dyn Clock>,
        slow_query_threshold: Duration,
    ) -> Self {
        series.total.increment();
        series.inflight.increment();
        let started_at = clock.now();

        tracing::debug!(
            r#type = labels.kind(),
            table = labels.table(),
            "query started"
        );

        Self {
            labels,
            series,
            clock,
            slow_query_threshold,
            started_at,
            phase: Phase::Inflight,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Labels of the query being observed.
    pub fn labels(&self) -> &QueryLabels {
        &self.labels
    }

    /// Whether a terminal event has been handled.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Time since the query started, by the injected clock.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started_at)
    }

    /// Apply one stream event.
    pub fn handle(&mut self, event: StreamEvent) {
        if self.phase == Phase::Finished {
            return;
        }

        let elapsed = self.elapsed();
        match event {
            StreamEvent::Row => {
                self.series.rows.increment();
                if self.phase == Phase::Inflight {
                    self.series.inflight.decrement();
                    self.series.response_times.observe(elapsed.as_secs_f64());
                    self.check_slow(elapsed);
                    self.phase = Phase::FirstRowSeen;
                }
            }
            StreamEvent::Error | StreamEvent::Abandon => {
                self.series.errored.increment();
                self.series.completed_times.observe(elapsed.as_secs_f64());
                if self.phase == Phase::Inflight {
                    self.check_slow(elapsed);
                    self.series.inflight.decrement();
                }
                self.phase = Phase::Finished;

                if event == StreamEvent::Abandon {
                    tracing::debug!(
                        r#type = self.labels.kind(),
                        table = self.labels.table(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "query abandoned before completion"
                    );
                } else {
                    tracing::debug!(
                        r#type = self.labels.kind(),
                        table = self.labels.table(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "query failed"
                    );
                }
            }
            StreamEvent::Complete => {
                self.series.completed.increment();
                self.series.completed_times.observe(elapsed.as_secs_f64());
                if self.phase == Phase::Inflight {
                    self.series.inflight.decrement();
                }
                self.phase = Phase::Finished;

                tracing::debug!(
                    r#type = self.labels.kind(),
                    table = self.labels.table(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "query completed"
                );
            }
        }
    }

    fn check_slow(&self, elapsed: Duration) {
        if elapsed > self.slow_query_threshold {
            self.series.slow.increment();
            tracing::warn!(
                r#type = self.labels.kind(),
                table = self.labels.table(),
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_query_threshold.as_millis() as u64,
                "slow query"
            );
        }
    }
}

impl Drop for QueryProbe {
    fn drop(&mut self) {
        self.handle(StreamEvent::Abandon);
    }
}
