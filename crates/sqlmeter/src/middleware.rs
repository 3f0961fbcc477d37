//! The query middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use futures::stream::Stream;
use pin_project::pin_project;
use sqlmeter_core::{Clock, SystemClock};

use crate::config::MiddlewareConfig;
use crate::error::Result;
use crate::labels::QueryLabels;
use crate::metrics::QueryMetrics;
use crate::probe::{QueryProbe, StreamEvent};
use crate::query::Query;
use crate::stream::InstrumentedStream;

/// Records metrics for every query passed through [`QueryMiddleware::query`].
///
/// Cloning is cheap; clones record into the same instruments.
#[derive(Debug, Clone)]
pub struct QueryMiddleware {
    config: MiddlewareConfig,
    metrics: QueryMetrics,
    clock: Arc<dyn Clock>,
}

impl QueryMiddleware {
    /// Create a middleware measuring time with the system clock.
    pub fn new(config: MiddlewareConfig, metrics: QueryMetrics) -> Self {
        Self {
            config,
            metrics,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to measure durations.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Configuration this middleware was built with.
    pub fn config(&self) -> &MiddlewareConfig {
        &self.config
    }

    /// Instruments this middleware records into.
    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }

    /// Run `query` through `next`, recording metrics for its row stream.
    ///
    /// The query is rendered and classified before anything is recorded; if
    /// that fails, the error is returned and no metric changes. Otherwise the
    /// query is counted, the in-flight gauge is raised and `next` is invoked.
    /// Awaiting the returned future yields the instrumented row stream, or the
    /// error `next` produced, unchanged.
    pub fn query<Q, F, Fut, S, R, E>(&self, query: Q, next: F) -> Result<QueryFuture<Fut>>
    where
        Q: Query,
        F: FnOnce(Q) -> Fut,
        Fut: Future<Output = std::result::Result<S, E>>,
        S: Stream<Item = std::result::Result<R, E>>,
    {
        let sql = query.sql(self.config.engine.as_ref());
        let extracted = sqlmeter_lang::extract(&sql).map_err(|e| {
            tracing::debug!(
                engine = self.config.engine.name(),
                error = %e,
                "could not classify query"
            );
            e
        })?;

        let labels = QueryLabels::from_extracted(self.metrics.shared_default_labels(), extracted);
        let series = self.metrics.series(&labels)?;
        let probe = QueryProbe::start(
            labels,
            series,
            Arc::clone(&self.clock),
            self.config.slow_query_threshold,
        );

        Ok(QueryFuture {
            pending: next(query),
            probe: Some(probe),
        })
    }
}

/// Future returned by [`QueryMiddleware::query`].
///
/// Resolves to an [`InstrumentedStream`] once the wrapped call produces its
/// row stream. Dropping it before then counts the query as errored.
#[derive(Debug)]
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct QueryFuture<Fut> {
    #[pin]
    pending: Fut,
    probe: Option<QueryProbe>,
}

impl<Fut> QueryFuture<Fut> {
    /// The probe recording this query, until the future resolves.
    pub fn probe(&self) -> Option<&QueryProbe> {
        self.probe.as_ref()
    }
}

impl<Fut, S, R, E> Future for QueryFuture<Fut>
where
    Fut: Future<Output = std::result::Result<S, E>>,
    S: Stream<Item = std::result::Result<R, E>>,
{
    type Output = std::result::Result<InstrumentedStream<S>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let outcome = ready!(this.pending.poll(cx));
        let mut probe = match this.probe.take() {
            Some(probe) => probe,
            None => panic!("QueryFuture polled after completion"),
        };

        match outcome {
            Ok(stream) => Poll::Ready(Ok(InstrumentedStream::new(stream, probe))),
            Err(e) => {
                probe.handle(StreamEvent::Error);
                Poll::Ready(Err(e))
            }
        }
    }
}
