//! Row stream decorator.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::stream::{FusedStream, Stream};
use pin_project::pin_project;

use crate::probe::{QueryProbe, StreamEvent};

/// Forwards every item of the wrapped row stream unchanged while feeding the
/// query's [`QueryProbe`].
///
/// The upstream stream is only polled when this stream is polled. After an
/// error or the end of the stream it yields `None` without touching upstream
/// again. Dropping it early releases the query's in-flight gauge and counts
/// the query as errored.
#[derive(Debug)]
#[pin_project]
pub struct InstrumentedStream<S> {
    #[pin]
    inner: S,
    probe: QueryProbe,
}

impl<S> InstrumentedStream<S> {
    pub(crate) fn new(inner: S, probe: QueryProbe) -> Self {
        Self { inner, probe }
    }

    /// The probe recording this query.
    pub fn probe(&self) -> &QueryProbe {
        &self.probe
    }
}

impl<S, R, E> Stream for InstrumentedStream<S>
where
    S: Stream<Item = Result<R, E>>,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if this.probe.is_finished() {
            return Poll::Ready(None);
        }

        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(row)) => {
                this.probe.handle(StreamEvent::Row);
                Poll::Ready(Some(Ok(row)))
            }
            Some(Err(e)) => {
                this.probe.handle(StreamEvent::Error);
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.probe.handle(StreamEvent::Complete);
                Poll::Ready(None)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.probe.is_finished() {
            (0, Some(0))
        } else {
            self.inner.size_hint()
        }
    }
}

impl<S, R, E> FusedStream for InstrumentedStream<S>
where
    S: Stream<Item = Result<R, E>>,
{
    fn is_terminated(&self) -> bool {
        self.probe.is_finished()
    }
}
