//! Channel transport between a pipeline task and its SSE response.
//!
//! The sink half is owned by the pipeline task, the stream half by the HTTP
//! response. Dropping the sink closes the stream, so the channel is closed
//! exactly once on every pipeline exit path. Dropping the stream (caller
//! disconnect) makes further sends fail, which the pipeline observes as a
//! cancellation signal.

use super::events::PipelineEvent;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;

/// The receiving half of the stream was dropped; the caller is gone.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Event stream closed by receiver")]
pub struct StreamClosed;

/// Write half: one event per send, close on drop.
pub struct EventSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl EventSink {
    pub async fn send(&self, event: PipelineEvent) -> Result<(), StreamClosed> {
        self.tx.send(event).await.map_err(|_| StreamClosed)
    }

    /// Whether the caller has disconnected.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read half: yields events until the sink is dropped.
pub struct EventStream {
    rx: mpsc::Receiver<PipelineEvent>,
}

impl Stream for EventStream {
    type Item = PipelineEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Create a bounded event channel for one pipeline run.
pub fn event_channel(capacity: usize) -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSink { tx }, EventStream { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn stream_ends_when_sink_is_dropped() {
        let (sink, mut stream) = event_channel(4);

        sink.send(PipelineEvent::status("working")).await.unwrap();
        sink.send(PipelineEvent::result(vec!["t1".into()]))
            .await
            .unwrap();
        drop(sink);

        assert_eq!(stream.next().await, Some(PipelineEvent::status("working")));
        assert_eq!(
            stream.next().await,
            Some(PipelineEvent::result(vec!["t1".into()]))
        );
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn send_fails_after_receiver_is_dropped() {
        let (sink, stream) = event_channel(4);
        drop(stream);

        assert!(sink.is_closed());
        assert_eq!(
            sink.send(PipelineEvent::status("working")).await,
            Err(StreamClosed)
        );
    }

    #[tokio::test]
    async fn sink_reports_open_while_receiver_lives() {
        let (sink, _stream) = event_channel(4);
        assert!(!sink.is_closed());
    }
}
