//! Response body for an observer connection.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::{mpsc, oneshot};

/// Yields the frames written to a subscriber's sink.
///
/// Holds the sending half of a close signal: when the transport drops the
/// body (the observer went away), the paired [`oneshot::Receiver`] held by
/// the connection's lifecycle task resolves and the disconnect path runs.
#[derive(Debug)]
pub struct ObserverStream {
    frames: mpsc::Receiver<String>,
    _close_signal: oneshot::Sender<()>,
}

impl ObserverStream {
    /// Wraps a sink receiver and the close signal.
    #[must_use]
    pub fn new(frames: mpsc::Receiver<String>, close_signal: oneshot::Sender<()>) -> Self {
        Self {
            frames,
            _close_signal: close_signal,
        }
    }
}

impl Stream for ObserverStream {
    type Item = Result<String, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use futures_util::StreamExt;
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready};

    use super::*;

    #[test]
    fn yields_frames_in_write_order() {
        let (tx, rx) = mpsc::channel(8);
        let (close_tx, _close_rx) = oneshot::channel();
        let mut stream = task::spawn(ObserverStream::new(rx, close_tx));

        assert_pending!(stream.poll_next());
        for frame in ["P\n", "w\n"] {
            let _ = tx.try_send(frame.to_owned());
        }
        assert!(stream.is_woken());

        for expected in ["P\n", "w\n"] {
            match assert_ready!(stream.poll_next()) {
                Some(Ok(frame)) => assert_eq!(frame, expected),
                other => panic!("unexpected item: {other:?}"),
            }
        }
        assert_pending!(stream.poll_next());
    }

    #[test]
    fn ends_when_sink_is_gone() {
        let (tx, rx) = mpsc::channel::<String>(8);
        let (close_tx, _close_rx) = oneshot::channel();
        let mut stream = task::spawn(ObserverStream::new(rx, close_tx));

        drop(tx);
        assert!(assert_ready!(stream.poll_next()).is_none());
    }

    #[tokio::test]
    async fn dropping_stream_fires_close_signal() {
        let (_tx, rx) = mpsc::channel::<String>(8);
        let (close_tx, close_rx) = oneshot::channel();
        let stream = ObserverStream::new(rx, close_tx);

        drop(stream);
        assert!(close_rx.await.is_err());
    }

    #[tokio::test]
    async fn collects_buffered_frames() {
        let (tx, rx) = mpsc::channel(8);
        let (close_tx, _close_rx) = oneshot::channel();
        for frame in [" ", "f\n"] {
            let _ = tx.try_send(frame.to_owned());
        }
        drop(tx);

        let frames: Vec<String> = ObserverStream::new(rx, close_tx)
            .filter_map(|item| async move { item.ok() })
            .collect()
            .await;
        assert_eq!(frames, vec![" ".to_owned(), "f\n".to_owned()]);
    }
}
