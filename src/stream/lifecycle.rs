//! Per-connection lifecycle: warm-up handshake, readiness, teardown.
//!
//! Each observer connection gets its own task running a small state machine:
//!
//! ```text
//! Handshaking(0) ─▶ Handshaking(1) ─▶ … ─▶ Ready ─▶ Closed
//!        │                 │                  │
//!        └──────── close ──┴──────────────────┘
//! ```
//!
//! The only suspension points are the scripted delays and, once ready, the
//! wait for the connection to close. A close observed in any state moves
//! straight to `Closed`, after which the disconnect path runs exactly once.
//! A handshake frame dropped because the observer is not reading does not
//! end the connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use super::ObserverStream;
use crate::domain::Subscriber;
use crate::error::RelayError;
use crate::service::RelayService;

/// One scripted handshake step: write `frame` (if any), then wait `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeStep {
    /// Frame written when the step starts.
    pub frame: Option<&'static str>,
    /// Pause before the next step.
    pub delay: Duration,
}

/// Warm-up script run on every new observer before it becomes ready.
///
/// The frames are key presses for the robot-side client: release the
/// e-stop, power on, stand up. The final pause lets the robot settle.
pub const HANDSHAKE: [HandshakeStep; 4] = [
    HandshakeStep {
        frame: Some(" "),
        delay: Duration::from_millis(500),
    },
    HandshakeStep {
        frame: Some("P\n"),
        delay: Duration::from_millis(500),
    },
    HandshakeStep {
        frame: Some("f\n"),
        delay: Duration::from_millis(10_000),
    },
    HandshakeStep {
        frame: None,
        delay: Duration::from_millis(1_500),
    },
];

/// Total time from connection open to readiness.
#[must_use]
pub fn warm_up_duration() -> Duration {
    HANDSHAKE.iter().map(|step| step.delay).sum()
}

/// State of one observer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Running handshake step `n`.
    Handshaking(usize),
    /// Eligible for broadcast.
    Ready,
    /// Connection gone; the disconnect path is due.
    Closed,
}

/// Registers a new observer, spawns its lifecycle task and returns the
/// response body stream.
pub async fn open_observer(service: Arc<RelayService>) -> ObserverStream {
    let (subscriber, frames) = service.open_subscriber().await;
    let (close_tx, close_rx) = oneshot::channel();
    tokio::spawn(run_lifecycle(service, subscriber, close_rx));
    ObserverStream::new(frames, close_tx)
}

/// Drives one connection from first handshake step to teardown.
///
/// `closed` resolves when the observer's response body is dropped.
pub async fn run_lifecycle(
    service: Arc<RelayService>,
    subscriber: Arc<Subscriber>,
    mut closed: oneshot::Receiver<()>,
) {
    let mut phase = ConnectionPhase::Handshaking(0);
    while phase != ConnectionPhase::Closed {
        phase = advance(phase, &subscriber, &mut closed).await;
    }
    service.disconnect(subscriber.id()).await;
}

/// Performs the work of `phase` and returns the next phase.
async fn advance(
    phase: ConnectionPhase,
    subscriber: &Subscriber,
    closed: &mut oneshot::Receiver<()>,
) -> ConnectionPhase {
    match phase {
        ConnectionPhase::Handshaking(index) => {
            let Some(step) = HANDSHAKE.get(index) else {
                if subscriber.mark_ready() {
                    tracing::info!(id = %subscriber.id(), "subscriber ready");
                }
                return ConnectionPhase::Ready;
            };
            if let Some(frame) = step.frame {
                match subscriber.write(frame) {
                    Ok(()) => {}
                    Err(RelayError::SinkClosed(_)) => {
                        tracing::debug!(step = index, "observer gone during handshake");
                        return ConnectionPhase::Closed;
                    }
                    Err(err) => tracing::debug!(%err, step = index, "handshake frame dropped"),
                }
            }
            tokio::select! {
                () = tokio::time::sleep(step.delay) => ConnectionPhase::Handshaking(index + 1),
                _ = &mut *closed => ConnectionPhase::Closed,
            }
        }
        ConnectionPhase::Ready => {
            let _ = (&mut *closed).await;
            ConnectionPhase::Closed
        }
        ConnectionPhase::Closed => ConnectionPhase::Closed,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::domain::CommandSink;
    use crate::service::DISCONNECT_FRAME;
    use futures_util::StreamExt;
    use tokio::time::Instant;

    fn service() -> Arc<RelayService> {
        Arc::new(RelayService::new(&RelayConfig::default()))
    }

    async fn next_frame(stream: &mut ObserverStream) -> String {
        match stream.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(never)) => match never {},
            None => panic!("stream ended"),
        }
    }

    #[test]
    fn warm_up_is_twelve_and_a_half_seconds() {
        assert_eq!(warm_up_duration(), Duration::from_millis(12_500));
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_frames_arrive_on_schedule() {
        let svc = service();
        let start = Instant::now();
        let mut stream = open_observer(Arc::clone(&svc)).await;

        assert_eq!(svc.registry().len().await, 1, "visible before ready");

        assert_eq!(next_frame(&mut stream).await, " ");
        assert!(start.elapsed() < Duration::from_millis(500));

        assert_eq!(next_frame(&mut stream).await, "P\n");
        let p_at = start.elapsed();
        assert!(p_at >= Duration::from_millis(500));

        assert_eq!(next_frame(&mut stream).await, "f\n");
        let f_at = start.elapsed();
        assert!(f_at >= p_at + Duration::from_millis(500));

        let ids = svc.registry().all().await;
        let Some(id) = ids.first().copied() else {
            panic!("subscriber registered");
        };
        tokio::time::sleep(Duration::from_millis(11_000)).await;
        assert_eq!(svc.registry().ready_count().await, 0, "not ready before warm-up ends");

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(svc.registry().ready_count().await, 1);
        assert!(svc.registry().contains(id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn close_during_handshake_runs_disconnect_once() {
        let svc = service();
        let mut peer = open_observer(Arc::clone(&svc)).await;
        let mut leaving = open_observer(Arc::clone(&svc)).await;
        assert_eq!(next_frame(&mut peer).await, " ");
        assert_eq!(next_frame(&mut leaving).await, " ");

        drop(leaving);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(svc.registry().len().await, 1);
        assert_eq!(next_frame(&mut peer).await, DISCONNECT_FRAME);

        // The peer's own handshake carries on undisturbed.
        assert_eq!(next_frame(&mut peer).await, "P\n");

        tokio::time::sleep(Duration::from_secs(20)).await;
        let mut extra_tabs = 0;
        while let Some(frame) = futures_util::FutureExt::now_or_never(peer.next()).flatten() {
            if matches!(frame, Ok(ref f) if f == DISCONNECT_FRAME) {
                extra_tabs += 1;
            }
        }
        assert_eq!(extra_tabs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn close_after_ready_notifies_peer() {
        let svc = service();
        let mut peer = open_observer(Arc::clone(&svc)).await;
        let leaving = open_observer(Arc::clone(&svc)).await;

        tokio::time::sleep(warm_up_duration() + Duration::from_millis(10)).await;
        assert_eq!(svc.registry().ready_count().await, 2);

        drop(leaving);
        tokio::time::sleep(Duration::from_millis(1)).await;

        for expected in [" ", "P\n", "f\n", DISCONNECT_FRAME] {
            assert_eq!(next_frame(&mut peer).await, expected);
        }
        assert_eq!(svc.registry().len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_commands_wait_for_handshake() {
        let svc = service();
        assert!(svc.submit("A").await.is_ok());
        let handle =
            crate::service::spawn_broadcast_loop(Arc::clone(&svc), Duration::from_millis(10));

        let start = Instant::now();
        let mut stream = open_observer(Arc::clone(&svc)).await;
        for expected in [" ", "P\n", "f\n"] {
            assert_eq!(next_frame(&mut stream).await, expected);
        }
        assert_eq!(next_frame(&mut stream).await, "a\n");
        assert!(start.elapsed() >= warm_up_duration());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn close_after_registry_cleared_is_harmless() {
        let svc = service();
        let stream = open_observer(Arc::clone(&svc)).await;
        assert_eq!(svc.registry().clear().await, 1);

        drop(stream);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(svc.registry().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_reader_still_becomes_ready() {
        let svc = service();
        let (sink, mut frames) = CommandSink::with_capacity(1);
        let subscriber = svc.registry().register(sink).await;
        let (_close_tx, close_rx) = oneshot::channel();
        tokio::spawn(run_lifecycle(
            Arc::clone(&svc),
            Arc::clone(&subscriber),
            close_rx,
        ));

        tokio::time::sleep(warm_up_duration() + Duration::from_millis(10)).await;
        assert!(subscriber.is_ready());
        assert!(svc.registry().contains(subscriber.id()).await);
        assert_eq!(frames.try_recv().ok().as_deref(), Some(" "));
        assert!(frames.try_recv().is_err(), "later frames were dropped");
    }
}
