//! Observer connections and their outbound sinks.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::RelayError;

/// Identifier of an observer connection.
///
/// Allocated from a monotonic counter owned by
/// [`super::SubscriberRegistry`], so ids never repeat within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frames buffered per observer before writes start failing.
pub const SINK_BUFFER_FRAMES: usize = 256;

/// Write half of an observer's stream.
///
/// Frames pushed here are yielded, in order, by the HTTP response body that
/// the transport owns. Writes never block. An observer that stops reading
/// fills its buffer and further frames are dropped with
/// [`RelayError::SinkFull`]; once the body is dropped every write fails with
/// [`RelayError::SinkClosed`].
#[derive(Debug, Clone)]
pub struct CommandSink {
    tx: mpsc::Sender<String>,
}

impl CommandSink {
    /// Creates a sink holding up to [`SINK_BUFFER_FRAMES`] unread frames,
    /// and the receiving end that feeds the response body.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<String>) {
        Self::with_capacity(SINK_BUFFER_FRAMES)
    }

    /// Creates a sink holding up to `capacity` unread frames (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queues `frame` for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::SinkFull`] if the observer has fallen behind,
    /// or [`RelayError::SinkClosed`] if the connection is gone.
    pub fn write(&self, id: SubscriberId, frame: &str) -> Result<(), RelayError> {
        self.tx.try_send(frame.to_owned()).map_err(|err| match err {
            TrySendError::Full(_) => RelayError::SinkFull(id),
            TrySendError::Closed(_) => RelayError::SinkClosed(id),
        })
    }

    /// Returns `true` once the receiving end has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One connected observer.
///
/// Shared as `Arc<Subscriber>` between the registry (for broadcast and
/// disconnect fan-out) and the connection's lifecycle task (for the
/// handshake and the readiness flip).
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    sink: CommandSink,
    ready: AtomicBool,
}

impl Subscriber {
    /// Creates a subscriber that is not yet eligible for broadcast.
    #[must_use]
    pub fn new(id: SubscriberId, sink: CommandSink) -> Self {
        Self {
            id,
            sink,
            ready: AtomicBool::new(false),
        }
    }

    /// Connection id.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the warm-up handshake has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Flips the subscriber to ready.
    ///
    /// Returns `false` if it was already ready; the flip happens at most once.
    pub fn mark_ready(&self) -> bool {
        self.ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Writes a frame to this subscriber's stream.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::SinkFull`] or [`RelayError::SinkClosed`], see
    /// [`CommandSink::write`].
    pub fn write(&self, frame: &str) -> Result<(), RelayError> {
        self.sink.write(self.id, frame)
    }
}
