//! Observer streaming layer: connection lifecycle and the long-lived
//! `text/plain` response body.
//!
//! The endpoint at `/actions` hands each observer a live stream that starts
//! with the warm-up handshake and then carries one lower-cased command per
//! line as the broadcast loop drains the queue.

pub mod handler;
pub mod lifecycle;
pub mod observer_stream;

pub use lifecycle::{ConnectionPhase, HANDSHAKE, open_observer};
pub use observer_stream::ObserverStream;
