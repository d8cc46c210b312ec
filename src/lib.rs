//! # command-relay
//!
//! Shared command queue and live streaming relay for a single
//! remote-controlled robot.
//!
//! Any number of clients submit single-character commands over HTTP. Every
//! admitted command waits in one bounded queue and is streamed, one per
//! broadcast tick, to every observer that has finished its warm-up
//! handshake. The robot-side client is simply one such observer.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)                   Observers (text/plain stream)
//!     │                                   ▲
//!     ├── Rate limiter (api/)             │
//!     ├── REST Handlers (api/)     Lifecycle + stream (stream/)
//!     │                                   ▲
//!     ├── RelayService (service/) ── Broadcast loop (service/)
//!     │
//!     ├── CommandValidator (domain/)
//!     ├── CommandQueue (domain/)
//!     └── SubscriberRegistry (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod stream;
