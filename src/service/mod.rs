//! Service layer: relay orchestration.
//!
//! [`RelayService`] owns the command queue and the subscriber registry and
//! exposes submission, broadcast, disconnect and admin operations. The
//! broadcast loop drives it on a fixed cadence.

pub mod broadcast;
pub mod relay_service;
pub mod status;

pub use broadcast::spawn_broadcast_loop;
pub use relay_service::{DISCONNECT_FRAME, RelayService, ResetSummary};
pub use status::RelayStatus;
