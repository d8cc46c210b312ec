//! Fixed-cadence broadcast loop.
//!
//! Every tick calls [`RelayService::broadcast_tick`], which moves at most one
//! command from the queue to the ready observers. The cadence therefore caps
//! how fast commands reach the robot, no matter how fast they arrive.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::RelayService;

/// Spawns the broadcast loop on the current runtime.
///
/// The task runs until aborted through the returned handle.
pub fn spawn_broadcast_loop(service: Arc<RelayService>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_ms = period.as_millis(), "broadcast loop started");
        loop {
            ticker.tick().await;
            service.broadcast_tick().await;
        }
    })
}
