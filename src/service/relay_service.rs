//! Relay service: owns the queue and registry and implements every
//! operation the HTTP layer and the background tasks need.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::status::{RelayStatus, process_memory_bytes};
use crate::config::RelayConfig;
use crate::domain::{
    Command, CommandQueue, CommandSink, CommandValidator, RandomSource, Subscriber,
    SubscriberId, SubscriberRegistry, ThreadRandom,
};
use crate::error::RelayError;

/// Frame written to every other observer when one disconnects.
pub const DISCONNECT_FRAME: &str = "\t";

/// Shared admin credential. Never printed.
struct AdminSecret(Option<String>);

impl AdminSecret {
    fn matches(&self, candidate: Option<&str>) -> bool {
        match (self.0.as_deref(), candidate) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }
}

impl fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.0.is_some() { "<set>" } else { "<unset>" };
        f.debug_tuple("AdminSecret").field(&state).finish()
    }
}

/// Outcome of a successful admin reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSummary {
    /// Subscribers dropped from the registry.
    pub subscribers_removed: usize,
    /// Pending commands discarded.
    pub commands_removed: usize,
}

/// Process-wide relay state and the operations on it.
///
/// Constructed once by `main` and shared as `Arc<RelayService>` with every
/// handler, the broadcast loop and each connection's lifecycle task.
#[derive(Debug)]
pub struct RelayService {
    queue: Arc<CommandQueue>,
    registry: Arc<SubscriberRegistry>,
    validator: CommandValidator,
    admin_secret: AdminSecret,
}

impl RelayService {
    /// Creates a service from configuration, using the thread-local RNG for
    /// the special-action gate.
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_random(config, Box::new(ThreadRandom))
    }

    /// Creates a service with an explicit random source.
    #[must_use]
    pub fn with_random(config: &RelayConfig, random: Box<dyn RandomSource>) -> Self {
        Self {
            queue: Arc::new(CommandQueue::new(config.queue_capacity)),
            registry: Arc::new(SubscriberRegistry::new()),
            validator: CommandValidator::new(random, config.special_action_probability),
            admin_secret: AdminSecret(config.admin_secret.clone()),
        }
    }

    /// Returns a reference to the command queue.
    #[must_use]
    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    /// Returns a reference to the subscriber registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Validates `raw` and appends it to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidCommand`], [`RelayError::NotAdmitted`] or
    /// [`RelayError::QueueFull`]; rejections never touch the queue.
    pub async fn submit(&self, raw: &str) -> Result<Command, RelayError> {
        match self.validator.submit(raw, &self.queue).await {
            Ok(command) => {
                tracing::debug!(%command, "command admitted");
                Ok(command)
            }
            Err(err) => {
                tracing::debug!(raw, reason = err.reason(), "command rejected");
                Err(err)
            }
        }
    }

    /// Registers a new observer that is not yet eligible for broadcast.
    ///
    /// Returns the subscriber handle and the receiving end of its sink.
    pub async fn open_subscriber(&self) -> (Arc<Subscriber>, mpsc::Receiver<String>) {
        let (sink, rx) = CommandSink::channel();
        let subscriber = self.registry.register(sink).await;
        tracing::info!(id = %subscriber.id(), "subscriber connected");
        (subscriber, rx)
    }

    /// Runs the disconnect path for `id`: writes a tab to every other
    /// registered observer, then removes `id` from the registry.
    ///
    /// Returns the number of peers notified. Safe to call for an id that is
    /// no longer registered.
    pub async fn disconnect(&self, id: SubscriberId) -> usize {
        let notified = self
            .registry
            .for_each_other(id, |peer| {
                if let Err(err) = peer.write(DISCONNECT_FRAME) {
                    tracing::debug!(%err, "disconnect notice not delivered");
                }
            })
            .await;
        let removed = self.registry.remove(id).await;
        tracing::info!(%id, notified, removed, "subscriber disconnected");
        notified
    }

    /// One broadcast step.
    ///
    /// Dequeues at most one command and writes its frame to every ready
    /// observer. Commands stay queued while no observer is ready. A failed
    /// write affects only that observer.
    ///
    /// The registry read lock is held from the readiness check through the
    /// fan-out, so a disconnect cannot strand a dequeued command.
    pub async fn broadcast_tick(&self) -> Option<Command> {
        let ready = self.registry.ready().await;
        if ready.is_empty() {
            return None;
        }
        let command = self.queue.drain().await?;
        let frame = command.frame();
        let delivered = ready.for_each(|subscriber| {
            if let Err(err) = subscriber.write(&frame) {
                tracing::debug!(%err, "broadcast write dropped");
            }
        });
        drop(ready);
        tracing::trace!(%command, delivered, "command broadcast");
        Some(command)
    }

    /// Checks `key` against the configured admin secret.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Unauthorized`] on a missing or wrong key, or
    /// when no secret is configured.
    pub fn authorize(&self, key: Option<&str>) -> Result<(), RelayError> {
        if self.admin_secret.matches(key) {
            Ok(())
        } else {
            tracing::warn!("admin call refused");
            Err(RelayError::Unauthorized)
        }
    }

    /// Clears the registry and the queue.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Unauthorized`] without mutating anything if
    /// `key` does not match.
    pub async fn reset(&self, key: Option<&str>) -> Result<ResetSummary, RelayError> {
        self.authorize(key)?;
        let subscribers_removed = self.registry.clear().await;
        let commands_removed = self.queue.clear().await;
        tracing::info!(subscribers_removed, commands_removed, "relay reset");
        Ok(ResetSummary {
            subscribers_removed,
            commands_removed,
        })
    }

    /// Snapshot of memory usage, observers and pending commands.
    pub async fn status(&self) -> RelayStatus {
        RelayStatus {
            memory_bytes: process_memory_bytes(),
            subscribers: self.registry.all().await,
            commands: self.queue.snapshot().await,
        }
    }

    /// Pending commands, head first.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Unauthorized`] if `key` does not match.
    pub async fn list_commands(&self, key: Option<&str>) -> Result<Vec<Command>, RelayError> {
        self.authorize(key)?;
        Ok(self.queue.snapshot().await)
    }
}
