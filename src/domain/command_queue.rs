//! Bounded FIFO of pending commands.
//!
//! [`CommandQueue`] is the single process-wide queue shared by every
//! submission handler (producers) and the broadcast loop (the only consumer).
//! It is guarded by a [`tokio::sync::Mutex`]; every operation holds the lock
//! for a constant-time step and never waits for capacity.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use super::Command;

/// Default queue bound.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// Capacity-bounded command FIFO.
///
/// # Invariants
///
/// - `len() <= capacity()` at all times.
/// - A full queue refuses new entries; existing entries are never evicted.
#[derive(Debug)]
pub struct CommandQueue {
    entries: Mutex<VecDeque<Command>>,
    capacity: usize,
}

impl CommandQueue {
    /// Creates an empty queue holding at most `capacity` commands.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends `command` at the tail.
    ///
    /// Returns `false` without touching the queue if it is already full.
    pub async fn enqueue(&self, command: Command) -> bool {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity {
            return false;
        }
        entries.push_back(command);
        true
    }

    /// Removes and returns the oldest command, or `None` when empty.
    pub async fn drain(&self) -> Option<Command> {
        self.entries.lock().await.pop_front()
    }

    /// Number of pending commands.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Empties the queue, returning how many commands were discarded.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let discarded = entries.len();
        entries.clear();
        discarded
    }

    /// Copy of the pending commands, head first.
    pub async fn snapshot(&self) -> Vec<Command> {
        self.entries.lock().await.iter().copied().collect()
    }

    /// Maximum number of pending commands.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fifo_order() {
        let queue = CommandQueue::default();
        assert!(queue.enqueue(Command::StrafeLeft).await);
        assert!(queue.enqueue(Command::Forward).await);
        assert!(queue.enqueue(Command::StrafeRight).await);

        assert_eq!(queue.drain().await, Some(Command::StrafeLeft));
        assert_eq!(queue.drain().await, Some(Command::Forward));
        assert_eq!(queue.drain().await, Some(Command::StrafeRight));
        assert_eq!(queue.drain().await, None);
    }

    #[tokio::test]
    async fn drain_on_empty_is_noop() {
        let queue = CommandQueue::default();
        assert_eq!(queue.drain().await, None);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn refuses_past_capacity_without_evicting() {
        let queue = CommandQueue::new(3);
        for _ in 0..3 {
            assert!(queue.enqueue(Command::Forward).await);
        }
        assert!(!queue.enqueue(Command::Back).await);
        assert_eq!(queue.len().await, 3);
        assert_eq!(queue.snapshot().await, vec![Command::Forward; 3]);
    }

    #[tokio::test]
    async fn duplicates_are_kept() {
        let queue = CommandQueue::default();
        assert!(queue.enqueue(Command::RotateLeft).await);
        assert!(queue.enqueue(Command::RotateLeft).await);
        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn clear_reports_discarded() {
        let queue = CommandQueue::default();
        let _ = queue.enqueue(Command::Forward).await;
        let _ = queue.enqueue(Command::Back).await;
        assert_eq!(queue.clear().await, 2);
        assert!(queue.is_empty().await);
        assert_eq!(queue.clear().await, 0);
    }

    #[tokio::test]
    async fn concurrent_producers_never_exceed_bound() {
        let queue = std::sync::Arc::new(CommandQueue::new(50));
        let mut handles = Vec::new();
        for _ in 0..200 {
            let q = std::sync::Arc::clone(&queue);
            handles.push(tokio::spawn(async move { q.enqueue(Command::Forward).await }));
        }
        let mut admitted = 0;
        for handle in handles {
            let Ok(ok) = handle.await else {
                panic!("producer task failed");
            };
            if ok {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 50);
        assert_eq!(queue.len().await, 50);
    }
}
