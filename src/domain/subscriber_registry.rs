//! Registry of connected observers.
//!
//! [`SubscriberRegistry`] stores every live observer in a `BTreeMap` keyed by
//! [`SubscriberId`] behind a [`tokio::sync::RwLock`]. Ids come from a
//! monotonic counter, so map order is connection order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, RwLockReadGuard};

use super::{CommandSink, Subscriber, SubscriberId};

/// Central store for all connected observers.
///
/// # Concurrency
///
/// - Broadcast and disconnect fan-out iterate under the read lock, so they
///   may run concurrently with each other.
/// - `add`, `remove` and `clear` take the write lock, so they wait for any
///   live [`ReadySubscribers`] view to be dropped.
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscribers: RwLock<BTreeMap<SubscriberId, Arc<Subscriber>>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates an id that has never been handed out by this registry.
    pub fn next_id(&self) -> SubscriberId {
        SubscriberId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a not-yet-ready subscriber for `sink` and registers it.
    pub async fn register(&self, sink: CommandSink) -> Arc<Subscriber> {
        let subscriber = Arc::new(Subscriber::new(self.next_id(), sink));
        self.add(Arc::clone(&subscriber)).await;
        subscriber
    }

    /// Inserts a subscriber. Re-adding an existing id replaces the entry, so
    /// an id appears at most once.
    pub async fn add(&self, subscriber: Arc<Subscriber>) {
        self.subscribers
            .write()
            .await
            .insert(subscriber.id(), subscriber);
    }

    /// Removes a subscriber. Returns `false` if it was not registered.
    pub async fn remove(&self, id: SubscriberId) -> bool {
        self.subscribers.write().await.remove(&id).is_some()
    }

    /// Read-locked view of the ready subscribers.
    ///
    /// Membership is frozen until the view is dropped.
    pub async fn ready(&self) -> ReadySubscribers<'_> {
        ReadySubscribers {
            map: self.subscribers.read().await,
        }
    }

    /// Applies `f` to every ready subscriber, returning how many were visited.
    pub async fn for_each_ready<F>(&self, f: F) -> usize
    where
        F: FnMut(&Subscriber),
    {
        self.ready().await.for_each(f)
    }

    /// Applies `f` to every registered subscriber except `id`, ready or not.
    pub async fn for_each_other<F>(&self, id: SubscriberId, mut f: F) -> usize
    where
        F: FnMut(&Subscriber),
    {
        let map = self.subscribers.read().await;
        let mut visited = 0;
        for subscriber in map.values().filter(|s| s.id() != id) {
            f(subscriber.as_ref());
            visited += 1;
        }
        visited
    }

    /// Number of subscribers currently eligible for broadcast.
    pub async fn ready_count(&self) -> usize {
        self.ready().await.count()
    }

    /// Ids of all registered subscribers, in connection order.
    pub async fn all(&self) -> Vec<SubscriberId> {
        self.subscribers.read().await.keys().copied().collect()
    }

    /// Returns `true` if `id` is registered.
    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(&id)
    }

    /// Drops every subscriber, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut map = self.subscribers.write().await;
        let removed = map.len();
        map.clear();
        removed
    }

    /// Number of registered subscribers.
    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Returns `true` if no subscriber is registered.
    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }
}

/// Ready subscribers under the registry's read lock.
///
/// Returned by [`SubscriberRegistry::ready`]. Readiness only ever flips on,
/// so a subscriber counted here is still ready when visited.
#[derive(Debug)]
pub struct ReadySubscribers<'a> {
    map: RwLockReadGuard<'a, BTreeMap<SubscriberId, Arc<Subscriber>>>,
}

impl ReadySubscribers<'_> {
    /// Number of ready subscribers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.map.values().filter(|s| s.is_ready()).count()
    }

    /// Returns `true` if no subscriber is ready.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.map.values().any(|s| s.is_ready())
    }

    /// Applies `f` to every ready subscriber, returning how many were visited.
    pub fn for_each<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&Subscriber),
    {
        let mut visited = 0;
        for subscriber in self.map.values().filter(|s| s.is_ready()) {
            f(subscriber.as_ref());
            visited += 1;
        }
        visited
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_assigns_distinct_ids() {
        let registry = SubscriberRegistry::new();
        let (a, _ra) = CommandSink::channel();
        let (b, _rb) = CommandSink::channel();
        let first = registry.register(a).await;
        let second = registry.register(b).await;
        assert_ne!(first.id(), second.id());
        assert_eq!(registry.all().await, vec![first.id(), second.id()]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_removal() {
        let registry = SubscriberRegistry::new();
        let (a, _ra) = CommandSink::channel();
        let first = registry.register(a).await;
        assert!(registry.remove(first.id()).await);

        let (b, _rb) = CommandSink::channel();
        let second = registry.register(b).await;
        assert!(second.id() > first.id());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (sink, _rx) = CommandSink::channel();
        let sub = registry.register(sink).await;
        assert!(registry.remove(sub.id()).await);
        assert!(!registry.remove(sub.id()).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn add_same_id_twice_keeps_one_entry() {
        let registry = SubscriberRegistry::new();
        let (sink, _rx) = CommandSink::channel();
        let sub = registry.register(sink).await;
        registry.add(Arc::clone(&sub)).await;
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn for_each_ready_skips_handshaking() {
        let registry = SubscriberRegistry::new();
        let (a, _ra) = CommandSink::channel();
        let (b, _rb) = CommandSink::channel();
        let ready = registry.register(a).await;
        let _warming = registry.register(b).await;
        ready.mark_ready();

        let mut seen = Vec::new();
        let visited = registry.for_each_ready(|s| seen.push(s.id())).await;
        assert_eq!(visited, 1);
        assert_eq!(seen, vec![ready.id()]);
        assert_eq!(registry.ready_count().await, 1);
    }

    #[tokio::test]
    async fn for_each_other_excludes_self_only() {
        let registry = SubscriberRegistry::new();
        let mut subs = Vec::new();
        for _ in 0..3 {
            let (sink, rx) = CommandSink::channel();
            subs.push((registry.register(sink).await, rx));
        }
        let Some((me, _)) = subs.first() else {
            panic!("three subscribers registered");
        };
        let mut seen = Vec::new();
        let visited = registry.for_each_other(me.id(), |s| seen.push(s.id())).await;
        assert_eq!(visited, 2);
        assert!(!seen.contains(&me.id()));
    }

    #[tokio::test]
    async fn clear_removes_everyone() {
        let registry = SubscriberRegistry::new();
        let (a, _ra) = CommandSink::channel();
        let (b, _rb) = CommandSink::channel();
        let first = registry.register(a).await;
        let _ = registry.register(b).await;
        assert_eq!(registry.clear().await, 2);
        assert!(!registry.contains(first.id()).await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn ready_view_holds_off_removal() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (sink, _rx) = CommandSink::channel();
        let sub = registry.register(sink).await;
        sub.mark_ready();

        let ready = registry.ready().await;
        assert!(!ready.is_empty());

        let id = sub.id();
        let remover = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.remove(id).await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(!remover.is_finished());
        assert_eq!(ready.for_each(|_| {}), 1);

        drop(ready);
        assert!(matches!(remover.await, Ok(true)));
        assert_eq!(registry.ready_count().await, 0);
    }
}
