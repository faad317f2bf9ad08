// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-topic subscriber registry.
//!
//! Maps each [`Topic`] to the sinks currently subscribed to it. Publishers
//! take a snapshot of the targets under a read lock and deliver outside the
//! lock, so a slow subscriber never blocks registration or other topics.
//!
//! Subscribers are identified by a monotonically assigned [`SubscriptionId`]
//! so a released subscription removes exactly its own entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::router::Topic;

/// Unique subscription identifier within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Thread-safe map from topic to subscriber sinks.
///
/// A poisoned lock is recovered rather than propagated: the map holds no
/// invariant a panicking writer could leave half-applied.
pub struct SubscriptionRegistry<S> {
    entries: RwLock<HashMap<Topic, Vec<(SubscriptionId, S)>>>,
    next_id: AtomicU64,
}

impl<S: Clone> SubscriptionRegistry<S> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add `sink` under `topic`.
    pub fn register(&self, topic: &Topic, sink: S) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(topic.clone()).or_default().push((id, sink));
        id
    }

    /// Remove one subscription. Returns `false` when it was already gone.
    pub fn unregister(&self, topic: &Topic, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let Some(sinks) = entries.get_mut(topic) else {
            return false;
        };
        let before = sinks.len();
        sinks.retain(|(existing, _)| *existing != id);
        let removed = sinks.len() != before;
        if sinks.is_empty() {
            entries.remove(topic);
        }
        removed
    }

    /// Snapshot of the sinks subscribed to `topic`, in registration order.
    pub fn targets(&self, topic: &Topic) -> Vec<(SubscriptionId, S)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(topic).cloned().unwrap_or_default()
    }

    /// Drop every listed subscription of `topic`. Used to clear sinks found
    /// closed during delivery.
    pub fn prune(&self, topic: &Topic, closed: &[SubscriptionId]) {
        if closed.is_empty() {
            return;
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(sinks) = entries.get_mut(topic) {
            sinks.retain(|(id, _)| !closed.contains(id));
            if sinks.is_empty() {
                entries.remove(topic);
            }
        }
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(topic).map_or(0, Vec::len)
    }
}

impl<S: Clone> Default for SubscriptionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
