// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ephemeral, per-plan, multi-subscriber event bus.
//!
//! Unlike the daemon's WAL-backed bus this has no durability: `status.json`
//! is the durable source of truth for execution state, so there is nothing
//! here worth replaying after a restart. Each plan gets its own bounded,
//! drop-oldest channel so a slow or absent subscriber on one plan can never
//! back-pressure another.

use conductor_core::Event;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Default per-plan channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

struct Topic {
    sender: broadcast::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

/// Multi-plan event bus. Cheap to clone; all clones share the same topics.
#[derive(Clone)]
pub struct EventBus {
    topics: Arc<std::sync::Mutex<HashMap<String, Topic>>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Arc::new(std::sync::Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn topic_for(&self, plan_id: &str) -> (broadcast::Sender<Event>, Arc<AtomicU64>) {
        let mut topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        let topic = topics.entry(plan_id.to_string()).or_insert_with(|| Topic {
            sender: broadcast::channel(self.capacity).0,
            dropped: Arc::new(AtomicU64::new(0)),
        });
        (topic.sender.clone(), Arc::clone(&topic.dropped))
    }

    /// Publish an event on its plan's topic. A no-op (not an error) if the
    /// plan currently has no subscribers.
    pub fn publish(&self, event: Event) {
        let (sender, _dropped) = self.topic_for(&event.plan_id);
        let _ = sender.send(event);
    }

    /// Subscribe to a plan's events.
    pub fn subscribe(&self, plan_id: &str) -> Subscription {
        let (sender, dropped) = self.topic_for(plan_id);
        Subscription {
            receiver: sender.subscribe(),
            dropped,
        }
    }

    /// Read and reset the count of events dropped for `plan_id` since the
    /// last call. Intended to be polled periodically to emit a
    /// `bus.dropped` event when non-zero.
    pub fn dropped_since(&self, plan_id: &str) -> u64 {
        let (_sender, dropped) = self.topic_for(plan_id);
        dropped.swap(0, Ordering::Relaxed)
    }
}

/// A live subscription to one plan's events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
    dropped: Arc<AtomicU64>,
}

impl Subscription {
    /// Receive the next event, transparently skipping past any events this
    /// subscriber fell behind on (and recording them as dropped). Returns
    /// `None` once the bus side is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged = n, "subscriber fell behind, dropping oldest events");
                    self.dropped.fetch_add(n, Ordering::Relaxed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
