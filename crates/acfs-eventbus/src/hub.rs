//! Channel-addressed multi-subscriber pub/sub built on [`crate::ring::RingBuffer`].
//!
//! Publication never blocks on a slow subscriber: each subscriber drains a
//! bounded queue on its own thread, and a full queue means the event is
//! dropped and counted rather than the publisher stalling. Each channel
//! keeps its own backlog ring buffer so a late-joining subscriber can
//! replay recent history before receiving live events.

use crate::ring::RingBuffer;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender};

/// A structured channel identifier: equality is by `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub kind: String,
    pub id: Option<String>,
}

impl Channel {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    pub fn scoped(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
        }
    }
}

/// A single published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub channel: Channel,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub meta: Option<serde_json::Value>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Per-channel backlog capacity for late-joining subscriber replay.
    pub backlog_capacity: usize,
    /// Per-channel backlog TTL in milliseconds (0 disables pruning).
    pub backlog_ttl_ms: u64,
    /// Bound on each subscriber's pending-delivery queue.
    pub subscriber_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            backlog_capacity: 256,
            backlog_ttl_ms: 0,
            subscriber_queue_capacity: 64,
        }
    }
}

struct ChannelState {
    backlog: RingBuffer<Event>,
    subscribers: HashMap<u64, SyncSender<Event>>,
}

/// Handle returned by [`Hub::subscribe`], used to unsubscribe later.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    pub channel: Channel,
    pub id: u64,
}

#[derive(Debug, Default)]
pub struct HubStats {
    pub dropped_deliveries: u64,
}

pub struct Hub {
    config: HubConfig,
    channels: Mutex<HashMap<Channel, ChannelState>>,
    next_subscriber_id: AtomicU64,
    dropped_deliveries: AtomicU64,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            channels: Mutex::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(1),
            dropped_deliveries: AtomicU64::new(0),
        }
    }

    /// Append to the channel backlog and deliver to current subscribers.
    /// Never blocks on a slow subscriber; a full subscriber queue results in
    /// a dropped delivery, counted in [`Hub::stats`].
    pub fn publish(
        &self,
        channel: Channel,
        event_type: impl Into<String>,
        payload: serde_json::Value,
        meta: Option<serde_json::Value>,
    ) -> Event {
        let event = Event {
            channel: channel.clone(),
            event_type: event_type.into(),
            payload,
            meta,
            published_at: Utc::now(),
        };

        let mut channels = self.channels.lock();
        let state = channels.entry(channel).or_insert_with(|| ChannelState {
            backlog: RingBuffer::new(self.config.backlog_capacity, self.config.backlog_ttl_ms),
            subscribers: HashMap::new(),
        });
        state.backlog.push(event.clone());

        for sender in state.subscribers.values() {
            if sender.try_send(event.clone()).is_err() {
                self.dropped_deliveries.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(channel = %event.channel.kind, "dropped event delivery, subscriber queue full or closed");
            }
        }

        event
    }

    /// Register a subscriber. Replays up to `replay` recent backlog events
    /// (in publication order) before the callback starts receiving live
    /// events. The callback runs on a dedicated thread, one per subscriber.
    pub fn subscribe<F>(&self, channel: Channel, replay: Option<usize>, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let (tx, rx) = sync_channel::<Event>(self.config.subscriber_queue_capacity.max(1));
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);

        let mut channels = self.channels.lock();
        let state = channels.entry(channel.clone()).or_insert_with(|| ChannelState {
            backlog: RingBuffer::new(self.config.backlog_capacity, self.config.backlog_ttl_ms),
            subscribers: HashMap::new(),
        });

        let backlog = state.backlog.snapshot();
        let replay_slice = match replay {
            Some(n) if n < backlog.len() => &backlog[backlog.len() - n..],
            _ => &backlog[..],
        };
        for event in replay_slice {
            let _ = tx.try_send(event.clone());
        }

        state.subscribers.insert(id, tx);
        drop(channels);

        std::thread::spawn(move || {
            while let Ok(event) = rx.recv() {
                callback(&event);
            }
        });

        SubscriptionHandle { channel, id }
    }

    /// Idempotent: unsubscribing an already-removed handle is a no-op.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        if let Some(state) = self.channels.lock().get_mut(&handle.channel) {
            state.subscribers.remove(&handle.id);
        }
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            dropped_deliveries: self.dropped_deliveries.load(Ordering::Relaxed),
        }
    }
}

/// A `Hub` handle that may be absent. Modeled explicitly rather than via
/// silent `try {} catch {}`-style swallowing (SPEC_FULL.md §4.B, REDESIGN
/// FLAGS): call sites that are not contract-critical use
/// [`publish_if_present`] instead of unwrapping.
pub type SharedHub = Option<std::sync::Arc<Hub>>;

pub fn publish_if_present(
    hub: &SharedHub,
    channel: Channel,
    event_type: impl Into<String>,
    payload: serde_json::Value,
    meta: Option<serde_json::Value>,
) {
    if let Some(hub) = hub {
        hub.publish(channel, event_type, payload, meta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn subscriber_receives_events_in_publish_order() {
        let hub = Hub::new(HubConfig::default());
        let received: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        let channel = Channel::new("system");
        hub.subscribe(channel.clone(), None, move |event| {
            received_clone.lock().push(event.event_type.clone());
        });

        hub.publish(channel.clone(), "a", serde_json::json!({}), None);
        hub.publish(channel.clone(), "b", serde_json::json!({}), None);
        hub.publish(channel, "c", serde_json::json!({}), None);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(*received.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn replay_delivers_recent_backlog_before_live_events() {
        let hub = Hub::new(HubConfig::default());
        let channel = Channel::new("tools");
        hub.publish(channel.clone(), "old1", serde_json::json!({}), None);
        hub.publish(channel.clone(), "old2", serde_json::json!({}), None);

        let received: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        hub.subscribe(channel.clone(), Some(1), move |event| {
            received_clone.lock().push(event.event_type.clone());
        });
        hub.publish(channel, "new1", serde_json::json!({}), None);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(*received.lock(), vec!["old2", "new1"]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let hub = Hub::new(HubConfig::default());
        let channel = Channel::new("system");
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let handle = hub.subscribe(channel.clone(), None, move |_| {
            counter_clone.fetch_add(1, Ordering::Relaxed);
        });

        hub.unsubscribe(&handle);
        hub.unsubscribe(&handle); // second call must not panic

        hub.publish(channel, "ignored", serde_json::json!({}), None);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn full_subscriber_queue_drops_and_counts_instead_of_blocking() {
        let config = HubConfig {
            subscriber_queue_capacity: 1,
            ..HubConfig::default()
        };
        let hub = Hub::new(config);
        let channel = Channel::new("tools");
        // Subscribe with a callback that blocks forever, so its queue fills.
        hub.subscribe(channel.clone(), None, |_| {
            std::thread::sleep(Duration::from_secs(3600));
        });

        for i in 0..5 {
            hub.publish(channel.clone(), format!("e{i}"), serde_json::json!({}), None);
        }

        assert!(hub.stats().dropped_deliveries > 0);
    }

    #[test]
    fn publish_if_present_is_a_noop_without_a_hub() {
        let hub: SharedHub = None;
        publish_if_present(&hub, Channel::new("system"), "x", serde_json::json!({}), None);
    }
}
