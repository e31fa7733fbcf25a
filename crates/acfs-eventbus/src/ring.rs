//! Bounded FIFO event store with capacity eviction and TTL pruning.
//!
//! Capacity evictions and TTL expirations are counted independently of one
//! another; a single `parking_lot::Mutex` guards the whole buffer, which is
//! sufficient per the shared-resource policy (SPEC_FULL.md §5) at this
//! scale — no lock is ever held across an `.await`.

use acfs_core::time::Anchor;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A single stored value plus the monotonic instant it was enqueued at.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub value: T,
    pub enqueued_at: Instant,
}

/// Wire shape for drop telemetry: `{capacityEvictions, ttlExpirations,
/// lastEvictionAt, lastExpirationAt}`, always a consistent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropStats {
    pub capacity_evictions: u64,
    pub ttl_expirations: u64,
    pub last_eviction_at: Option<DateTime<Utc>>,
    pub last_expiration_at: Option<DateTime<Utc>>,
}

struct Inner<T> {
    entries: VecDeque<Entry<T>>,
    capacity: usize,
    ttl: Duration,
    stats: DropStats,
    anchor: Anchor,
}

/// Fixed-capacity ordered sequence of `T` with FIFO eviction and optional
/// per-entry TTL pruning. `ttl_ms == 0` disables TTL pruning entirely.
pub struct RingBuffer<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> RingBuffer<T> {
    /// `capacity` must be at least 1. `ttl_ms == 0` means no TTL pruning.
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        assert!(capacity >= 1, "ring buffer capacity must be >= 1");
        Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity),
                capacity,
                ttl: Duration::from_millis(ttl_ms),
                stats: DropStats::default(),
                anchor: Anchor::now(),
            }),
        }
    }

    /// Push a new value. If the buffer is full, the oldest entry is evicted
    /// first and `capacityEvictions` is incremented; the push itself always
    /// succeeds.
    pub fn push(&self, value: T) {
        let mut inner = self.inner.lock();
        if inner.entries.len() >= inner.capacity {
            inner.entries.pop_front();
            inner.stats.capacity_evictions += 1;
            let now = Instant::now();
            inner.stats.last_eviction_at = Some(inner.anchor.wall_clock_at(now));
        }
        let enqueued_at = Instant::now();
        inner.entries.push_back(Entry {
            value,
            enqueued_at,
        });
    }

    /// Remove entries older than the configured TTL. Returns the number of
    /// entries pruned. A no-op (returns 0) when `ttl_ms == 0`.
    pub fn prune(&self) -> usize {
        let mut inner = self.inner.lock();
        if inner.ttl.is_zero() {
            return 0;
        }
        let now = Instant::now();
        let ttl = inner.ttl;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|e| now.saturating_duration_since(e.enqueued_at) < ttl);
        let pruned = before - inner.entries.len();
        if pruned > 0 {
            inner.stats.ttl_expirations += pruned as u64;
            inner.stats.last_expiration_at = Some(inner.anchor.wall_clock_at(now));
        }
        pruned
    }

    /// A consistent copy of the currently stored values, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        let inner = self.inner.lock();
        inner.entries.iter().map(|e| e.value.clone()).collect()
    }

    /// A consistent copy of drop telemetry.
    pub fn drop_stats(&self) -> DropStats {
        self.inner.lock().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
