//! Time helpers shared by components that mix monotonic interval math with
//! wall-clock wire timestamps (see SPEC_FULL.md §9 on the ring buffer).

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Converts a monotonic `Instant` plus a wall-clock anchor into the
/// `DateTime<Utc>` a wire payload expects, by measuring the elapsed time
/// since the anchor was taken.
pub fn instant_to_wall_clock(anchor: (Instant, DateTime<Utc>), at: Instant) -> DateTime<Utc> {
    let (anchor_instant, anchor_wall) = anchor;
    if at >= anchor_instant {
        anchor_wall + chrono::Duration::from_std(at - anchor_instant).unwrap_or_default()
    } else {
        anchor_wall - chrono::Duration::from_std(anchor_instant - at).unwrap_or_default()
    }
}

/// A fixed point in time captured as both a monotonic instant (for interval
/// arithmetic immune to clock skew) and a wall-clock timestamp (for wire
/// payloads).
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    pub instant: Instant,
    pub wall: DateTime<Utc>,
}

impl Anchor {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }

    pub fn wall_clock_at(&self, at: Instant) -> DateTime<Utc> {
        instant_to_wall_clock((self.instant, self.wall), at)
    }

    pub fn elapsed_since(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.instant)
    }
}
