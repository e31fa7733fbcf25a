//! Process-local maintenance-mode singleton (SPEC_FULL.md §4.I). Modeled
//! on the donor's `csa-lock`: "own the data, release deterministically"
//! with a bare sync primitive rather than an RAII-lifetime-entangled
//! lock guard — here a `parking_lot::RwLock<MaintenanceState>` plus an
//! `AtomicU64` in-flight counter, since the state is process-local and no
//! file lock is needed.

use std::sync::atomic::{AtomicI64, Ordering};

use acfs_eventbus::{publish_if_present, Channel, SharedHub};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::warn;

use crate::errors::MaintenanceError;
use crate::types::{MaintenanceMode, MaintenanceState, MaintenanceStatus};

const REASON_MAX_LEN: usize = 500;

fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason.map(|r| {
        let trimmed = r.trim();
        if trimmed.chars().count() > REASON_MAX_LEN {
            trimmed.chars().take(REASON_MAX_LEN).collect()
        } else {
            trimmed.to_string()
        }
    })
}

fn retry_after_seconds(mode: MaintenanceMode, deadline_at: Option<DateTime<Utc>>) -> Option<u64> {
    if !matches!(mode, MaintenanceMode::Draining) {
        return None;
    }
    let deadline = deadline_at?;
    let remaining_ms = (deadline - Utc::now()).num_milliseconds();
    if remaining_ms <= 0 {
        Some(0)
    } else {
        Some(((remaining_ms as f64) / 1000.0).ceil() as u64)
    }
}

pub struct MaintenanceCoordinator {
    state: RwLock<MaintenanceState>,
    in_flight: AtomicI64,
    hub: SharedHub,
}

/// Decrements the in-flight counter on drop, so a request that panics or
/// returns early still releases its slot.
pub struct RequestGuard<'a> {
    coordinator: &'a MaintenanceCoordinator,
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.end_request();
    }
}

impl MaintenanceCoordinator {
    pub fn new(hub: SharedHub) -> Self {
        Self {
            state: RwLock::new(MaintenanceState::default()),
            in_flight: AtomicI64::new(0),
            hub,
        }
    }

    pub fn status(&self) -> MaintenanceStatus {
        let state = self.state.read();
        MaintenanceStatus {
            mode: state.mode,
            started_at: state.started_at,
            deadline_at: state.deadline_at,
            reason: state.reason.clone(),
            updated_at: state.updated_at,
            updated_by: state.updated_by.clone(),
            retry_after_seconds: retry_after_seconds(state.mode, state.deadline_at),
            in_flight_requests: self.in_flight.load(Ordering::Relaxed).max(0) as u64,
        }
    }

    /// Admits a new request, returning `None` when the coordinator is in
    /// `maintenance` mode (full request rejection). `draining` still
    /// admits new requests; it only advertises `retryAfterSeconds`.
    pub fn begin_request(&self) -> Option<RequestGuard<'_>> {
        if matches!(self.state.read().mode, MaintenanceMode::Maintenance) {
            return None;
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        Some(RequestGuard { coordinator: self })
    }

    fn end_request(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::Relaxed);
        if previous <= 0 {
            warn!(previous, "in-flight request counter went negative, clamping to 0");
            self.in_flight.store(0, Ordering::Relaxed);
        }
    }

    pub fn enter_maintenance(&self, reason: Option<String>, actor: Option<String>) -> Result<MaintenanceStatus, MaintenanceError> {
        let mut state = self.state.write();
        if !matches!(state.mode, MaintenanceMode::Running) {
            return Err(MaintenanceError::invalid_transition(state.mode, "maintenance"));
        }
        let now = Utc::now();
        *state = MaintenanceState {
            mode: MaintenanceMode::Maintenance,
            started_at: Some(now),
            deadline_at: None,
            reason: normalize_reason(reason),
            updated_at: now,
            updated_by: actor,
        };
        let status = self.status_locked(&state);
        drop(state);
        self.publish_transition("maintenance.entered", &status);
        Ok(status)
    }

    pub fn start_draining(
        &self,
        deadline_seconds: u64,
        reason: Option<String>,
        actor: Option<String>,
    ) -> Result<MaintenanceStatus, MaintenanceError> {
        let mut state = self.state.write();
        if !matches!(state.mode, MaintenanceMode::Running) {
            return Err(MaintenanceError::invalid_transition(state.mode, "draining"));
        }
        let now = Utc::now();
        let deadline_at = now + Duration::milliseconds(deadline_seconds as i64 * 1000);
        *state = MaintenanceState {
            mode: MaintenanceMode::Draining,
            started_at: Some(now),
            deadline_at: Some(deadline_at),
            reason: normalize_reason(reason),
            updated_at: now,
            updated_by: actor,
        };
        let status = self.status_locked(&state);
        drop(state);
        self.publish_transition("maintenance.draining", &status);
        Ok(status)
    }

    pub fn exit_maintenance(&self, actor: Option<String>) -> MaintenanceStatus {
        let mut state = self.state.write();
        let now = Utc::now();
        *state = MaintenanceState {
            mode: MaintenanceMode::Running,
            started_at: None,
            deadline_at: None,
            reason: None,
            updated_at: now,
            updated_by: actor,
        };
        let status = self.status_locked(&state);
        drop(state);
        self.publish_transition("maintenance.exited", &status);
        status
    }

    fn status_locked(&self, state: &MaintenanceState) -> MaintenanceStatus {
        MaintenanceStatus {
            mode: state.mode,
            started_at: state.started_at,
            deadline_at: state.deadline_at,
            reason: state.reason.clone(),
            updated_at: state.updated_at,
            updated_by: state.updated_by.clone(),
            retry_after_seconds: retry_after_seconds(state.mode, state.deadline_at),
            in_flight_requests: self.in_flight.load(Ordering::Relaxed).max(0) as u64,
        }
    }

    fn publish_transition(&self, event_type: &str, status: &MaintenanceStatus) {
        let payload = serde_json::json!({
            "mode": status.mode,
            "reason": status.reason,
            "retryAfterSeconds": status.retry_after_seconds,
        });
        publish_if_present(&self.hub, Channel::new("system"), event_type, payload, None);
    }
}
