//! Maintenance Coordinator data model (SPEC_FULL.md §4.I).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceMode {
    Running,
    Maintenance,
    Draining,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceState {
    pub mode: MaintenanceMode,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl Default for MaintenanceState {
    fn default() -> Self {
        Self {
            mode: MaintenanceMode::Running,
            started_at: None,
            deadline_at: None,
            reason: None,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }
}

/// Read-model returned to callers: `MaintenanceState` plus the derived
/// `retryAfterSeconds` hint and the current in-flight request count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceStatus {
    pub mode: MaintenanceMode,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub retry_after_seconds: Option<u64>,
    pub in_flight_requests: u64,
}
