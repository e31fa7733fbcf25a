//! Snapshot data model (SPEC_FULL.md §3, §4.G).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Folds per-component statuses into one overall status: any `unhealthy`
/// dominates; else any `degraded`/`unknown` dominates; else `healthy`
/// (SPEC_FULL.md §3, §8).
pub fn fold_statuses(statuses: &[ComponentStatus]) -> OverallStatus {
    if statuses.iter().any(|s| *s == ComponentStatus::Unhealthy) {
        OverallStatus::Unhealthy
    } else if statuses
        .iter()
        .any(|s| matches!(s, ComponentStatus::Degraded | ComponentStatus::Unknown))
    {
        OverallStatus::Degraded
    } else {
        OverallStatus::Healthy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSummary {
    pub status: OverallStatus,
    pub ntm: ComponentStatus,
    pub beads: ComponentStatus,
    pub tools: ComponentStatus,
    pub agent_mail: ComponentStatus,
    /// Human-readable notes per failed/degraded source (SPEC_FULL.md §8
    /// scenario 7: "summary.issues lists each failed source").
    pub issues: Vec<String>,
}

/// Outcome of a single bounded collector: either the typed value, or a
/// structured failure with latency — never an ambient exception past the
/// aggregator boundary (SPEC_FULL.md §5, §7).
#[derive(Debug, Clone)]
pub struct CollectionResult<T> {
    pub success: bool,
    pub value: T,
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl<T> CollectionResult<T> {
    pub fn ok(value: T, latency_ms: u64) -> Self {
        Self {
            success: true,
            value,
            error: None,
            latency_ms,
        }
    }

    pub fn failed(empty: T, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            success: false,
            value: empty,
            error: Some(error.into()),
            latency_ms,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NtmSnapshot {
    pub available: bool,
    pub sessions: Vec<NtmSessionInfo>,
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NtmSessionInfo {
    pub id: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeadsSnapshot {
    pub br_available: bool,
    pub bv_available: bool,
    pub triage_count: u32,
    pub sync_pending: u32,
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolHealthSnapshot {
    pub status: ComponentStatus,
    pub required_missing: usize,
    pub cascade_failures: usize,
    pub detected_available: usize,
    pub detected_total: usize,
    pub captured_at: Option<DateTime<Utc>>,
}

impl Default for ComponentStatus {
    fn default() -> Self {
        ComponentStatus::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for MailPriority {
    fn default() -> Self {
        MailPriority::Normal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub priority: MailPriority,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMailSnapshot {
    pub available: bool,
    pub agent_count: usize,
    pub unread_count: usize,
    pub recent: Vec<MailMessage>,
    pub malformed_lines_skipped: usize,
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub generation_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub meta: SnapshotMeta,
    pub summary: HealthSummary,
    pub ntm: NtmSnapshot,
    pub beads: BeadsSnapshot,
    pub tools: ToolHealthSnapshot,
    pub agent_mail: AgentMailSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_unhealthy_dominates() {
        let statuses = [
            ComponentStatus::Healthy,
            ComponentStatus::Unhealthy,
            ComponentStatus::Degraded,
        ];
        assert_eq!(fold_statuses(&statuses), OverallStatus::Unhealthy);
    }

    #[test]
    fn degraded_or_unknown_without_unhealthy_is_degraded() {
        assert_eq!(
            fold_statuses(&[ComponentStatus::Healthy, ComponentStatus::Unknown]),
            OverallStatus::Degraded
        );
        assert_eq!(
            fold_statuses(&[ComponentStatus::Healthy, ComponentStatus::Degraded]),
            OverallStatus::Degraded
        );
    }

    #[test]
    fn all_healthy_is_healthy() {
        assert_eq!(
            fold_statuses(&[ComponentStatus::Healthy, ComponentStatus::Healthy]),
            OverallStatus::Healthy
        );
    }
}
