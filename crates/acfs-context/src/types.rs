//! Context Health data model (SPEC_FULL.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Rotated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: String,
    pub model: String,
    pub max_tokens: u64,
    pub current_tokens: u64,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub last_compaction: Option<DateTime<Utc>>,
    pub last_rotation: Option<DateTime<Utc>>,
    pub rotated_from: Option<String>,
    pub rotated_to: Option<String>,
    pub status: SessionStatus,
}

impl SessionState {
    pub fn percent_used(&self) -> f64 {
        if self.max_tokens == 0 {
            return 100.0;
        }
        (self.current_tokens as f64 / self.max_tokens as f64) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Emergency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub tokens: u64,
    pub delta: i64,
    pub event: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    None,
    Summarize,
    Compact,
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: RecommendedAction,
    pub urgency: Urgency,
    pub reason: String,
    pub estimated_token_savings: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextHealth {
    pub session_id: String,
    pub status: HealthStatus,
    pub current_tokens: u64,
    pub max_tokens: u64,
    pub percent_used: f64,
    pub projected_overflow_in_messages: Option<u64>,
    pub estimated_time_to_warning_ms: Option<u64>,
    pub token_history: Vec<TokenHistoryEntry>,
    pub last_compaction: Option<DateTime<Utc>>,
    pub last_rotation: Option<DateTime<Utc>>,
    pub recommendations: Vec<Recommendation>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactStrategy {
    Summarize,
    Prune,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionResult {
    pub before_tokens: u64,
    pub after_tokens: u64,
    pub reduction: u64,
    pub reduction_percent: f64,
    pub summarized_sections: usize,
    pub preserved_sections: usize,
    pub summaries: Vec<String>,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextTransfer {
    pub summary: Option<String>,
    pub recent_messages: Vec<Message>,
    pub active_beads: Option<Vec<String>>,
    pub memory_rules: Option<Vec<String>>,
    pub source_tokens: u64,
    pub transfer_tokens: u64,
    pub compression_ratio: f64,
    pub transferred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationResult {
    pub new_session_id: String,
    pub checkpoint_id: String,
    pub transfer: ContextTransfer,
    pub reason: String,
    pub rotated_at: DateTime<Utc>,
}
