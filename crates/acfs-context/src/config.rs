//! Explicit configuration records for the Context Health Engine
//! (SPEC_FULL.md §9 REDESIGN FLAGS: "migrate dynamic config objects to
//! explicit configuration records per component").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub warning_percent: f64,
    pub critical_percent: f64,
    pub emergency_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_percent: 75.0,
            critical_percent: 85.0,
            emergency_percent: 95.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextHealthConfig {
    pub thresholds: Thresholds,
    /// Cooldown between rotations for the same session.
    pub cooldown_ms: u64,
    /// Interval between automatic `check_health` ticks, when monitoring.
    pub monitor_interval_ms: u64,
    /// Cap on stored `TokenHistoryEntry` points per session.
    pub history_max_len: usize,
    pub default_max_tokens: u64,
    pub model_token_limits: HashMap<String, u64>,
    pub auto_healing_enabled: bool,
    pub summarization_enabled: bool,
    pub rotation_enabled: bool,
    /// Percent-used threshold past which a failed compaction escalates
    /// straight to an emergency rotation attempt.
    pub escalate_to_emergency_percent: f64,
    /// Recent messages (by count) always preserved across a compaction.
    pub preserve_recent_count: usize,
    /// Recent messages (by age) always preserved across a compaction.
    pub preserve_recent_minutes: i64,
    pub default_reduction_target: f64,
    /// Recent messages carried into a rotation's context transfer.
    pub transfer_recent_count: usize,
}

impl Default for ContextHealthConfig {
    fn default() -> Self {
        let mut model_token_limits = HashMap::new();
        model_token_limits.insert("claude-opus-4".to_string(), 200_000);
        model_token_limits.insert("claude-sonnet-4".to_string(), 200_000);
        model_token_limits.insert("claude-haiku-4".to_string(), 200_000);
        model_token_limits.insert("gpt-4o".to_string(), 128_000);
        model_token_limits.insert("gpt-4.1".to_string(), 1_000_000);

        Self {
            thresholds: Thresholds::default(),
            cooldown_ms: 60_000,
            monitor_interval_ms: 30_000,
            history_max_len: 100,
            default_max_tokens: 200_000,
            model_token_limits,
            auto_healing_enabled: true,
            summarization_enabled: true,
            rotation_enabled: true,
            escalate_to_emergency_percent: 93.0,
            preserve_recent_count: 10,
            preserve_recent_minutes: 15,
            default_reduction_target: 0.3,
            transfer_recent_count: 10,
        }
    }
}

impl ContextHealthConfig {
    pub fn max_tokens_for_model(&self, model: Option<&str>, explicit: Option<u64>) -> u64 {
        explicit
            .or_else(|| model.and_then(|m| self.model_token_limits.get(m).copied()))
            .unwrap_or(self.default_max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_serde_with_defaults() {
        let json = "{}";
        let config: ContextHealthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.thresholds.warning_percent, 75.0);
        assert_eq!(config.cooldown_ms, 60_000);
    }

    #[test]
    fn explicit_max_tokens_wins_over_model_table() {
        let config = ContextHealthConfig::default();
        assert_eq!(config.max_tokens_for_model(Some("claude-opus-4"), Some(50_000)), 50_000);
        assert_eq!(config.max_tokens_for_model(Some("claude-opus-4"), None), 200_000);
        assert_eq!(config.max_tokens_for_model(Some("unknown-model"), None), config.default_max_tokens);
    }
}
