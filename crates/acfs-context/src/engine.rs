//! The Context Health Engine: per-session registration, token tracking,
//! health checks with projection, and graduated interventions
//! (SPEC_FULL.md §4.H). Ties together `tokens`, `compaction`, `rotation`.

use std::collections::HashMap;

use acfs_eventbus::{publish_if_present, Channel, SharedHub};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::compaction::{compact_session, CompactOptions};
use crate::config::ContextHealthConfig;
use crate::errors::{ContextHealthError, RotationError, SummarizationError};
use crate::rotation::{new_session_state, rotate_session, RotationInputs};
use crate::tokens::count_tokens;
use crate::types::{
    CompactionResult, ContextHealth, HealthStatus, Message, Recommendation, RecommendedAction, RotationResult,
    SessionState, SessionStatus, TokenHistoryEntry, Urgency,
};

struct SessionEntry {
    state: SessionState,
    history: Vec<TokenHistoryEntry>,
}

/// Owns every tracked session's state and drives health checks against it.
/// Mirrors the donor's pattern of a single `parking_lot::Mutex`-guarded map
/// per shared resource (SPEC_FULL.md §5 shared-resource policy).
pub struct ContextHealthEngine {
    config: ContextHealthConfig,
    sessions: Mutex<HashMap<String, SessionEntry>>,
    hub: SharedHub,
}

impl ContextHealthEngine {
    pub fn new(config: ContextHealthConfig, hub: SharedHub) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
            hub,
        }
    }

    pub fn register_session(&self, id: String, model: Option<String>, max_tokens: Option<u64>) -> SessionState {
        let resolved_max = self.config.max_tokens_for_model(model.as_deref(), max_tokens);
        let state = SessionState {
            id: id.clone(),
            model: model.unwrap_or_default(),
            max_tokens: resolved_max,
            current_tokens: 0,
            messages: Vec::new(),
            created_at: Utc::now(),
            last_compaction: None,
            last_rotation: None,
            rotated_from: None,
            rotated_to: None,
            status: SessionStatus::Active,
        };
        let mut sessions = self.sessions.lock();
        sessions.insert(
            id,
            SessionEntry {
                state: state.clone(),
                history: Vec::new(),
            },
        );
        state
    }

    pub fn unregister_session(&self, id: &str) {
        self.sessions.lock().remove(id);
    }

    pub fn update_tokens(&self, id: &str, tokens: u64, event: &str) -> Result<(), ContextHealthError> {
        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(id).ok_or_else(|| ContextHealthError::SessionNotFound {
            session_id: id.to_string(),
        })?;
        let delta = tokens as i64 - entry.state.current_tokens as i64;
        entry.state.current_tokens = tokens;
        entry.history.push(TokenHistoryEntry {
            timestamp: Utc::now(),
            tokens,
            delta,
            event: event.to_string(),
        });
        if entry.history.len() > self.config.history_max_len {
            let excess = entry.history.len() - self.config.history_max_len;
            entry.history.drain(0..excess);
        }
        Ok(())
    }

    pub fn add_message(&self, id: &str, message: Message) -> Result<(), ContextHealthError> {
        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(id).ok_or_else(|| ContextHealthError::SessionNotFound {
            session_id: id.to_string(),
        })?;
        if entry.state.status == SessionStatus::Rotated {
            return Err(ContextHealthError::SessionNotFound {
                session_id: id.to_string(),
            });
        }
        let added_tokens = count_tokens(&message.content);
        entry.state.messages.push(message);
        let new_total = entry.state.current_tokens + added_tokens;
        entry.state.current_tokens = new_total;
        entry.history.push(TokenHistoryEntry {
            timestamp: Utc::now(),
            tokens: new_total,
            delta: added_tokens as i64,
            event: "add_message".to_string(),
        });
        Ok(())
    }

    fn status_for_percent(&self, percent_used: f64) -> HealthStatus {
        let t = &self.config.thresholds;
        if percent_used >= t.emergency_percent {
            HealthStatus::Emergency
        } else if percent_used >= t.critical_percent {
            HealthStatus::Critical
        } else if percent_used >= t.warning_percent {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    fn recommendations_for(&self, status: HealthStatus, current_tokens: u64) -> Vec<Recommendation> {
        let rec = match status {
            HealthStatus::Healthy => Recommendation {
                action: RecommendedAction::None,
                urgency: Urgency::Low,
                reason: "token usage within normal range".to_string(),
                estimated_token_savings: 0,
            },
            HealthStatus::Warning => Recommendation {
                action: RecommendedAction::Summarize,
                urgency: Urgency::Medium,
                reason: "approaching warning threshold".to_string(),
                estimated_token_savings: (current_tokens as f64 * 0.20).round() as u64,
            },
            HealthStatus::Critical => Recommendation {
                action: RecommendedAction::Compact,
                urgency: Urgency::High,
                reason: "critical threshold exceeded".to_string(),
                estimated_token_savings: (current_tokens as f64 * 0.30).round() as u64,
            },
            HealthStatus::Emergency => Recommendation {
                action: RecommendedAction::Rotate,
                urgency: Urgency::Critical,
                reason: "emergency threshold exceeded".to_string(),
                estimated_token_savings: (current_tokens as f64 * 0.80).round() as u64,
            },
        };
        vec![rec]
    }

    fn project(&self, history: &[TokenHistoryEntry], current_tokens: u64, max_tokens: u64) -> (Option<u64>, Option<u64>) {
        let window: Vec<&TokenHistoryEntry> = history.iter().rev().take(10).collect();
        let positive_deltas: Vec<f64> = window.iter().filter(|e| e.delta > 0).map(|e| e.delta as f64).collect();

        let projected_overflow = if positive_deltas.len() < 3 {
            None
        } else {
            let avg = positive_deltas.iter().sum::<f64>() / positive_deltas.len() as f64;
            if avg <= 0.0 {
                None
            } else {
                let remaining = (max_tokens as f64 - current_tokens as f64).max(0.0);
                Some((remaining / avg).ceil() as u64)
            }
        };

        let warning_tokens = (max_tokens as f64 * self.config.thresholds.warning_percent / 100.0).ceil() as u64;
        let estimated_time_to_warning = if current_tokens >= warning_tokens {
            Some(0)
        } else if window.len() < 2 {
            None
        } else {
            let span_ms = (window.first().unwrap().timestamp - window.last().unwrap().timestamp)
                .num_milliseconds()
                .max(1) as f64;
            let token_delta: f64 = window.iter().map(|e| e.delta as f64).sum();
            let velocity = token_delta / span_ms;
            if velocity <= 0.0 {
                None
            } else {
                let tokens_to_warning = (warning_tokens - current_tokens) as f64;
                Some((tokens_to_warning / velocity).ceil().max(0.0) as u64)
            }
        };

        (projected_overflow, estimated_time_to_warning)
    }

    /// Computes the current `ContextHealth` read-model and, when auto
    /// healing is enabled, runs the graduated intervention for the
    /// session's status band.
    pub fn check_health(&self, id: &str) -> Result<ContextHealth, ContextHealthError> {
        let (status, current_tokens, max_tokens, percent_used, history, last_compaction, last_rotation) = {
            let sessions = self.sessions.lock();
            let entry = sessions.get(id).ok_or_else(|| ContextHealthError::SessionNotFound {
                session_id: id.to_string(),
            })?;
            let percent_used = entry.state.percent_used();
            (
                self.status_for_percent(percent_used),
                entry.state.current_tokens,
                entry.state.max_tokens,
                percent_used,
                entry.history.clone(),
                entry.state.last_compaction,
                entry.state.last_rotation,
            )
        };

        let (projected_overflow_in_messages, estimated_time_to_warning_ms) =
            self.project(&history, current_tokens, max_tokens);

        let health = ContextHealth {
            session_id: id.to_string(),
            status,
            current_tokens,
            max_tokens,
            percent_used,
            projected_overflow_in_messages,
            estimated_time_to_warning_ms,
            token_history: history,
            last_compaction,
            last_rotation,
            recommendations: self.recommendations_for(status, current_tokens),
            checked_at: Utc::now(),
        };

        if self.config.auto_healing_enabled {
            self.run_intervention(id, status, percent_used)?;
        }

        Ok(health)
    }

    fn run_intervention(&self, id: &str, status: HealthStatus, percent_used: f64) -> Result<(), ContextHealthError> {
        match status {
            HealthStatus::Healthy => {}
            HealthStatus::Warning => {
                info!(session_id = id, "context warning threshold reached");
                let payload = serde_json::json!({ "sessionId": id, "percentUsed": percent_used });
                publish_if_present(&self.hub, Channel::new("system"), "context.warning", payload.clone(), None);
                publish_if_present(&self.hub, Channel::scoped("session", id), "context.warning", payload, None);
            }
            HealthStatus::Critical => {
                if self.config.summarization_enabled {
                    match self.compact(id, CompactOptions::with_defaults(&self.config)) {
                        Ok(_) => {}
                        Err(_) if percent_used >= self.config.escalate_to_emergency_percent => {
                            warn!(session_id = id, "compaction failed, escalating to emergency");
                            let _ = self.rotate(id, "compaction_failed_escalation".to_string(), RotationInputs::default());
                        }
                        Err(_) => {}
                    }
                }
            }
            HealthStatus::Emergency => {
                if self.config.rotation_enabled {
                    match self.rotate(id, "emergency_threshold".to_string(), RotationInputs::default()) {
                        Ok(_) => {}
                        Err(RotationError::Cooldown { session_id, retry_after_ms }) => {
                            info!(session_id, retry_after_ms, "rotation skipped, within cooldown");
                        }
                        Err(err) => {
                            warn!(session_id = id, error = %err, "rotation attempt failed");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn compact(&self, id: &str, options: CompactOptions) -> Result<CompactionResult, SummarizationError> {
        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(id).ok_or_else(|| SummarizationError::SessionNotFound {
            session_id: id.to_string(),
        })?;
        let result = compact_session(&mut entry.state, &options, &self.config)?;
        let payload = serde_json::json!({
            "sessionId": id,
            "beforeTokens": result.before_tokens,
            "afterTokens": result.after_tokens,
            "reduction": result.reduction,
        });
        publish_if_present(&self.hub, Channel::new("system"), "context.compacted", payload.clone(), None);
        publish_if_present(&self.hub, Channel::scoped("session", id), "context.compacted", payload, None);
        Ok(result)
    }

    pub fn rotate(&self, id: &str, reason: String, inputs: RotationInputs) -> Result<RotationResult, RotationError> {
        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(id).ok_or_else(|| RotationError::SessionNotFound {
            session_id: id.to_string(),
        })?;

        let new_session_id = ulid::Ulid::new().to_string();
        let inputs_echo = inputs.clone();
        let result = rotate_session(&mut entry.state, &reason, new_session_id, inputs, &self.config)?;
        let new_state = new_session_state(&result, &entry.state, &inputs_echo);

        sessions.insert(
            result.new_session_id.clone(),
            SessionEntry {
                state: new_state,
                history: Vec::new(),
            },
        );

        let payload = serde_json::json!({
            "sessionId": id,
            "newSessionId": result.new_session_id,
            "checkpointId": result.checkpoint_id,
            "reason": result.reason,
        });
        publish_if_present(&self.hub, Channel::new("system"), "context.emergency_rotated", payload.clone(), None);
        publish_if_present(&self.hub, Channel::scoped("session", id), "context.emergency_rotated", payload, None);

        Ok(result)
    }

    pub fn session_state(&self, id: &str) -> Option<SessionState> {
        self.sessions.lock().get(id).map(|e| e.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acfs_eventbus::Hub;
    use std::sync::Arc;

    fn engine_with_config(config: ContextHealthConfig) -> ContextHealthEngine {
        let hub: SharedHub = Some(Arc::new(Hub::new(Default::default())));
        ContextHealthEngine::new(config, hub)
    }

    #[test]
    fn register_resolves_max_tokens_from_model_table() {
        let engine = engine_with_config(ContextHealthConfig::default());
        let state = engine.register_session("s1".to_string(), Some("gpt-4o".to_string()), None);
        assert_eq!(state.max_tokens, 128_000);
    }

    #[test]
    fn check_health_reports_healthy_for_new_session() {
        let engine = engine_with_config(ContextHealthConfig::default());
        engine.register_session("s1".to_string(), None, Some(1000));
        let health = engine.check_health("s1").unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.recommendations[0].action, RecommendedAction::None);
    }

    #[test]
    fn emergency_status_triggers_rotation() {
        let mut config = ContextHealthConfig::default();
        config.cooldown_ms = 0;
        let engine = engine_with_config(config);
        engine.register_session("s1".to_string(), None, Some(100));
        engine.update_tokens("s1", 96, "seed").unwrap();
        engine.check_health("s1").unwrap();
        let state = engine.session_state("s1").unwrap();
        assert_eq!(state.status, SessionStatus::Rotated);
        assert!(state.rotated_to.is_some());
    }

    #[test]
    fn add_message_after_rotation_is_rejected() {
        let mut config = ContextHealthConfig::default();
        config.cooldown_ms = 0;
        let engine = engine_with_config(config);
        engine.register_session("s1".to_string(), None, Some(100));
        engine.update_tokens("s1", 96, "seed").unwrap();
        engine.check_health("s1").unwrap();
        let result = engine.add_message(
            "s1",
            Message {
                role: "user".to_string(),
                content: "hello".to_string(),
                timestamp: Utc::now(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_session_errors() {
        let engine = engine_with_config(ContextHealthConfig::default());
        assert!(engine.check_health("missing").is_err());
    }
}
