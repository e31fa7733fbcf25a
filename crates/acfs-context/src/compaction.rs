//! In-place token-budget reduction via summarization and/or pruning of
//! older messages (SPEC_FULL.md §4.H `compact()`).

use crate::config::ContextHealthConfig;
use crate::errors::SummarizationError;
use crate::tokens::count_tokens;
use crate::types::{CompactStrategy, CompactionResult, Message, SessionState};
use chrono::{Duration as ChronoDuration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct CompactOptions {
    pub strategy: CompactStrategy,
    #[allow(dead_code)]
    pub target_reduction: f64,
}

impl CompactOptions {
    pub fn with_defaults(config: &ContextHealthConfig) -> Self {
        Self {
            strategy: CompactStrategy::Both,
            target_reduction: config.default_reduction_target,
        }
    }
}

static NUMBERED_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").unwrap());
const KEYWORDS: [&str; 4] = ["TODO:", "IMPORTANT:", "Decision:", "Conclusion:"];
const MAX_EXTRACTED_LINES: usize = 10;

fn is_candidate_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.len() < 10 || trimmed.len() > 200 {
        return false;
    }
    let starts_with_bullet =
        trimmed.starts_with('-') || trimmed.starts_with('*') || NUMBERED_PREFIX.is_match(trimmed);
    let has_keyword = KEYWORDS.iter().any(|k| trimmed.contains(k));
    starts_with_bullet || has_keyword
}

/// Extractive heuristic: pulls bullet/numbered/keyword-flagged lines out
/// of the summarizable message group, deduplicated, capped at 10.
fn extractive_lines(messages: &[Message]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for message in messages {
        for line in message.content.lines() {
            let trimmed = line.trim();
            if is_candidate_line(trimmed) && seen.insert(trimmed.to_string()) {
                lines.push(trimmed.to_string());
                if lines.len() >= MAX_EXTRACTED_LINES {
                    return lines;
                }
            }
        }
    }
    lines
}

/// Exposes the extractive heuristic to `rotation::rotate_session`, which
/// needs the same bullet/keyword extraction for its transfer summary.
pub fn extractive_lines_pub(messages: &[Message]) -> Vec<String> {
    extractive_lines(messages)
}

fn format_summary(lines: &[String]) -> String {
    let mut out = String::from("Key points from previous conversation:\n");
    for line in lines {
        out.push_str("- ");
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Splits messages into (preserved, summarizable): preserved is the last
/// `preserve_recent_count` by position, unioned with anything timestamped
/// within `preserve_recent_minutes` of now.
fn partition_messages(messages: &[Message], config: &ContextHealthConfig) -> (Vec<Message>, Vec<Message>) {
    let cutoff = Utc::now() - ChronoDuration::minutes(config.preserve_recent_minutes);
    let recent_by_count_start = messages.len().saturating_sub(config.preserve_recent_count);

    let mut preserved = Vec::new();
    let mut summarizable = Vec::new();
    for (idx, message) in messages.iter().enumerate() {
        if idx >= recent_by_count_start || message.timestamp >= cutoff {
            preserved.push(message.clone());
        } else {
            summarizable.push(message.clone());
        }
    }
    (preserved, summarizable)
}

/// Applies a compaction pass to `state` in place, returning the before/
/// after token accounting (SPEC_FULL.md §8: `currentTokens <= beforeTokens`
/// always holds after a compaction).
pub fn compact_session(
    state: &mut SessionState,
    options: &CompactOptions,
    config: &ContextHealthConfig,
) -> Result<CompactionResult, SummarizationError> {
    let before_tokens = state.current_tokens;
    let (preserved, summarizable) = partition_messages(&state.messages, config);

    let mut summaries = Vec::new();
    let mut summary_message = None;

    if matches!(options.strategy, CompactStrategy::Summarize | CompactStrategy::Both) {
        let lines = extractive_lines(&summarizable);
        if !lines.is_empty() {
            let summary_text = format_summary(&lines);
            summaries.push(summary_text.clone());
            summary_message = Some(Message {
                role: "system".to_string(),
                content: summary_text,
                timestamp: Utc::now(),
            });
        }
    }

    if matches!(options.strategy, CompactStrategy::Prune | CompactStrategy::Both) {
        let mut kept = Vec::new();
        if let Some(summary) = summary_message {
            kept.push(summary);
        }
        kept.extend(preserved.iter().cloned());
        state.messages = kept;
    }

    let after_tokens: u64 = state.messages.iter().map(|m| count_tokens(&m.content)).sum();
    state.current_tokens = after_tokens;
    state.last_compaction = Some(Utc::now());

    let reduction = before_tokens.saturating_sub(after_tokens);
    let reduction_percent = if before_tokens == 0 {
        0.0
    } else {
        (reduction as f64 / before_tokens as f64) * 100.0
    };

    Ok(CompactionResult {
        before_tokens,
        after_tokens,
        reduction,
        reduction_percent,
        summarized_sections: summarizable.len(),
        preserved_sections: preserved.len(),
        summaries,
        applied_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionStatus;
    use chrono::Duration;

    fn session_with_messages(count: usize, old: bool) -> SessionState {
        let mut messages = Vec::new();
        for i in 0..count {
            let timestamp = if old {
                Utc::now() - Duration::hours(2)
            } else {
                Utc::now()
            };
            messages.push(Message {
                role: "user".to_string(),
                content: format!("- Decision: chose option {i} for the migration plan"),
                timestamp,
            });
        }
        let current_tokens = messages.iter().map(|m| count_tokens(&m.content)).sum();
        SessionState {
            id: "sess-1".to_string(),
            model: "claude-opus-4".to_string(),
            max_tokens: 1000,
            current_tokens,
            messages,
            created_at: Utc::now(),
            last_compaction: None,
            last_rotation: None,
            rotated_from: None,
            rotated_to: None,
            status: SessionStatus::Active,
        }
    }

    #[test]
    fn compaction_never_increases_token_count() {
        let mut state = session_with_messages(30, true);
        let config = ContextHealthConfig::default();
        let options = CompactOptions::with_defaults(&config);
        let before = state.current_tokens;
        let result = compact_session(&mut state, &options, &config).unwrap();
        assert!(result.after_tokens <= before);
        assert!(state.current_tokens <= before);
    }

    #[test]
    fn recent_messages_are_preserved_verbatim() {
        let mut state = session_with_messages(5, false);
        let config = ContextHealthConfig::default();
        let options = CompactOptions::with_defaults(&config);
        compact_session(&mut state, &options, &config).unwrap();
        // All 5 are "recent" so nothing should be summarized away.
        assert!(state.messages.len() >= 5);
    }

    #[test]
    fn extractive_summary_picks_up_decision_lines() {
        let mut state = session_with_messages(20, true);
        let config = ContextHealthConfig::default();
        let options = CompactOptions::with_defaults(&config);
        let result = compact_session(&mut state, &options, &config).unwrap();
        assert!(!result.summaries.is_empty());
        assert!(result.summaries[0].starts_with("Key points from previous conversation:"));
    }

    #[test]
    fn prune_only_strategy_drops_the_summary_message() {
        let mut state = session_with_messages(20, true);
        let config = ContextHealthConfig::default();
        let options = CompactOptions {
            strategy: CompactStrategy::Prune,
            target_reduction: config.default_reduction_target,
        };
        compact_session(&mut state, &options, &config).unwrap();
        assert!(state.messages.iter().all(|m| m.role != "system"));
    }
}
