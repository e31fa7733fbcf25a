//! Session rotation with context transfer (SPEC_FULL.md §4.H `rotate()`).
//! Generalizes the donor's `csa-session::soft_fork_session` (context-summary
//! extraction into a new session) and `csa-session::checkpoint` (minting an
//! identifier for the handoff, here in-memory/event-carried rather than a
//! durable git-notes artifact).

use crate::compaction::extractive_lines_pub;
use crate::config::ContextHealthConfig;
use crate::errors::RotationError;
use crate::redact::redact_text_content;
use crate::tokens::count_tokens;
use crate::types::{ContextTransfer, Message, RotationResult, SessionState, SessionStatus};
use chrono::Utc;
use ulid::Ulid;

#[derive(Debug, Clone, Default)]
pub struct RotationInputs {
    pub active_beads: Option<Vec<String>>,
    pub memory_rules: Option<Vec<String>>,
    pub override_max_tokens: Option<u64>,
    pub override_model: Option<String>,
}

fn format_seeded_message(transfer: &ContextTransfer) -> String {
    let mut sections = Vec::new();

    if let Some(summary) = &transfer.summary {
        if !summary.is_empty() {
            sections.push(format!("## Summary\n{summary}"));
        }
    }

    if !transfer.recent_messages.is_empty() {
        let mut body = String::new();
        for message in &transfer.recent_messages {
            body.push_str(&format!("[{}] {}\n", message.role, message.content));
        }
        sections.push(format!("## Recent Conversation\n{}", body.trim_end()));
    }

    if let Some(beads) = &transfer.active_beads {
        if !beads.is_empty() {
            let body = beads.iter().map(|b| format!("- {b}")).collect::<Vec<_>>().join("\n");
            sections.push(format!("## Active Work Items\n{body}"));
        }
    }

    if let Some(rules) = &transfer.memory_rules {
        if !rules.is_empty() {
            let body = rules.iter().map(|r| format!("- {r}")).collect::<Vec<_>>().join("\n");
            sections.push(format!("## Relevant Guidelines\n{body}"));
        }
    }

    sections.join("\n\n")
}

/// Rotates `old` into a fresh session, returning the new session's state
/// alongside the `RotationResult` payload. Checks both the already-rotated
/// invariant and the rotation cooldown before proceeding.
pub fn rotate_session(
    old: &mut SessionState,
    reason: &str,
    new_session_id: String,
    inputs: RotationInputs,
    config: &ContextHealthConfig,
) -> Result<RotationResult, RotationError> {
    if old.status == SessionStatus::Rotated {
        return Err(RotationError::AlreadyRotated {
            session_id: old.id.clone(),
            rotated_to: old.rotated_to.clone().unwrap_or_default(),
        });
    }

    if let Some(last_rotation) = old.last_rotation {
        let elapsed_ms = (Utc::now() - last_rotation).num_milliseconds().max(0) as u64;
        if elapsed_ms < config.cooldown_ms {
            return Err(RotationError::Cooldown {
                session_id: old.id.clone(),
                retry_after_ms: config.cooldown_ms - elapsed_ms,
            });
        }
    }

    let source_tokens = old.current_tokens;
    let recent_messages: Vec<Message> = old
        .messages
        .iter()
        .rev()
        .take(config.transfer_recent_count)
        .rev()
        .cloned()
        .collect();

    let summary_lines = extractive_lines_pub(&old.messages);
    let summary = if summary_lines.is_empty() {
        None
    } else {
        Some(redact_text_content(&summary_lines.join("\n")))
    };

    let active_beads = inputs
        .active_beads
        .map(|beads| beads.into_iter().map(|b| redact_text_content(&b)).collect());
    let memory_rules = inputs
        .memory_rules
        .map(|rules| rules.into_iter().map(|r| redact_text_content(&r)).collect());

    let recent_for_transfer: Vec<Message> = recent_messages
        .iter()
        .map(|m| Message {
            role: m.role.clone(),
            content: redact_text_content(&m.content),
            timestamp: m.timestamp,
        })
        .collect();

    let transfer_tokens_body: u64 = summary.as_deref().map(count_tokens).unwrap_or(0)
        + recent_for_transfer.iter().map(|m| count_tokens(&m.content)).sum::<u64>();

    let mut transfer = ContextTransfer {
        summary,
        recent_messages: recent_for_transfer,
        active_beads,
        memory_rules,
        source_tokens,
        transfer_tokens: transfer_tokens_body.max(1),
        compression_ratio: 0.0,
        transferred_at: Utc::now(),
    };
    transfer.compression_ratio = source_tokens as f64 / transfer.transfer_tokens as f64;

    let now = Utc::now();
    old.status = SessionStatus::Rotated;
    old.rotated_to = Some(new_session_id.clone());
    old.last_rotation = Some(now);

    let checkpoint_id = Ulid::new().to_string();

    Ok(RotationResult {
        new_session_id,
        checkpoint_id,
        transfer,
        reason: reason.to_string(),
        rotated_at: now,
    })
}

/// Rebuilds the rotated-to session's `SessionState` from a completed
/// `RotationResult`, for callers (the engine) that need to register it.
pub fn new_session_state(result: &RotationResult, old: &SessionState, inputs_echo: &RotationInputs) -> SessionState {
    let seeded_message = Message {
        role: "system".to_string(),
        content: format_seeded_message(&result.transfer),
        timestamp: result.rotated_at,
    };
    let tokens = count_tokens(&seeded_message.content);
    SessionState {
        id: result.new_session_id.clone(),
        model: inputs_echo.override_model.clone().unwrap_or_else(|| old.model.clone()),
        max_tokens: inputs_echo.override_max_tokens.unwrap_or(old.max_tokens),
        current_tokens: tokens,
        messages: vec![seeded_message],
        created_at: result.rotated_at,
        last_compaction: None,
        last_rotation: None,
        rotated_from: Some(old.id.clone()),
        rotated_to: None,
        status: SessionStatus::Active,
    }
}
