//! Agent Mail collector: reads two append-only line-delimited JSON files
//! from a working-directory subfolder. Malformed lines are skipped rather
//! than failing the whole collection (SPEC_FULL.md §6).

use crate::types::{AgentMailSnapshot, MailMessage};
use chrono::Utc;
use std::path::Path;

const AGENTS_FILE: &str = "agents.jsonl";
const MESSAGES_FILE: &str = "messages.jsonl";
const RECENT_LIMIT: usize = 20;

#[derive(Debug, Clone, serde::Deserialize)]
struct AgentRecord {
    #[allow(dead_code)]
    id: String,
}

fn read_jsonl_lines(path: &Path) -> Option<Vec<String>> {
    let content = std::fs::read_to_string(path).ok()?;
    Some(content.lines().map(str::to_string).filter(|l| !l.trim().is_empty()).collect())
}

/// Reads `agents.jsonl`/`messages.jsonl` under `mail_dir` (typically
/// `<cwd>/.acfs/mail` or similar, caller-supplied). Returns the empty
/// fallback (`available: false`) if the directory or both files are
/// absent; a single readable file is enough to report `available: true`.
pub fn collect_agent_mail(mail_dir: &Path) -> AgentMailSnapshot {
    let agents_path = mail_dir.join(AGENTS_FILE);
    let messages_path = mail_dir.join(MESSAGES_FILE);

    let agent_lines = read_jsonl_lines(&agents_path);
    let message_lines = read_jsonl_lines(&messages_path);

    if agent_lines.is_none() && message_lines.is_none() {
        return AgentMailSnapshot {
            available: false,
            ..Default::default()
        };
    }

    let mut malformed = 0usize;
    let agent_count = agent_lines
        .unwrap_or_default()
        .iter()
        .filter(|line| match serde_json::from_str::<AgentRecord>(line) {
            Ok(_) => true,
            Err(_) => {
                malformed += 1;
                false
            }
        })
        .count();

    let mut messages: Vec<MailMessage> = Vec::new();
    for line in message_lines.unwrap_or_default() {
        match serde_json::from_str::<MailMessage>(&line) {
            Ok(msg) => messages.push(msg),
            Err(_) => malformed += 1,
        }
    }

    messages.sort_by_key(|m| m.timestamp);
    let unread_count = messages.iter().filter(|m| m.read != Some(true)).count();
    let recent: Vec<MailMessage> = messages
        .into_iter()
        .rev()
        .take(RECENT_LIMIT)
        .collect();

    AgentMailSnapshot {
        available: true,
        agent_count,
        unread_count,
        recent,
        malformed_lines_skipped: malformed,
        captured_at: Some(Utc::now()),
    }
}
