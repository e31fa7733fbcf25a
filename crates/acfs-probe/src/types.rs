//! Detection data model (SPEC_FULL.md §3).

use acfs_core::UnavailabilityReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub streaming: bool,
    pub tool_use: bool,
    pub vision: bool,
    pub code_execution: bool,
    pub file_access: bool,
}

/// Static definition of a CLI to probe: how to invoke it and what it can do.
#[derive(Debug, Clone)]
pub struct CliDefinition {
    pub name: String,
    pub commands: Vec<String>,
    pub version_flag: String,
    pub auth_check_cmd: Option<Vec<String>>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedCli {
    pub name: String,
    pub available: bool,
    pub path: Option<String>,
    pub version: Option<String>,
    pub authenticated: Option<bool>,
    pub auth_error: Option<String>,
    pub unavailability_reason: Option<UnavailabilityReason>,
    pub capabilities: Capabilities,
    pub detected_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl DetectedCli {
    pub fn unavailable(name: &str, reason: UnavailabilityReason, duration_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            available: false,
            path: None,
            version: None,
            authenticated: None,
            auth_error: None,
            unavailability_reason: Some(reason),
            capabilities: Capabilities::default(),
            detected_at: Utc::now(),
            duration_ms,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    pub agents: Vec<DetectedCli>,
    pub tools: Vec<DetectedCli>,
    pub summary: DetectionSummary,
}

impl DetectionSnapshot {
    pub fn new(agents: Vec<DetectedCli>, tools: Vec<DetectedCli>) -> Self {
        let total = agents.len() + tools.len();
        let available = agents.iter().chain(tools.iter()).filter(|c| c.available).count();
        Self {
            summary: DetectionSummary {
                total,
                available,
                unavailable: total - available,
            },
            agents,
            tools,
        }
    }
}
