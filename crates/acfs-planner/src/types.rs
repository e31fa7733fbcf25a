//! Install-plan data model (SPEC_FULL.md §3, §4.F).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the caller observed about a CLI, decoupled from `acfs-probe`'s
/// richer `DetectedCli` so the planner can be driven by any detection
/// source (a live probe, a cached snapshot, a test fixture).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectedTool {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Installed,
    Missing,
    OptionalMissing,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPlanEntry {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub phase: i64,
    pub status: PlanStatus,
    pub required: bool,
    pub install_command: Option<String>,
    pub docs_url: Option<String>,
    pub remediation: Vec<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallPlan {
    pub entries: Vec<ToolPlanEntry>,
    pub installed: usize,
    pub missing_required: usize,
    pub missing_optional: usize,
    pub ready: bool,
    pub install_script: Vec<String>,
    pub computed_at: DateTime<Utc>,
}
