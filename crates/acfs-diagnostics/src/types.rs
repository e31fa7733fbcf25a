//! Health diagnostics data model: per-tool dependency status and the
//! aggregate report across a registry.

use acfs_core::UnavailabilityReason;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolHealth {
    pub id: String,
    pub display_name: String,
    pub available: bool,
    pub depends_on: Vec<String>,
    pub depended_by: Vec<String>,
    pub reason: Option<UnavailabilityReason>,
    pub reason_label: Option<String>,
    /// Root-first path from the true root cause to this tool. Empty when
    /// `available` is true.
    pub root_cause_path: Vec<String>,
    pub explanation: Option<String>,
}

impl ToolHealth {
    /// A cascade failure is caused by something deeper in its dependency
    /// chain, not by the tool itself being the root cause.
    pub fn is_cascade_failure(&self) -> bool {
        !self.available && self.root_cause_path.len() > 1
    }

    pub fn root_cause_id(&self) -> Option<&str> {
        self.root_cause_path.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    pub cascade_failures: usize,
    pub root_cause_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub tools: Vec<ToolHealth>,
    pub summary: DiagnosticsSummary,
}
